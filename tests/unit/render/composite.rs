use super::*;

#[test]
fn over_opacity_0_is_noop() {
    let dst = [1, 2, 3, 4];
    let src = [200, 200, 200, 200];
    assert_eq!(over(dst, src, 0.0), dst);
}

#[test]
fn over_src_alpha_0_is_noop() {
    let dst = [10, 20, 30, 40];
    let src = [255, 255, 255, 0];
    assert_eq!(over(dst, src, 1.0), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let dst = [0, 0, 0, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(over(dst, src, 1.0), src);
}

#[test]
fn over_dst_transparent_returns_src() {
    let dst = [0, 0, 0, 0];
    let src = [100, 110, 120, 200];
    assert_eq!(over(dst, src, 1.0), src);
}

#[test]
fn premultiply_round_trips_opaque_and_clears_transparent() {
    let c = Rgba8::new(61, 210, 230, 255);
    assert_eq!(premultiply(c), [61, 210, 230, 255]);
    assert_eq!(demultiply(premultiply(c)), c);
    assert_eq!(demultiply([10, 10, 10, 0]), Rgba8::TRANSPARENT);

    let half = premultiply(Rgba8::new(200, 100, 0, 128));
    assert_eq!(half, [100, 50, 0, 128]);
    let back = demultiply(half);
    assert!(back.r.abs_diff(200) <= 1 && back.g.abs_diff(100) <= 1 && back.a == 128);
}

#[test]
fn tint_blends_rgb_and_keeps_alpha() {
    let base = Rgba8::new(61, 210, 230, 255);
    let out = tint_rgb(base, Rgba8::WHITE, 0.35);
    // 0.35 * 255 rounds to 89.
    let expect = |c: u8| ((u32::from(c) * 166 + 127) / 255 + 89) as u8;
    assert_eq!(out, Rgba8::new(expect(61), expect(210), expect(230), 255));

    let clear = tint_rgb(Rgba8::TRANSPARENT, Rgba8::WHITE, 0.35);
    assert_eq!(clear.a, 0);
    assert_eq!(clear.r, 89);
}

#[test]
fn tint_extremes() {
    let base = Rgba8::new(10, 20, 30, 40);
    assert_eq!(tint_rgb(base, Rgba8::WHITE, 0.0), base);
    assert_eq!(tint_rgb(base, Rgba8::WHITE, 1.0), Rgba8::new(255, 255, 255, 40));
}

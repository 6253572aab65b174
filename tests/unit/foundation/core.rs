use super::*;

#[test]
fn with_alpha_rounds_to_nearest_byte() {
    let c = Rgba8::new(155, 89, 182, 255).with_alpha(0.15);
    assert_eq!(c, Rgba8::new(155, 89, 182, 38));
    assert_eq!(Rgba8::WHITE.with_alpha(2.0).a, 255);
    assert_eq!(Rgba8::WHITE.with_alpha(-1.0).a, 0);
}

#[test]
fn hex_rgb_is_uppercase_and_ignores_alpha() {
    assert_eq!(Rgba8::new(61, 210, 230, 10).to_hex_rgb(), "#3DD2E6");
}

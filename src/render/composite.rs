//! RGBA8 blend math shared by the compositor and the poster.
//!
//! Pixel buffers are straight alpha; [`over`] works on premultiplied values, so convert with
//! [`premultiply`] and [`demultiply`] at the edges.

use crate::foundation::core::Rgba8;

pub type PremulRgba8 = [u8; 4];

pub fn premultiply(c: Rgba8) -> PremulRgba8 {
    let a = u16::from(c.a);
    [
        mul_div255(u16::from(c.r), a),
        mul_div255(u16::from(c.g), a),
        mul_div255(u16::from(c.b), a),
        c.a,
    ]
}

pub fn demultiply(px: PremulRgba8) -> Rgba8 {
    let a = px[3];
    if a == 0 {
        return Rgba8::TRANSPARENT;
    }
    let un = |c: u8| ((u32::from(c) * 255 + u32::from(a) / 2) / u32::from(a)).min(255) as u8;
    Rgba8::new(un(px[0]), un(px[1]), un(px[2]), a)
}

pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

/// Mix `tint`'s color into `base` by `amount`, keeping `base`'s alpha.
///
/// Straight alpha in and out. A transparent pixel stays transparent.
pub fn tint_rgb(base: Rgba8, tint: Rgba8, amount: f32) -> Rgba8 {
    let t = ((amount.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16;
    let it = 255u16 - t;
    let mix = |b: u8, c: u8| add_sat_u8(mul_div255(u16::from(b), it), mul_div255(u16::from(c), t));
    Rgba8::new(
        mix(base.r, tint.r),
        mix(base.g, tint.g),
        mix(base.b, tint.b),
        base.a,
    )
}

pub fn tint_rgb_in_place(px: &mut [u8], tint: Rgba8, amount: f32) {
    for d in px.chunks_exact_mut(4) {
        let out = tint_rgb(Rgba8::from_slice(d), tint, amount);
        d.copy_from_slice(&out.to_array());
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;

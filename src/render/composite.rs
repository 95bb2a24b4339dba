use crate::foundation::error::{CardError, CardResult};

pub type PremulRgba8 = [u8; 4];

/// Porter-Duff modes the card layers need.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Compose {
    /// Normal painting.
    #[default]
    SourceOver,
    /// Source kept only where the destination is empty; destination is discarded.
    SourceOut,
    /// Destination erased wherever the source has alpha (hole punch).
    DestinationOut,
}

pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = opacity_u16(opacity);
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

pub fn source_out(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let op = opacity_u16(opacity);
    let keep = 255u16 - u16::from(dst[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = mul_div255(u16::from(mul_div255(u16::from(src[i]), op)), keep);
    }
    out
}

pub fn destination_out(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let sa = mul_div255(u16::from(src[3]), opacity_u16(opacity));
    let keep = 255u16 - u16::from(sa);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = mul_div255(u16::from(dst[i]), keep);
    }
    out
}

/// Composite `src` onto `dst` with `mode`, scaling the source by `opacity`.
pub fn compose_in_place(
    dst: &mut [u8],
    src: &[u8],
    mode: Compose,
    opacity: f32,
) -> CardResult<()> {
    check_pair(dst, src, "compose_in_place")?;
    let f = match mode {
        Compose::SourceOver => over,
        Compose::SourceOut => source_out,
        Compose::DestinationOut => destination_out,
    };
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = f([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> CardResult<()> {
    compose_in_place(dst, src, Compose::SourceOver, opacity)
}

/// Multiply every channel by the coverage (alpha) of `mask`.
pub fn mask_in_place(dst: &mut [u8], mask: &[u8]) -> CardResult<()> {
    check_pair(dst, mask, "mask_in_place")?;
    for (d, m) in dst.chunks_exact_mut(4).zip(mask.chunks_exact(4)) {
        let w = u16::from(m[3]);
        for c in d.iter_mut() {
            *c = mul_div255(u16::from(*c), w);
        }
    }
    Ok(())
}

/// Scale all channels by `opacity`.
pub fn scale_alpha_in_place(dst: &mut [u8], opacity: f32) {
    let op = opacity_u16(opacity);
    if op == 255 {
        return;
    }
    for c in dst.iter_mut() {
        *c = mul_div255(u16::from(*c), op);
    }
}

/// Replace colour with `premul_color`, keeping coverage: `out = color * src.a`.
pub fn tint_in_place(dst: &mut [u8], premul_color: PremulRgba8) {
    for d in dst.chunks_exact_mut(4) {
        let a = u16::from(d[3]);
        for i in 0..4 {
            d[i] = mul_div255(u16::from(premul_color[i]), a);
        }
    }
}

/// Translate an image by whole pixels, filling uncovered pixels with transparent.
pub fn offset_rgba8(src: &[u8], width: u32, height: u32, dx: i32, dy: i32) -> Vec<u8> {
    let mut out = vec![0u8; src.len()];
    let (w, h) = (width as i32, height as i32);
    for y in 0..h {
        let sy = y - dy;
        if sy < 0 || sy >= h {
            continue;
        }
        for x in 0..w {
            let sx = x - dx;
            if sx < 0 || sx >= w {
                continue;
            }
            let si = ((sy * w + sx) as usize) * 4;
            let di = ((y * w + x) as usize) * 4;
            out[di..di + 4].copy_from_slice(&src[si..si + 4]);
        }
    }
    out
}

/// Multiply straight colour by `factor` (CSS `brightness()`), on premultiplied data.
///
/// Premultiplied channels scale linearly, so no unpremultiply round-trip is needed; results are
/// clamped so colour never exceeds alpha.
pub fn brightness_in_place(dst: &mut [u8], factor: f32) {
    if (factor - 1.0).abs() < f32::EPSILON {
        return;
    }
    let f = factor.max(0.0);
    for d in dst.chunks_exact_mut(4) {
        let a = d[3];
        for c in &mut d[..3] {
            *c = ((*c as f32) * f).round().clamp(0.0, a as f32) as u8;
        }
    }
}

fn check_pair(a: &[u8], b: &[u8], what: &str) -> CardResult<()> {
    if a.len() != b.len() || !a.len().is_multiple_of(4) {
        return Err(CardError::render(format!(
            "{what} expects equal-length rgba8 buffers"
        )));
    }
    Ok(())
}

fn opacity_u16(opacity: f32) -> u16 {
    ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16
}

fn mul_div255(x: u16, y: u16) -> u8 {
    let prod = u32::from(x) * u32::from(y);
    ((prod + 127) / 255) as u8
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_opaque_src_replaces_dst() {
        assert_eq!(over([1, 2, 3, 255], [9, 8, 7, 255], 1.0), [9, 8, 7, 255]);
        assert_eq!(over([1, 2, 3, 255], [9, 8, 7, 255], 0.0), [1, 2, 3, 255]);
    }

    #[test]
    fn destination_out_erases_under_opaque_source() {
        assert_eq!(
            destination_out([100, 50, 25, 255], [0, 0, 0, 255], 1.0),
            [0, 0, 0, 0]
        );
        assert_eq!(
            destination_out([100, 50, 25, 255], [0, 0, 0, 0], 1.0),
            [100, 50, 25, 255]
        );
    }

    #[test]
    fn source_out_only_survives_on_empty_dst() {
        assert_eq!(source_out([0, 0, 0, 0], [10, 20, 30, 255], 1.0), [10, 20, 30, 255]);
        assert_eq!(source_out([5, 5, 5, 255], [10, 20, 30, 255], 1.0), [0, 0, 0, 0]);
        assert_eq!(source_out([0, 0, 0, 0], [255, 255, 255, 255], 0.5)[3], 128);
    }

    #[test]
    fn mask_and_tint() {
        let mut px = vec![200, 100, 50, 255, 200, 100, 50, 255];
        mask_in_place(&mut px, &[0, 0, 0, 0, 0, 0, 0, 255]).unwrap();
        assert_eq!(px, vec![0, 0, 0, 0, 200, 100, 50, 255]);

        tint_in_place(&mut px, [0, 0, 0, 255]);
        assert_eq!(px, vec![0, 0, 0, 0, 0, 0, 0, 255]);
    }

    #[test]
    fn offset_shifts_and_clears() {
        let src = vec![1, 1, 1, 1, 2, 2, 2, 2];
        assert_eq!(offset_rgba8(&src, 2, 1, 1, 0), vec![0, 0, 0, 0, 1, 1, 1, 1]);
        assert_eq!(offset_rgba8(&src, 1, 2, 0, -1), vec![2, 2, 2, 2, 0, 0, 0, 0]);
    }

    #[test]
    fn brightness_clamps_to_alpha() {
        let mut px = vec![100, 100, 100, 128];
        brightness_in_place(&mut px, 2.0);
        assert_eq!(px, vec![128, 128, 128, 128]);
        brightness_in_place(&mut px, 0.5);
        assert_eq!(px, vec![64, 64, 64, 128]);
    }

    #[test]
    fn mismatched_lengths_are_render_errors() {
        let mut a = vec![0u8; 8];
        assert!(over_in_place(&mut a, &[0u8; 4], 1.0).is_err());
    }
}

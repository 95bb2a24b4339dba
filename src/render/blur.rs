use crate::foundation::error::{CardError, CardResult};

/// How samples outside the image are treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlurEdge {
    /// Repeat the nearest edge pixel (full-bleed backgrounds).
    Clamp,
    /// Treat outside as transparent black (shadows, CSS `blur()` on sparse content).
    Transparent,
}

/// Kernel radius used for a given standard deviation.
pub fn radius_for_sigma(sigma: f32) -> u32 {
    if !sigma.is_finite() || sigma <= 0.0 {
        return 0;
    }
    (sigma * 3.0).ceil() as u32
}

/// Separable gaussian blur on premultiplied RGBA8.
pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    sigma: f32,
    edge: BlurEdge,
) -> CardResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| CardError::render("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(CardError::render(
            "blur_rgba8_premul expects src matching width*height*4",
        ));
    }
    let radius = radius_for_sigma(sigma);
    if radius == 0 || width == 0 || height == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    horizontal_pass(src, &mut tmp, width, height, &kernel, edge);
    vertical_pass(&tmp, &mut out, width, height, &kernel, edge);
    Ok(out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> CardResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(CardError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    let sigma = sigma as f64;
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = i as f64;
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(CardError::render("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    // Rounding drift goes to the centre tap so the kernel sums to exactly 1.0 in Q16.
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let new_mid = (i64::from(weights[mid]) + delta).clamp(0, 65536);
        weights[mid] = new_mid as u32;
    }

    Ok(weights)
}

fn sample_index(i: i32, len: i32, edge: BlurEdge) -> Option<i32> {
    match edge {
        BlurEdge::Clamp => Some(i.clamp(0, len - 1)),
        BlurEdge::Transparent => (0..len).contains(&i).then_some(i),
    }
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32], edge: BlurEdge) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let Some(sx) = sample_index(x + ki as i32 - radius, w, edge) else {
                    continue;
                };
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += (kw as u64) * (src[idx + c] as u64);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32], edge: BlurEdge) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let Some(sy) = sample_index(y + ki as i32 - radius, h, edge) else {
                    continue;
                };
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += (kw as u64) * (src[idx + c] as u64);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    (v.min(255)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_sums_to_one_q16() {
        for (r, s) in [(1, 0.5), (6, 2.0), (27, 9.0)] {
            let k = gaussian_kernel_q16(r, s).unwrap();
            assert_eq!(k.len(), (2 * r + 1) as usize);
            assert_eq!(k.iter().map(|&v| u64::from(v)).sum::<u64>(), 65536);
        }
    }

    #[test]
    fn zero_sigma_is_identity() {
        let src = vec![10, 20, 30, 40, 50, 60, 70, 80];
        let out = blur_rgba8_premul(&src, 2, 1, 0.0, BlurEdge::Clamp).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn clamp_keeps_flat_images_flat() {
        let src = [7u8, 8, 9, 255].repeat(5 * 5);
        let out = blur_rgba8_premul(&src, 5, 5, 1.5, BlurEdge::Clamp).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn transparent_edge_darkens_borders() {
        let src = [255u8, 255, 255, 255].repeat(9 * 9);
        let out = blur_rgba8_premul(&src, 9, 9, 2.0, BlurEdge::Transparent).unwrap();
        assert!(out[3] < 255);
        let centre = (4 * 9 + 4) * 4;
        assert!(out[centre + 3] > out[3]);
    }

    #[test]
    fn radius_is_three_sigma() {
        assert_eq!(radius_for_sigma(2.0), 6);
        assert_eq!(radius_for_sigma(1.5), 5);
        assert_eq!(radius_for_sigma(0.0), 0);
    }
}

use crate::foundation::error::{CardError, CardResult};
use crate::render::composite::{self, Compose};

/// Full-canvas premultiplied RGBA8 surface backed by a `vello_cpu::Pixmap`.
pub struct Surface {
    pixmap: vello_cpu::Pixmap,
}

impl Surface {
    /// Transparent surface; dimensions must fit the rasterizer's `u16` limits.
    pub fn new(width: u32, height: u32) -> CardResult<Self> {
        let (w, h) = checked_dims(width, height)?;
        Ok(Self {
            pixmap: vello_cpu::Pixmap::new(w, h),
        })
    }

    pub fn width(&self) -> u32 {
        u32::from(self.pixmap.width())
    }

    pub fn height(&self) -> u32 {
        u32::from(self.pixmap.height())
    }

    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        self.pixmap.data_as_u8_slice_mut()
    }

    pub(crate) fn pixmap_mut(&mut self) -> &mut vello_cpu::Pixmap {
        &mut self.pixmap
    }

    pub fn clear(&mut self) {
        self.data_mut().fill(0);
    }

    /// Premultiplied pixel at `(x, y)`; `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let i = ((y as usize) * (self.width() as usize) + (x as usize)) * 4;
        let d = self.data();
        Some([d[i], d[i + 1], d[i + 2], d[i + 3]])
    }

    /// Composite `src` (same size) onto this surface.
    pub fn compose(&mut self, src: &Surface, mode: Compose, opacity: f32) -> CardResult<()> {
        self.check_same_size(src)?;
        composite::compose_in_place(self.data_mut(), src.data(), mode, opacity)
    }

    pub fn over(&mut self, src: &Surface, opacity: f32) -> CardResult<()> {
        self.compose(src, Compose::SourceOver, opacity)
    }

    /// Keep only what lies under the coverage of `mask`.
    pub fn mask_in(&mut self, mask: &Surface) -> CardResult<()> {
        self.check_same_size(mask)?;
        composite::mask_in_place(self.data_mut(), mask.data())
    }

    /// Replace contents with premultiplied `bytes` of the same size.
    pub fn replace_data(&mut self, bytes: &[u8]) -> CardResult<()> {
        if bytes.len() != self.data().len() {
            return Err(CardError::render("surface byte len mismatch"));
        }
        self.data_mut().copy_from_slice(bytes);
        Ok(())
    }

    /// Straight-alpha RGBA8 copy, ready for encoding.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data().to_vec();
        for px in out.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }

    fn check_same_size(&self, other: &Surface) -> CardResult<()> {
        if self.width() != other.width() || self.height() != other.height() {
            return Err(CardError::render(format!(
                "surface size mismatch: {}x{} vs {}x{}",
                self.width(),
                self.height(),
                other.width(),
                other.height()
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

pub(crate) fn checked_dims(width: u32, height: u32) -> CardResult<(u16, u16)> {
    if width == 0 || height == 0 {
        return Err(CardError::validation(format!(
            "canvas dimensions must be > 0 (got {width}x{height})"
        )));
    }
    let w: u16 = width
        .try_into()
        .map_err(|_| CardError::validation("canvas width exceeds 65535"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| CardError::validation("canvas height exceeds 65535"))?;
    Ok((w, h))
}

/// Build a `vello_cpu` image paint from premultiplied bytes.
pub(crate) fn image_paint_from_premul(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> CardResult<vello_cpu::Image> {
    let (w, h) = checked_dims(width, height)?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(CardError::render("pixmap byte len mismatch"));
    }
    // Pixmap stores PremulRgba8; our bytes are already premultiplied.
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(std::sync::Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_sizes() {
        assert!(Surface::new(0, 10).unwrap_err().is_validation());
        assert!(Surface::new(70_000, 10).is_err());
        let s = Surface::new(3, 2).unwrap();
        assert_eq!((s.width(), s.height(), s.data().len()), (3, 2, 24));
        assert_eq!(s.pixel(2, 1), Some([0, 0, 0, 0]));
        assert_eq!(s.pixel(3, 0), None);
    }

    #[test]
    fn straight_conversion_unpremultiplies() {
        let mut s = Surface::new(1, 1).unwrap();
        s.replace_data(&[64, 32, 0, 128]).unwrap();
        assert_eq!(s.to_straight_rgba8(), vec![128, 64, 0, 128]);
    }

    #[test]
    fn compose_requires_same_size() {
        let mut a = Surface::new(2, 2).unwrap();
        let b = Surface::new(3, 2).unwrap();
        assert!(a.over(&b, 1.0).is_err());
    }
}

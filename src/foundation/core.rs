pub use kurbo::{Affine, BezPath, Point, Rect, RoundedRect, Vec2};

/// Straight (non-premultiplied) RGBA8 colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque colour from RGB channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Colour from RGBA channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully transparent black.
    pub const fn transparent() -> Self {
        Self::rgba(0, 0, 0, 0)
    }

    /// Same colour with alpha multiplied by `opacity` (clamped to `0..=1`).
    pub fn with_opacity(self, opacity: f32) -> Self {
        let a = (f32::from(self.a) * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    /// Premultiplied RGBA8 bytes.
    pub fn premul(self) -> [u8; 4] {
        let a16 = u16::from(self.a);
        let premul = |c: u8| -> u8 { (((u16::from(c) * a16) + 127) / 255) as u8 };
        [premul(self.r), premul(self.g), premul(self.b), self.a]
    }

    pub(crate) fn to_cpu(self) -> vello_cpu::peniko::Color {
        vello_cpu::peniko::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premul_scales_channels_by_alpha() {
        assert_eq!(Rgba8::rgba(255, 128, 0, 255).premul(), [255, 128, 0, 255]);
        assert_eq!(Rgba8::rgba(255, 255, 255, 0).premul(), [0, 0, 0, 0]);
        assert_eq!(Rgba8::rgba(200, 100, 50, 128).premul(), [100, 50, 25, 128]);
    }

    #[test]
    fn with_opacity_only_touches_alpha() {
        let c = Rgba8::rgb(10, 20, 30).with_opacity(0.4);
        assert_eq!((c.r, c.g, c.b, c.a), (10, 20, 30, 102));
    }
}

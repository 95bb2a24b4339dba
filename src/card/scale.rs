use crate::foundation::core::{Point, Rect};

/// Reference design width every layout constant is expressed in.
pub const REFERENCE_WIDTH: u32 = 885;
/// Reference design height.
pub const REFERENCE_HEIGHT: u32 = 303;

/// Output size plus the factors mapping reference units onto it.
///
/// Horizontal quantities scale by `scale_x`, vertical ones by `scale_y`; corner radii, stroke
/// widths and font sizes use the smaller of the two so rounding never turns elliptical.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleContext {
    pub width: u32,
    pub height: u32,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl ScaleContext {
    /// Zero or missing dimensions fall back to the reference size.
    pub fn new(custom_width: Option<u32>, custom_height: Option<u32>) -> Self {
        let width = custom_width.filter(|w| *w > 0).unwrap_or(REFERENCE_WIDTH);
        let height = custom_height.filter(|h| *h > 0).unwrap_or(REFERENCE_HEIGHT);
        Self {
            width,
            height,
            scale_x: f64::from(width) / f64::from(REFERENCE_WIDTH),
            scale_y: f64::from(height) / f64::from(REFERENCE_HEIGHT),
        }
    }

    pub fn reference() -> Self {
        Self::new(None, None)
    }

    pub fn min_scale(&self) -> f64 {
        self.scale_x.min(self.scale_y)
    }

    pub fn x(&self, v: f64) -> f64 {
        v * self.scale_x
    }

    pub fn y(&self, v: f64) -> f64 {
        v * self.scale_y
    }

    pub fn point(&self, x: f64, y: f64) -> Point {
        Point::new(self.x(x), self.y(y))
    }

    /// Reference-space `(x, y, w, h)` box in output pixels.
    pub fn rect(&self, x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect::new(self.x(x), self.y(y), self.x(x + w), self.y(y + h))
    }

    pub fn radius(&self, r: f64) -> f64 {
        r * self.min_scale()
    }

    pub fn length(&self, v: f64) -> f64 {
        v * self.min_scale()
    }

    pub fn font(&self, px: f32) -> f32 {
        (f64::from(px) * self.min_scale()) as f32
    }

    /// Whole output canvas.
    pub fn canvas(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }
}

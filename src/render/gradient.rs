use crate::foundation::core::{Point, Rect, Rgba8};
use crate::foundation::error::{CardError, CardResult};

/// Upper bound on colours in one gradient.
pub const MAX_GRADIENT_COLORS: usize = 20;

/// Gradient orientation; `Radial` is approximated by a top-left to bottom-right diagonal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientDirection {
    #[default]
    Horizontal,
    Vertical,
    Radial,
}

/// Ordered colour list plus direction.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientSpec {
    colors: Vec<Rgba8>,
    direction: GradientDirection,
}

impl GradientSpec {
    /// Validate a colour list; `what` names the option in error messages.
    pub fn new(colors: Vec<Rgba8>, direction: GradientDirection, what: &str) -> CardResult<Self> {
        if colors.len() > MAX_GRADIENT_COLORS {
            return Err(CardError::validation(format!(
                "invalid {what} length ({}) must be a maximum of {MAX_GRADIENT_COLORS} colors",
                colors.len()
            )));
        }
        if colors.is_empty() {
            return Err(CardError::validation(format!(
                "{what} must contain at least one color"
            )));
        }
        Ok(Self { colors, direction })
    }

    pub fn colors(&self) -> &[Rgba8] {
        &self.colors
    }

    pub fn direction(&self) -> GradientDirection {
        self.direction
    }

    /// Gradient axis across `bounds` for this direction.
    pub fn linear(&self, bounds: Rect) -> LinearGradient {
        let (start, end) = match self.direction {
            GradientDirection::Horizontal => (
                Point::new(bounds.x0, bounds.y0),
                Point::new(bounds.x1, bounds.y0),
            ),
            GradientDirection::Vertical => (
                Point::new(bounds.x0, bounds.y0),
                Point::new(bounds.x0, bounds.y1),
            ),
            GradientDirection::Radial => (
                Point::new(bounds.x0, bounds.y0),
                Point::new(bounds.x1, bounds.y1),
            ),
        };
        LinearGradient {
            start,
            end,
            stops: self.colors.clone(),
        }
    }
}

/// Linear gradient with evenly spaced stops at `i / (n - 1)`.
///
/// One stop paints a flat colour.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearGradient {
    pub start: Point,
    pub end: Point,
    pub stops: Vec<Rgba8>,
}

impl LinearGradient {
    /// Premultiplied colour at gradient parameter `t` (clamped to `0..=1`).
    pub fn color_at(&self, t: f64) -> [u8; 4] {
        match self.stops.len() {
            0 => [0, 0, 0, 0],
            1 => self.stops[0].premul(),
            n => {
                let t = t.clamp(0.0, 1.0) * (n - 1) as f64;
                let i = (t.floor() as usize).min(n - 2);
                let f = t - i as f64;
                let a = self.stops[i].premul();
                let b = self.stops[i + 1].premul();
                let mut out = [0u8; 4];
                for c in 0..4 {
                    let (av, bv) = (f64::from(a[c]), f64::from(b[c]));
                    out[c] = (av + (bv - av) * f).round().clamp(0.0, 255.0) as u8;
                }
                out
            }
        }
    }

    /// Parameter of the projection of `p` onto the gradient axis.
    pub fn param_at(&self, p: Point) -> f64 {
        let d = self.end - self.start;
        let len2 = d.hypot2();
        if len2 <= f64::EPSILON {
            return 0.0;
        }
        (p - self.start).dot(d) / len2
    }

    /// Rasterize over a `width` x `height` canvas, sampling at pixel centres.
    pub fn rasterize(&self, width: u32, height: u32) -> Vec<u8> {
        let mut bytes = vec![0u8; (width as usize) * (height as usize) * 4];
        if self.stops.len() == 1 {
            let c = self.stops[0].premul();
            for px in bytes.chunks_exact_mut(4) {
                px.copy_from_slice(&c);
            }
            return bytes;
        }
        for y in 0..height {
            for x in 0..width {
                let t = self.param_at(Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5));
                let idx = ((y as usize) * (width as usize) + (x as usize)) * 4;
                bytes[idx..idx + 4].copy_from_slice(&self.color_at(t));
            }
        }
        bytes
    }
}

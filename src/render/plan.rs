use std::sync::Arc;

use kurbo::Shape as _;

use crate::assets::decode::PreparedImage;
use crate::assets::fonts::FontSpec;
use crate::foundation::core::{BezPath, Point, Rect, RoundedRect, Rgba8, Vec2};
use crate::render::composite::Compose;
use crate::render::gradient::LinearGradient;

/// Geometry a draw op covers, in output pixels.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Rect(Rect),
    RoundedRect { rect: Rect, radius: f64 },
    Circle { center: Point, radius: f64 },
    Path(BezPath),
}

impl Shape {
    /// Rounded rect with the radius clamped to half the shorter side, as canvas `roundRect` does.
    pub fn rounded(rect: Rect, radius: f64) -> Self {
        let max_r = (rect.width().abs().min(rect.height().abs())) / 2.0;
        Self::RoundedRect {
            rect,
            radius: radius.clamp(0.0, max_r),
        }
    }

    pub fn to_path(&self) -> BezPath {
        const TOLERANCE: f64 = 0.1;
        match self {
            Self::Rect(r) => r.to_path(TOLERANCE),
            Self::RoundedRect { rect, radius } => {
                RoundedRect::from_rect(*rect, *radius).to_path(TOLERANCE)
            }
            Self::Circle { center, radius } => {
                kurbo::Circle::new(*center, *radius).to_path(TOLERANCE)
            }
            Self::Path(p) => p.clone(),
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Self::Rect(r) => *r,
            Self::RoundedRect { rect, .. } => *rect,
            Self::Circle { center, radius } => Rect::new(
                center.x - radius,
                center.y - radius,
                center.x + radius,
                center.y + radius,
            ),
            Self::Path(p) => p.bounding_box(),
        }
    }
}

/// Fill paint.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    Solid(Rgba8),
    Linear(LinearGradient),
}

/// Filter applied to an image after it is drawn into its own surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageFilter {
    /// Gaussian standard deviation in pixels; `0` disables.
    pub blur_sigma: f32,
    /// Colour multiplier (`1.0` = unchanged).
    pub brightness: f32,
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self {
            blur_sigma: 0.0,
            brightness: 1.0,
        }
    }
}

impl ImageFilter {
    pub fn is_identity(&self) -> bool {
        self.blur_sigma <= 0.0 && (self.brightness - 1.0).abs() < f32::EPSILON
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Blurred, offset copy drawn beneath a text run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextShadow {
    pub color: Rgba8,
    pub blur_sigma: f32,
    pub offset: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStroke {
    pub color: Rgba8,
    pub width: f64,
}

/// One line of text anchored at its baseline.
#[derive(Clone, Debug, PartialEq)]
pub struct TextOp {
    pub text: String,
    pub font: FontSpec,
    pub size_px: f32,
    pub color: Rgba8,
    /// Baseline anchor; `align` decides whether it is the left edge, centre or right edge.
    pub origin: Point,
    pub align: TextAlign,
    pub shadow: Option<TextShadow>,
    /// Drawn before the fill.
    pub stroke: Option<TextStroke>,
}

/// Single drawing instruction of a layer.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Fill {
        shape: Shape,
        paint: Paint,
        opacity: f32,
    },
    Stroke {
        shape: Shape,
        color: Rgba8,
        width: f64,
    },
    Image {
        image: Arc<PreparedImage>,
        dest: Rect,
        opacity: f32,
        filter: ImageFilter,
    },
    Text(TextOp),
    /// Children render into a scratch surface, get clipped, then composite with `compose`.
    Group {
        compose: Compose,
        opacity: f32,
        clip: Option<Shape>,
        ops: Vec<DrawOp>,
    },
}

impl DrawOp {
    pub fn fill(shape: Shape, color: Rgba8) -> Self {
        Self::Fill {
            shape,
            paint: Paint::Solid(color),
            opacity: 1.0,
        }
    }

    pub fn fill_with_opacity(shape: Shape, color: Rgba8, opacity: f32) -> Self {
        Self::Fill {
            shape,
            paint: Paint::Solid(color),
            opacity,
        }
    }

    pub fn image(image: Arc<PreparedImage>, dest: Rect) -> Self {
        Self::Image {
            image,
            dest,
            opacity: 1.0,
            filter: ImageFilter::default(),
        }
    }

    /// Erase `shape` from everything drawn so far in the layer.
    pub fn punch(shape: Shape) -> Self {
        Self::Group {
            compose: Compose::DestinationOut,
            opacity: 1.0,
            clip: None,
            ops: vec![Self::fill(shape, Rgba8::rgb(0, 0, 0))],
        }
    }

    /// `ops` clipped to `clip`, painted normally.
    pub fn clipped(clip: Shape, ops: Vec<DrawOp>) -> Self {
        Self::Group {
            compose: Compose::SourceOver,
            opacity: 1.0,
            clip: Some(clip),
            ops,
        }
    }

    /// `true` when the backend can draw this op straight into a shared vello batch.
    pub(crate) fn is_batchable(&self) -> bool {
        match self {
            Self::Fill { .. } | Self::Stroke { .. } => true,
            Self::Image { filter, .. } => filter.is_identity(),
            Self::Text(t) => t.shadow.is_none(),
            Self::Group { .. } => false,
        }
    }
}

/// Ordered draw ops for one full-canvas layer.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerPlan {
    pub name: &'static str,
    pub ops: Vec<DrawOp>,
}

impl LayerPlan {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            ops: Vec::new(),
        }
    }

    pub fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Depth-first iterator over every op, groups included.
    pub fn walk(&self) -> impl Iterator<Item = &DrawOp> {
        let mut stack: Vec<&DrawOp> = self.ops.iter().rev().collect();
        std::iter::from_fn(move || {
            let op = stack.pop()?;
            if let DrawOp::Group { ops, .. } = op {
                stack.extend(ops.iter().rev());
            }
            Some(op)
        })
    }

    /// Every text op, in draw order.
    pub fn texts(&self) -> impl Iterator<Item = &TextOp> {
        self.walk().filter_map(|op| match op {
            DrawOp::Text(t) => Some(t),
            _ => None,
        })
    }
}

/// Drop shadow derived from a rendered layer's alpha.
///
/// The shadow surface holds the blurred, offset silhouette with the layer itself on top, all at
/// `opacity`; it is composited immediately before the undimmed layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DropShadow {
    pub offset: Vec2,
    pub blur_sigma: f32,
    pub color: Rgba8,
    pub opacity: f32,
}

/// One orchestration step: a layer, optionally preceded by its drop-shadow pass.
#[derive(Clone, Debug, PartialEq)]
pub struct CardStep {
    pub layer: LayerPlan,
    pub shadow: Option<DropShadow>,
}

/// Complete card: canvas size, outer clip and the ordered layer steps.
#[derive(Clone, Debug, PartialEq)]
pub struct CardPlan {
    pub width: u32,
    pub height: u32,
    pub clip: Option<Shape>,
    pub steps: Vec<CardStep>,
}

impl CardPlan {
    pub fn layer(&self, name: &str) -> Option<&LayerPlan> {
        self.steps
            .iter()
            .map(|s| &s.layer)
            .find(|l| l.name == name)
    }

    pub fn layer_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.layer.name).collect()
    }
}

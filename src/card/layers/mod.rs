//! Layer generators.
//!
//! Each generator is a pure function from the resolved style (plus loaded assets) to a
//! [`LayerPlan`](crate::render::plan::LayerPlan) covering the full canvas. Generators never see
//! the output surface; ordering and compositing live in the pipeline.

pub mod avatar_frame;
pub mod background;
pub mod badges;
pub mod border;
pub mod bot_badge;
pub mod frame;
pub mod status;
pub mod text_avatar;
pub mod xp_bar;

use crate::assets::color::parse_color;
use crate::card::scale::ScaleContext;
use crate::foundation::core::{Rgba8, Vec2};
use crate::foundation::error::CardResult;
use crate::render::plan::{DrawOp, DropShadow, Shape};

pub const BACKGROUND: &str = "background";
pub const FRAME: &str = "frame";
pub const TEXT_AVATAR: &str = "text_avatar";
pub const BORDER: &str = "border";
pub const BOT_BADGE: &str = "bot_badge";
pub const BADGES: &str = "badges";
pub const XP_BAR: &str = "xp_bar";
pub const AVATAR_FRAME: &str = "avatar_frame";

/// Default light-grey text colour.
pub(crate) const MUTED_TEXT: Rgba8 = Rgba8::rgb(0xda, 0xda, 0xda);
/// Alpha of the translucent panels behind text and badges.
pub(crate) const PANEL_ALPHA: f32 = 0.4;

/// Shadow pass drawn beneath the text, bot badge and badge layers: `drop-shadow(0 4px 4px #000)`
/// at 40% strength.
pub fn layer_shadow(scale: &ScaleContext) -> DropShadow {
    DropShadow {
        offset: Vec2::new(0.0, scale.y(4.0)),
        blur_sigma: scale.length(2.0) as f32,
        color: Rgba8::rgb(0, 0, 0),
        opacity: 0.4,
    }
}

/// Translucent rounded panel in reference units.
pub(crate) fn panel(
    scale: &ScaleContext,
    (x, y, w, h): (f64, f64, f64, f64),
    radius: f64,
    color: Rgba8,
) -> DrawOp {
    DrawOp::fill_with_opacity(
        Shape::rounded(scale.rect(x, y, w, h), scale.radius(radius)),
        color,
        PANEL_ALPHA,
    )
}

/// Parse an optional colour option, falling back to `default` when unset.
pub(crate) fn color_or(value: Option<&str>, default: Rgba8) -> CardResult<Rgba8> {
    match value {
        Some(v) => parse_color(v),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadow_scales_with_output() {
        let s = ScaleContext::new(Some(1770), Some(606));
        let shadow = layer_shadow(&s);
        assert_eq!(shadow.offset, Vec2::new(0.0, 8.0));
        assert_eq!(shadow.blur_sigma, 4.0);
        assert_eq!(shadow.opacity, 0.4);
    }

    #[test]
    fn color_or_validates_only_when_set() {
        assert_eq!(color_or(None, MUTED_TEXT).unwrap(), MUTED_TEXT);
        assert!(color_or(Some("nope"), MUTED_TEXT).unwrap_err().is_validation());
    }
}

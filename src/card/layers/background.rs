use std::sync::Arc;

use crate::assets::decode::PreparedImage;
use crate::card::effective::EffectiveStyle;
use crate::card::layers::{BACKGROUND, color_or};
use crate::foundation::core::{Rect, Rgba8};
use crate::foundation::error::CardResult;
use crate::render::plan::{DrawOp, ImageFilter, LayerPlan, Shape};

const BASE_FILL: Rgba8 = Rgba8::rgb(0x18, 0x19, 0x1c);
const DEFAULT_OVERLAY: Rgba8 = Rgba8::rgba(42, 45, 51, 51);

/// Background source after the custom -> banner -> avatar fallback.
#[derive(Clone, Debug, PartialEq)]
pub enum BackgroundChoice {
    Custom(Arc<PreparedImage>),
    Banner(Arc<PreparedImage>),
    /// No usable banner: the avatar is drawn enlarged and shifted up.
    AvatarZoomed,
}

impl BackgroundChoice {
    /// First successful load wins; failures are logged and fall through.
    pub fn resolve(
        custom: Option<CardResult<Arc<PreparedImage>>>,
        banner: Option<CardResult<Arc<PreparedImage>>>,
    ) -> Self {
        match custom {
            Some(Ok(img)) => return Self::Custom(img),
            Some(Err(e)) => tracing::warn!(error = %e, "custom background failed to load"),
            None => {}
        }
        match banner {
            Some(Ok(img)) => Self::Banner(img),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "banner failed to load, using avatar background");
                Self::AvatarZoomed
            }
            None => Self::AvatarZoomed,
        }
    }
}

pub fn build(
    style: &EffectiveStyle,
    choice: &BackgroundChoice,
    avatar: &Arc<PreparedImage>,
) -> CardResult<LayerPlan> {
    let scale = &style.scale;
    let overlay = color_or(style.options.overlay_color.as_deref(), DEFAULT_OVERLAY)?;

    let (image, dest) = match choice {
        BackgroundChoice::Custom(img) | BackgroundChoice::Banner(img) => {
            (Arc::clone(img), scale.canvas())
        }
        BackgroundChoice::AvatarZoomed => {
            let side = scale.x(900.0);
            let top = -scale.y(345.0);
            (Arc::clone(avatar), Rect::new(0.0, top, side, top + side))
        }
    };

    let mut plan = LayerPlan::new(BACKGROUND);
    plan.push(DrawOp::fill(Shape::Rect(scale.canvas()), BASE_FILL));
    plan.push(DrawOp::Image {
        image,
        dest,
        opacity: 1.0,
        filter: ImageFilter {
            blur_sigma: style.background.blur_sigma,
            brightness: style.background.brightness,
        },
    });
    plan.push(DrawOp::fill(Shape::Rect(scale.canvas()), overlay));
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::model::CardSpec;
    use crate::card::options::StyleOptions;
    use crate::foundation::error::CardError;

    fn img() -> Arc<PreparedImage> {
        Arc::new(PreparedImage::solid(4, 4, [255, 0, 0, 255]).unwrap())
    }

    #[test]
    fn fallback_chain_order() {
        let a = img();
        assert_eq!(
            BackgroundChoice::resolve(Some(Ok(a.clone())), Some(Ok(img()))),
            BackgroundChoice::Custom(a.clone())
        );
        assert_eq!(
            BackgroundChoice::resolve(Some(Err(CardError::asset_load("x"))), Some(Ok(a.clone()))),
            BackgroundChoice::Banner(a)
        );
        assert_eq!(
            BackgroundChoice::resolve(None, Some(Err(CardError::asset_load("x")))),
            BackgroundChoice::AvatarZoomed
        );
        assert_eq!(BackgroundChoice::resolve(None, None), BackgroundChoice::AvatarZoomed);
    }

    fn image_dest(plan: &LayerPlan) -> Rect {
        plan.ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Image { dest, .. } => Some(*dest),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn avatar_fallback_is_zoomed_and_banner_fills() {
        let card = CardSpec::new("neo", "a.png");
        let style = EffectiveStyle::resolve(&card, &StyleOptions::default());

        let zoomed = build(&style, &BackgroundChoice::AvatarZoomed, &img()).unwrap();
        assert_eq!(image_dest(&zoomed), Rect::new(0.0, -345.0, 900.0, 555.0));

        let banner = build(&style, &BackgroundChoice::Banner(img()), &img()).unwrap();
        assert_eq!(image_dest(&banner), Rect::new(0.0, 0.0, 885.0, 303.0));
        assert_eq!(banner.ops.len(), 3);
    }

    #[test]
    fn bad_overlay_color_is_rejected() {
        let card = CardSpec::new("neo", "a.png");
        let opts = StyleOptions {
            overlay_color: Some("not-a-color".into()),
            ..StyleOptions::default()
        };
        let style = EffectiveStyle::resolve(&card, &opts);
        let err = build(&style, &BackgroundChoice::AvatarZoomed, &img()).unwrap_err();
        assert!(err.is_validation());
    }
}

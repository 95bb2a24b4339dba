//! Welcome/goodbye banner: background, ringed avatar and two centred text lines.
//!
//! Geometry is in output pixels directly; the banner has no reference design to scale from.

use std::sync::Arc;

use crate::assets::color::parse_color;
use crate::assets::decode::PreparedImage;
use crate::assets::fonts::FontSpec;
use crate::assets::loader::ImageLoader;
use crate::card::effective::DEFAULT_FONT_FAMILY;
use crate::card::layers::color_or;
use crate::card::model::CardSpec;
use crate::card::options::{BannerKind, BorderStyle, WelcomeOptions};
use crate::foundation::core::{Point, Rect, Rgba8, Vec2};
use crate::foundation::error::{CardError, CardResult};
use crate::render::gradient::LinearGradient;
use crate::render::plan::{
    CardPlan, CardStep, DrawOp, ImageFilter, LayerPlan, Paint, Shape, TextAlign, TextOp,
    TextShadow, TextStroke,
};

pub const DEFAULT_WIDTH: u32 = 1024;
pub const DEFAULT_HEIGHT: u32 = 500;
pub const DEFAULT_AVATAR_SIZE: f64 = 200.0;
const DEFAULT_AVATAR_Y: f64 = 80.0;

const WHITE: Rgba8 = Rgba8::rgb(255, 255, 255);
const FALLBACK_START: Rgba8 = Rgba8::rgb(0x66, 0x7e, 0xea);
const FALLBACK_END: Rgba8 = Rgba8::rgb(0x76, 0x4b, 0xa2);
const DEFAULT_OVERLAY: Rgba8 = Rgba8::rgba(0, 0, 0, 102);

/// Images a banner needs.
#[derive(Clone, Debug)]
pub struct WelcomeAssets {
    pub avatar: Arc<PreparedImage>,
    /// `None` paints the fallback gradient.
    pub background: Option<Arc<PreparedImage>>,
}

impl WelcomeAssets {
    /// The background is the first reference present among custom, banner and avatar; if it
    /// fails to load the gradient is used instead. The avatar itself is required.
    pub fn load<L: ImageLoader + ?Sized>(
        loader: &L,
        card: &CardSpec,
        options: &WelcomeOptions,
    ) -> CardResult<Self> {
        let bg_ref = options
            .custom_background
            .as_ref()
            .or(card.assets.banner.as_ref())
            .unwrap_or(&card.assets.avatar);
        let (avatar, background) = rayon::join(
            || loader.load(&card.assets.avatar),
            || loader.load(bg_ref),
        );
        let avatar = avatar
            .map_err(|e| CardError::asset_load(format!("Could not load avatar: {e}")))?;
        let background = match background {
            Ok(img) => Some(Arc::new(img)),
            Err(e) => {
                tracing::warn!(error = %e, "banner background failed to load, using gradient");
                None
            }
        };
        Ok(Self {
            avatar: Arc::new(avatar),
            background,
        })
    }
}

/// Dest rect scaling `(iw, ih)` to cover `(w, h)`, centred.
pub fn cover_rect(iw: f64, ih: f64, w: f64, h: f64) -> Rect {
    let img_ratio = iw / ih;
    if img_ratio > w / h {
        let dw = h * img_ratio;
        let x = (w - dw) / 2.0;
        Rect::new(x, 0.0, x + dw, h)
    } else {
        let dh = w / img_ratio;
        let y = (h - dh) / 2.0;
        Rect::new(0.0, y, w, y + dh)
    }
}

pub fn compile_welcome(
    card: &CardSpec,
    options: &WelcomeOptions,
    assets: &WelcomeAssets,
) -> CardResult<CardPlan> {
    let width = options.custom_width.filter(|w| *w > 0).unwrap_or(DEFAULT_WIDTH);
    let height = options.custom_height.filter(|h| *h > 0).unwrap_or(DEFAULT_HEIGHT);
    let (w, h) = (f64::from(width), f64::from(height));
    let canvas = Rect::new(0.0, 0.0, w, h);

    let mut background = LayerPlan::new("background");
    match &assets.background {
        Some(img) => background.push(DrawOp::Image {
            image: Arc::clone(img),
            dest: cover_rect(f64::from(img.width), f64::from(img.height), w, h),
            opacity: 1.0,
            filter: ImageFilter {
                blur_sigma: options.background_blur.unwrap_or(3.0).max(0.0),
                brightness: ((100.0 + options.background_brightness.unwrap_or(0.0)) / 100.0)
                    .max(0.0),
            },
        }),
        None => background.push(DrawOp::Fill {
            shape: Shape::Rect(canvas),
            paint: Paint::Linear(LinearGradient {
                start: Point::new(0.0, 0.0),
                end: Point::new(w, h),
                stops: vec![FALLBACK_START, FALLBACK_END],
            }),
            opacity: 1.0,
        }),
    }
    let overlay = color_or(options.overlay_color.as_deref(), DEFAULT_OVERLAY)?;
    background.push(DrawOp::fill(Shape::Rect(canvas), overlay));

    let size = options
        .avatar_size
        .filter(|s| *s > 0.0)
        .unwrap_or(DEFAULT_AVATAR_SIZE);
    let radius = size / 2.0;
    let avatar_y = options.avatar_y.unwrap_or(DEFAULT_AVATAR_Y);
    let center = Point::new(w / 2.0, avatar_y + radius);

    let mut avatar = LayerPlan::new("avatar");
    let ring = options
        .avatar_border
        .clone()
        .unwrap_or_else(|| BorderStyle::new(8.0, "#FFFFFF"));
    if let Some((bw, color)) = ring.active() {
        avatar.push(DrawOp::Stroke {
            shape: Shape::Circle {
                center,
                radius: radius + bw / 2.0,
            },
            color: parse_color(color)?,
            width: bw,
        });
    }
    avatar.push(DrawOp::clipped(
        Shape::Circle { center, radius },
        vec![DrawOp::image(
            Arc::clone(&assets.avatar),
            Rect::new(center.x - radius, avatar_y, center.x + radius, avatar_y + size),
        )],
    ));

    let family = options
        .custom_font
        .as_deref()
        .filter(|f| !f.trim().is_empty())
        .unwrap_or(DEFAULT_FONT_FAMILY);
    let headline = options.welcome_text.clone().unwrap_or_else(|| {
        match options.kind.unwrap_or_default() {
            BannerKind::Welcome => "WELCOME",
            BannerKind::Goodbye => "GOODBYE",
        }
        .to_owned()
    });
    let username = options
        .custom_username
        .clone()
        .unwrap_or_else(|| card.identity.display_name().to_owned());

    let shadow = options.text_shadow.unwrap_or(true).then_some(TextShadow {
        color: Rgba8::rgba(0, 0, 0, 204),
        blur_sigma: 5.0,
        offset: Vec2::new(3.0, 3.0),
    });
    let stroke = match options.text_stroke.as_ref().and_then(|s| s.active()) {
        Some((width, color)) => Some(TextStroke {
            color: parse_color(color)?,
            width,
        }),
        None => None,
    };

    let headline_y = avatar_y + size + 90.0;
    let mut text = LayerPlan::new("text");
    for (line, size_px, color, y) in [
        (
            headline,
            options.custom_font_size.filter(|s| *s > 0.0).unwrap_or(80.0),
            color_or(options.welcome_color.as_deref(), WHITE)?,
            headline_y,
        ),
        (
            username,
            options.custom_username_size.filter(|s| *s > 0.0).unwrap_or(40.0),
            color_or(options.username_color.as_deref(), WHITE)?,
            headline_y + 60.0,
        ),
    ] {
        text.push(DrawOp::Text(TextOp {
            text: line,
            font: FontSpec::bold(family),
            size_px,
            color,
            origin: Point::new(w / 2.0, y),
            align: TextAlign::Center,
            shadow,
            stroke,
        }));
    }

    Ok(CardPlan {
        width,
        height,
        clip: None,
        steps: [background, avatar, text]
            .into_iter()
            .map(|layer| CardStep {
                layer,
                shadow: None,
            })
            .collect(),
    })
}

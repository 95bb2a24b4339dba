use std::sync::Arc;

use crate::assets::color::parse_color;
use crate::assets::decode::PreparedImage;
use crate::assets::fonts::FontSpec;
use crate::assets::text::TextMeasure;
use crate::card::effective::EffectiveStyle;
use crate::card::layers::status::{cutout_with_icon, parse_presence};
use crate::card::layers::{MUTED_TEXT, TEXT_AVATAR, color_or, panel};
use crate::card::text_fit::{TextFitResult, fit_text};
use crate::foundation::core::{Rgba8, Vec2};
use crate::foundation::error::CardResult;
use crate::render::plan::{
    DrawOp, LayerPlan, Shape, TextAlign, TextOp, TextShadow, TextStroke,
};

const USERNAME_START_PX: f32 = 80.0;
const USERNAME_FLOOR_PX: f32 = 30.0;
const AVATAR_FILL: Rgba8 = Rgba8::rgb(0x29, 0x2b, 0x2f);
const SUBTITLE_PANEL: Rgba8 = Rgba8::rgb(0x2a, 0x2d, 0x33);
const SUBTITLE_LINE_HEIGHT: f64 = 25.0;

/// Username size and width: fitted into the bot/non-bot budget unless `usernameSize` pins it.
pub fn fit_username(
    style: &EffectiveStyle,
    measure: &mut dyn TextMeasure,
) -> CardResult<TextFitResult> {
    let scale = &style.scale;
    let font = FontSpec::bold(&style.font_family);
    if let Some(size) = style.options.username_size.filter(|s| *s > 0.0) {
        let size_px = scale.font(size);
        let width = measure.measure(&style.display_name, &font, size_px)?;
        return Ok(TextFitResult {
            text: style.display_name.clone(),
            font_size_px: size_px,
            measured_width_px: width,
        });
    }
    let budget = if style.is_bot { 470.0 } else { 555.0 };
    let fit = fit_text(
        measure,
        &style.display_name,
        &font,
        scale.font(USERNAME_START_PX),
        scale.font(USERNAME_FLOOR_PX),
        scale.x(budget),
    )?;
    tracing::debug!(
        size = fit.font_size_px,
        width = fit.measured_width_px,
        "fitted username"
    );
    Ok(fit)
}

/// Subtitle panel, date, username, tag and the clipped avatar with its status cutout.
pub fn build(
    style: &EffectiveStyle,
    avatar: &Arc<PreparedImage>,
    username: &TextFitResult,
) -> CardResult<LayerPlan> {
    let scale = &style.scale;
    let opts = &style.options;
    let presence = parse_presence(opts.presence_status.as_deref())?;
    let mut plan = LayerPlan::new(TEXT_AVATAR);

    let regular = FontSpec::regular(&style.font_family);
    let small_px = scale.font(23.0);

    if !style.subtitles.is_empty() {
        let lines = style.subtitles.len() as f64;
        let height = (lines * SUBTITLE_LINE_HEIGHT + 8.0).max(33.0);
        plan.push(panel(scale, (304.0, 248.0, 380.0, height), 12.0, SUBTITLE_PANEL));
        let color = color_or(opts.color.as_deref(), MUTED_TEXT)?;
        for (i, line) in style.subtitles.iter().enumerate() {
            plan.push(DrawOp::Text(TextOp {
                text: line.clone(),
                font: regular.clone(),
                size_px: small_px,
                color,
                origin: scale.point(314.0, 258.0 + i as f64 * SUBTITLE_LINE_HEIGHT),
                align: TextAlign::Left,
                shadow: None,
                stroke: None,
            }));
        }
    }

    let shadow = opts.text_shadow.then(|| TextShadow {
        color: Rgba8::rgba(0, 0, 0, 179),
        blur_sigma: scale.length(2.0) as f32,
        offset: Vec2::new(scale.length(2.0), scale.length(2.0)),
    });
    let stroke = match opts.text_stroke.as_ref().and_then(|s| s.active()) {
        Some((width, color)) => Some(TextStroke {
            color: parse_color(color)?,
            width: scale.length(width),
        }),
        None => None,
    };

    plan.push(DrawOp::Text(TextOp {
        text: username.text.clone(),
        font: FontSpec::bold(&style.font_family),
        size_px: username.font_size_px,
        color: color_or(opts.username_color.as_deref(), Rgba8::rgb(255, 255, 255))?,
        origin: scale.point(300.0, 155.0),
        align: TextAlign::Left,
        shadow,
        stroke,
    }));

    if opts.rank_data.is_none() {
        plan.push(DrawOp::Text(TextOp {
            text: style.tag.clone(),
            font: regular.clone(),
            size_px: scale.font(opts.tag_size.filter(|s| *s > 0.0).unwrap_or(60.0)),
            color: color_or(opts.tag_color.as_deref(), MUTED_TEXT)?,
            origin: scale.point(300.0, 215.0),
            align: TextAlign::Left,
            shadow,
            stroke,
        }));
    }

    if let Some(date) = &style.date {
        plan.push(DrawOp::Text(TextOp {
            text: date.clone(),
            font: regular,
            size_px: small_px,
            color: MUTED_TEXT,
            origin: scale.point(775.0, 273.0),
            align: TextAlign::Center,
            shadow: None,
            stroke: None,
        }));
    }

    let radius = if opts.square_avatar { 30.0 } else { 225.0 };
    let avatar_shape = Shape::rounded(scale.rect(47.0, 39.0, 225.0, 225.0), scale.radius(radius));
    let mut avatar_ops = vec![
        DrawOp::fill(avatar_shape.clone(), AVATAR_FILL),
        DrawOp::image(Arc::clone(avatar), avatar_shape.bounds()),
    ];
    if let Some((width, color)) = opts.avatar_border.as_ref().and_then(|b| b.active()) {
        avatar_ops.push(DrawOp::Stroke {
            shape: avatar_shape.clone(),
            color: parse_color(color)?,
            width: scale.length(width),
        });
    }
    plan.push(DrawOp::clipped(avatar_shape, avatar_ops));

    if let Some(status) = presence {
        for op in cutout_with_icon(status, scale) {
            plan.push(op);
        }
    }
    Ok(plan)
}

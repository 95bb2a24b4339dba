//! Built-in vector artwork: presence icons, bot tags and the decorative card frame.
//!
//! Everything is authored in reference units and mapped through a [`ScaleContext`].

use crate::assets::fonts::FontSpec;
use crate::card::effective::BotBadgeKind;
use crate::card::options::PresenceStatus;
use crate::card::scale::ScaleContext;
use crate::foundation::core::{BezPath, Rgba8};
use crate::render::composite::Compose;
use crate::render::plan::{DrawOp, Shape, TextAlign, TextOp};

const ONLINE: Rgba8 = Rgba8::rgb(0x23, 0xa5, 0x5a);
const IDLE: Rgba8 = Rgba8::rgb(0xf0, 0xb2, 0x32);
const DND: Rgba8 = Rgba8::rgb(0xf2, 0x3f, 0x43);
const OFFLINE: Rgba8 = Rgba8::rgb(0x80, 0x84, 0x8e);
const STREAMING: Rgba8 = Rgba8::rgb(0x59, 0x36, 0x95);
const BLURPLE: Rgba8 = Rgba8::rgb(0x58, 0x65, 0xf2);
const WHITE: Rgba8 = Rgba8::rgb(255, 255, 255);

/// Centre of the circular status notch, reference units.
pub const STATUS_CENTER: (f64, f64) = (243.0, 235.0);
const STATUS_DOT_RADIUS: f64 = 19.0;

/// Phone notch anchor (`cX`, `cY`), reference units.
pub const PHONE_ANCHOR: (f64, f64) = (224.5, 202.0);

/// Reference-space size of the bot tag for `kind`.
pub fn bot_badge_size(kind: BotBadgeKind) -> (f64, f64) {
    match kind {
        BotBadgeKind::Unverified => (62.0, 34.0),
        BotBadgeKind::Verified | BotBadgeKind::Ai => (82.0, 34.0),
    }
}

/// Presence icon drawn into the erased notch.
pub fn status_icon(status: PresenceStatus, scale: &ScaleContext) -> DrawOp {
    if status == PresenceStatus::Phone {
        return phone_icon(scale);
    }
    let (cx, cy) = STATUS_CENTER;
    let dot = circle(scale, cx, cy, STATUS_DOT_RADIUS);
    let (color, detail) = match status {
        PresenceStatus::Online => (ONLINE, None),
        PresenceStatus::Idle => (IDLE, Some(circle(scale, cx - 8.0, cy - 8.0, 13.0))),
        PresenceStatus::Dnd => (
            DND,
            Some(Shape::rounded(
                scale.rect(cx - 12.0, cy - 4.0, 24.0, 8.0),
                scale.radius(4.0),
            )),
        ),
        PresenceStatus::Streaming => (STREAMING, Some(play_triangle(scale, cx, cy))),
        // Offline shares the invisible artwork.
        PresenceStatus::Offline | PresenceStatus::Invisible | PresenceStatus::Phone => {
            (OFFLINE, Some(circle(scale, cx, cy, 9.5)))
        }
    };

    let mut ops = vec![DrawOp::fill(dot, color)];
    ops.extend(detail.map(DrawOp::punch));
    group(ops)
}

fn phone_icon(scale: &ScaleContext) -> DrawOp {
    let (cx, cy) = PHONE_ANCHOR;
    group(vec![
        DrawOp::fill(
            Shape::rounded(scale.rect(cx, cy, 41.0, 62.0), scale.radius(8.0)),
            ONLINE,
        ),
        DrawOp::punch(Shape::rounded(
            scale.rect(cx + 5.0, cy + 7.0, 31.0, 40.0),
            scale.radius(2.0),
        )),
        DrawOp::punch(circle(scale, cx + 20.5, cy + 54.0, 3.5)),
    ])
}

fn play_triangle(scale: &ScaleContext, cx: f64, cy: f64) -> Shape {
    let mut p = BezPath::new();
    p.move_to(scale.point(cx - 5.0, cy - 9.0));
    p.line_to(scale.point(cx + 10.0, cy));
    p.line_to(scale.point(cx - 5.0, cy + 9.0));
    p.close_path();
    Shape::Path(p)
}

/// Bot tag with its top-left corner at `origin_x` (output px) and reference `y`.
pub fn bot_badge(
    kind: BotBadgeKind,
    origin_x: f64,
    y: f64,
    family: &str,
    scale: &ScaleContext,
) -> Vec<DrawOp> {
    let (w, h) = bot_badge_size(kind);
    let x = origin_x / scale.scale_x;
    let body = Shape::rounded(scale.rect(x, y, w, h), scale.radius(8.0));
    let label = if kind == BotBadgeKind::Ai { "AI" } else { "BOT" };

    let mut ops = vec![DrawOp::fill(body, BLURPLE)];
    let text_left = if kind == BotBadgeKind::Unverified {
        x
    } else {
        ops.push(DrawOp::Stroke {
            shape: Shape::Path(check_mark(scale, x + 10.0, y + h / 2.0)),
            color: WHITE,
            width: scale.length(3.5),
        });
        x + 20.0
    };
    ops.push(DrawOp::Text(TextOp {
        text: label.to_owned(),
        font: FontSpec::bold(family),
        size_px: scale.font(20.0),
        color: WHITE,
        origin: scale.point(text_left + (x + w - text_left) / 2.0, y + h / 2.0 + 7.0),
        align: TextAlign::Center,
        shadow: None,
        stroke: None,
    }));
    ops
}

fn check_mark(scale: &ScaleContext, left: f64, mid_y: f64) -> BezPath {
    let mut p = BezPath::new();
    p.move_to(scale.point(left, mid_y));
    p.line_to(scale.point(left + 5.0, mid_y + 5.0));
    p.line_to(scale.point(left + 14.0, mid_y - 6.0));
    p
}

/// Decorative frame, already wrapped in its half-strength source-out group.
pub fn frame(scale: &ScaleContext) -> DrawOp {
    DrawOp::Group {
        compose: Compose::SourceOut,
        opacity: 0.5,
        clip: None,
        ops: vec![
            DrawOp::Stroke {
                shape: Shape::rounded(scale.rect(9.0, 9.0, 867.0, 285.0), scale.radius(25.0)),
                color: Rgba8::rgba(255, 255, 255, 64),
                width: scale.length(2.0),
            },
            DrawOp::fill_with_opacity(
                Shape::rounded(scale.rect(9.0, 230.0, 867.0, 64.0), scale.radius(25.0)),
                Rgba8::rgb(0, 0, 0),
                0.25,
            ),
        ],
    }
}

fn circle(scale: &ScaleContext, cx: f64, cy: f64, r: f64) -> Shape {
    Shape::Circle {
        center: scale.point(cx, cy),
        radius: scale.radius(r),
    }
}

fn group(ops: Vec<DrawOp>) -> DrawOp {
    DrawOp::Group {
        compose: Compose::SourceOver,
        opacity: 1.0,
        clip: None,
        ops,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn punches(op: &DrawOp) -> usize {
        match op {
            DrawOp::Group { ops, .. } => ops
                .iter()
                .filter(|o| {
                    matches!(
                        o,
                        DrawOp::Group {
                            compose: Compose::DestinationOut,
                            ..
                        }
                    )
                })
                .count(),
            _ => 0,
        }
    }

    #[test]
    fn online_is_a_plain_dot_and_offline_matches_invisible() {
        let s = ScaleContext::reference();
        assert_eq!(punches(&status_icon(PresenceStatus::Online, &s)), 0);
        assert_eq!(
            status_icon(PresenceStatus::Offline, &s),
            status_icon(PresenceStatus::Invisible, &s)
        );
    }

    #[test]
    fn phone_icon_sits_at_phone_anchor() {
        let s = ScaleContext::reference();
        let DrawOp::Group { ops, .. } = status_icon(PresenceStatus::Phone, &s) else {
            panic!("expected group");
        };
        let DrawOp::Fill { shape, .. } = &ops[0] else {
            panic!("expected fill");
        };
        let b = shape.bounds();
        assert_eq!((b.x0, b.y0, b.width(), b.height()), (224.5, 202.0, 41.0, 62.0));
    }

    #[test]
    fn bot_badge_label_per_kind() {
        let s = ScaleContext::reference();
        let label = |kind| {
            bot_badge(kind, 400.0, 110.0, "Helvetica", &s)
                .into_iter()
                .find_map(|op| match op {
                    DrawOp::Text(t) => Some(t.text),
                    _ => None,
                })
        };
        assert_eq!(label(BotBadgeKind::Ai).as_deref(), Some("AI"));
        assert_eq!(label(BotBadgeKind::Verified).as_deref(), Some("BOT"));
        assert_eq!(label(BotBadgeKind::Unverified).as_deref(), Some("BOT"));
    }
}

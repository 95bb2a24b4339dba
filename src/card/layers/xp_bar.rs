use crate::assets::color::{parse_color, parse_colors};
use crate::assets::fonts::FontSpec;
use crate::assets::text::TextMeasure;
use crate::card::format::abbreviate_number;
use crate::card::layers::{MUTED_TEXT, PANEL_ALPHA, XP_BAR, color_or, panel};
use crate::card::options::{RankOptions, XpBarStyle};
use crate::card::scale::ScaleContext;
use crate::foundation::core::{Point, Rgba8};
use crate::foundation::error::{CardError, CardResult};
use crate::render::gradient::GradientSpec;
use crate::render::plan::{DrawOp, LayerPlan, Paint, Shape, TextAlign, TextOp};

/// Width the fill spans at 100%, reference units.
pub const TRACK_FILL_WIDTH: f64 = 556.0;
const TRACK_X: f64 = 304.0;
const TRACK_Y: f64 = 179.0;
const TRACK_WIDTH: f64 = 557.0;
const TRACK_RADIUS: f64 = 14.0;
const LABEL_RIGHT: f64 = 674.0;
const LABEL_GAP: f64 = 10.0;
const LABEL_BASELINE: f64 = 273.0;
const LABEL_PX: f32 = 21.0;

const GOLD: Rgba8 = Rgba8::rgb(0xf1, 0xc4, 0x0f);
const SILVER: Rgba8 = Rgba8::rgb(0xa1, 0xa4, 0xc9);
const BRONZE: Rgba8 = Rgba8::rgb(0xad, 0x8a, 0x56);

/// Rank label colour, in priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RankColor<'a> {
    /// Explicit `rankColor`.
    Custom(&'a str),
    /// Auto colouring matched rank 1, 2 or 3.
    AutoTop(u8),
    Default,
}

impl<'a> RankColor<'a> {
    /// `label` is the formatted rank label, `prefix` the prefix it was built with.
    pub fn resolve(rank: &'a RankOptions, prefix: &str, label: &str) -> Self {
        if let Some(custom) = rank.rank_color.as_deref() {
            return Self::Custom(custom);
        }
        if rank.auto_color_rank {
            for n in 1..=3u8 {
                if label == format!("{prefix} #{n}") {
                    return Self::AutoTop(n);
                }
            }
        }
        Self::Default
    }

    pub fn color(self) -> CardResult<Rgba8> {
        match self {
            Self::Custom(c) => parse_color(c),
            Self::AutoTop(1) => Ok(GOLD),
            Self::AutoTop(2) => Ok(SILVER),
            Self::AutoTop(_) => Ok(BRONZE),
            Self::Default => Ok(MUTED_TEXT),
        }
    }
}

/// Progress numbers after validation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progress {
    pub current: f64,
    pub required: f64,
    pub level: f64,
}

impl Progress {
    pub fn from_options(rank: &RankOptions) -> CardResult<Self> {
        let (Some(current), Some(required), Some(level)) =
            (rank.current_xp, rank.required_xp, rank.level)
        else {
            return Err(missing_fields());
        };
        if current.is_nan() || required.is_nan() || level.is_nan() {
            return Err(missing_fields());
        }
        if required <= 0.0 {
            return Err(CardError::validation(format!(
                "rankData options requires: requiredXp greater than 0 (got {required})"
            )));
        }
        Ok(Self {
            current,
            required,
            level,
        })
    }

    /// Fill width in reference units; not clamped, so overflow runs past the track under its clip.
    pub fn fill_width(&self) -> f64 {
        (self.current * TRACK_FILL_WIDTH / self.required).round()
    }

    pub fn percentage(&self) -> f64 {
        (self.current / self.required * 100.0).round()
    }
}

fn missing_fields() -> CardError {
    CardError::validation("rankData options requires: currentXp, requiredXp and level properties")
}

/// Labels panel, XP text, rank/level labels and the progress track.
pub fn build(
    scale: &ScaleContext,
    rank: &RankOptions,
    family: &str,
    measure: &mut dyn TextMeasure,
) -> CardResult<LayerPlan> {
    let progress = Progress::from_options(rank)?;
    let mut plan = LayerPlan::new(XP_BAR);
    let bold = FontSpec::bold(family);
    let label_px = scale.font(LABEL_PX);

    plan.push(panel(scale, (304.0, 248.0, 380.0, 33.0), 12.0, Rgba8::rgb(0, 0, 0)));

    let mut xp_text = format!(
        "{} / {} XP",
        abbreviate_number(progress.current),
        abbreviate_number(progress.required)
    );
    if rank.show_percentage {
        xp_text.push_str(&format!(" ({}%)", progress.percentage()));
    }
    plan.push(label(
        xp_text,
        FontSpec::regular(family),
        label_px,
        MUTED_TEXT,
        scale.x(314.0),
        scale,
        TextAlign::Left,
    ));

    let prefix = rank.rank_prefix.as_deref().unwrap_or("RANK");
    let rank_text = match rank.rank {
        Some(r) if !rank.hide_rank && !r.is_nan() => {
            Some(format!("{prefix} #{}", abbreviate_number(r)))
        }
        _ => None,
    };
    let level_text =
        (!rank.hide_level).then(|| format!("Lvl {}", abbreviate_number(progress.level)));

    if let Some(rank_text) = rank_text {
        let level_offset = match &level_text {
            Some(lvl) => measure.measure(lvl, &bold, label_px)? + scale.x(LABEL_GAP),
            None => 0.0,
        };
        let color = RankColor::resolve(rank, prefix, &rank_text).color()?;
        plan.push(label(
            rank_text,
            bold.clone(),
            label_px,
            color,
            scale.x(LABEL_RIGHT) - level_offset,
            scale,
            TextAlign::Right,
        ));
    }
    if let Some(level_text) = level_text {
        let color = color_or(rank.level_color.as_deref(), MUTED_TEXT)?;
        plan.push(label(
            level_text,
            bold,
            label_px,
            color,
            scale.x(LABEL_RIGHT),
            scale,
            TextAlign::Right,
        ));
    }

    let height = rank.xp_bar_height.filter(|h| *h > 0.0).unwrap_or(36.0);
    let track = Shape::rounded(
        scale.rect(TRACK_X, TRACK_Y, TRACK_WIDTH, height),
        scale.radius(TRACK_RADIUS),
    );
    plan.push(DrawOp::fill_with_opacity(
        track.clone(),
        Rgba8::rgb(0, 0, 0),
        PANEL_ALPHA,
    ));
    if let Some((width, color)) = rank.bar_border.as_ref().and_then(|b| b.active()) {
        plan.push(DrawOp::Stroke {
            shape: track.clone(),
            color: parse_color(color)?,
            width: scale.length(width),
        });
    }

    let paint = bar_paint(scale, rank, height)?;
    let fill_radius = match rank.xp_bar_style.unwrap_or_default() {
        XpBarStyle::Sharp => 0.0,
        XpBarStyle::Capsule => height / 2.0,
        XpBarStyle::Rounded => TRACK_RADIUS,
    };
    let fill = Shape::rounded(
        scale.rect(TRACK_X, TRACK_Y, progress.fill_width(), height),
        scale.radius(fill_radius),
    );
    plan.push(DrawOp::clipped(
        track,
        vec![DrawOp::Fill {
            shape: fill,
            paint,
            opacity: 1.0,
        }],
    ));
    Ok(plan)
}

/// Bar colours as a gradient along the chosen axis; white when none are given.
fn bar_paint(scale: &ScaleContext, rank: &RankOptions, height: f64) -> CardResult<Paint> {
    let colors = match &rank.bar_color {
        Some(c) if !c.is_empty() => parse_colors(c.as_slice())?,
        _ => return Ok(Paint::Solid(Rgba8::rgb(255, 255, 255))),
    };
    let spec = GradientSpec::new(
        colors,
        rank.bar_gradient_direction.unwrap_or_default(),
        "barColor",
    )?;
    let axis = spec.linear(scale.rect(TRACK_X, TRACK_Y, TRACK_FILL_WIDTH, height));
    Ok(Paint::Linear(axis))
}

fn label(
    text: String,
    font: FontSpec,
    size_px: f32,
    color: Rgba8,
    x: f64,
    scale: &ScaleContext,
    align: TextAlign,
) -> DrawOp {
    DrawOp::Text(TextOp {
        text,
        font,
        size_px,
        color,
        origin: Point::new(x, scale.y(LABEL_BASELINE)),
        align,
        shadow: None,
        stroke: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::text::FixedAdvanceMeasure;
    use crate::card::options::OneOrMany;

    fn plan(rank: &RankOptions) -> CardResult<LayerPlan> {
        build(
            &ScaleContext::reference(),
            rank,
            "Helvetica",
            &mut FixedAdvanceMeasure::default(),
        )
    }

    fn fill_rect(plan: &LayerPlan) -> kurbo::Rect {
        plan.walk()
            .find_map(|op| match op {
                DrawOp::Group { ops, .. } => match &ops[0] {
                    DrawOp::Fill { shape, .. } => Some(shape.bounds()),
                    _ => None,
                },
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn missing_or_nan_fields_are_rejected() {
        let mut rank = RankOptions::new(1.0, 2.0, 3.0);
        rank.level = None;
        let err = plan(&rank).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("currentXp, requiredXp and level"));

        let rank = RankOptions::new(f64::NAN, 2.0, 3.0);
        assert!(plan(&rank).unwrap_err().is_validation());

        let rank = RankOptions::new(1.0, -5.0, 3.0);
        let err = plan(&rank).unwrap_err();
        assert!(err.is_validation());
        assert!(
            err.to_string()
                .contains("rankData options requires: requiredXp greater than 0 (got -5)")
        );
    }

    #[test]
    fn fill_width_is_rounded_fraction_of_track() {
        let p = plan(&RankOptions::new(50.0, 100.0, 5.0)).unwrap();
        assert_eq!(fill_rect(&p).width(), 278.0);

        let full = plan(&RankOptions::new(100.0, 100.0, 5.0)).unwrap();
        assert_eq!(fill_rect(&full).width(), TRACK_FILL_WIDTH);

        let over = plan(&RankOptions::new(200.0, 100.0, 5.0)).unwrap();
        assert_eq!(fill_rect(&over).width(), 2.0 * TRACK_FILL_WIDTH);
    }

    #[test]
    fn labels_and_auto_rank_color() {
        let mut rank = RankOptions::new(50.0, 100.0, 5.0);
        rank.rank = Some(1.0);
        rank.auto_color_rank = true;
        rank.show_percentage = true;
        let p = plan(&rank).unwrap();
        let texts: Vec<&TextOp> = p.texts().collect();
        assert_eq!(texts[0].text, "50 / 100 XP (50%)");
        assert_eq!(texts[1].text, "RANK #1");
        assert_eq!(texts[1].color, GOLD);
        assert_eq!(texts[2].text, "Lvl 5");
        assert_eq!(texts[2].origin.x, 674.0);

        // "Lvl 5" = 5 chars * 21px * 0.5em * 1.1 bold.
        let lvl_width = 5.0 * 21.0 * 0.5 * 1.1;
        assert!((texts[1].origin.x - (674.0 - lvl_width - 10.0)).abs() < 1e-9);
    }

    #[test]
    fn rank_color_priority() {
        let mut rank = RankOptions::new(1.0, 1.0, 1.0);
        rank.auto_color_rank = true;
        assert_eq!(RankColor::resolve(&rank, "RANK", "RANK #2"), RankColor::AutoTop(2));
        assert_eq!(RankColor::resolve(&rank, "RANK", "RANK #3").color().unwrap(), BRONZE);
        assert_eq!(RankColor::resolve(&rank, "RANK", "RANK #4"), RankColor::Default);
        assert_eq!(RankColor::resolve(&rank, "TOP", "TOP #1"), RankColor::AutoTop(1));

        rank.rank_color = Some("#123456".into());
        assert_eq!(
            RankColor::resolve(&rank, "RANK", "RANK #1"),
            RankColor::Custom("#123456")
        );

        rank.rank_color = None;
        rank.auto_color_rank = false;
        assert_eq!(RankColor::resolve(&rank, "RANK", "RANK #1"), RankColor::Default);
    }

    #[test]
    fn hidden_rank_and_level() {
        let mut rank = RankOptions::new(10.0, 100.0, 2.0);
        rank.rank = Some(7.0);
        rank.hide_level = true;
        let p = plan(&rank).unwrap();
        let rank_label = p.texts().find(|t| t.text.starts_with("RANK")).unwrap();
        assert_eq!(rank_label.origin.x, 674.0);

        rank.hide_rank = true;
        let p = plan(&rank).unwrap();
        assert_eq!(p.texts().count(), 1);
    }

    #[test]
    fn bar_styles_and_color_limit() {
        let mut rank = RankOptions::new(50.0, 100.0, 5.0);
        rank.xp_bar_style = Some(XpBarStyle::Capsule);
        rank.xp_bar_height = Some(20.0);
        let p = plan(&rank).unwrap();
        let radius = p
            .walk()
            .find_map(|op| match op {
                DrawOp::Group { ops, .. } => match &ops[0] {
                    DrawOp::Fill {
                        shape: Shape::RoundedRect { radius, .. },
                        ..
                    } => Some(*radius),
                    _ => None,
                },
                _ => None,
            })
            .unwrap();
        assert_eq!(radius, 10.0);

        rank.bar_color = Some(OneOrMany::Many(vec!["#fff".to_owned(); 21]));
        let err = plan(&rank).unwrap_err();
        assert!(err.to_string().contains("barColor"));
    }
}

use crate::card::builtin;
use crate::card::effective::EffectiveStyle;
use crate::card::layers::{FRAME, panel};
use crate::foundation::core::Rgba8;
use crate::render::plan::LayerPlan;

/// Decorative frame plus the date and badge backdrop panels.
///
/// The badge panel is right-anchored and grows by one slot (59 units) per badge.
pub fn build(style: &EffectiveStyle, badge_count: usize) -> LayerPlan {
    let scale = &style.scale;
    let opts = &style.options;
    let mut plan = LayerPlan::new(FRAME);

    plan.push(builtin::frame(scale));

    if !opts.hide_date {
        plan.push(panel(scale, (696.0, 248.0, 165.0, 33.0), 12.0, Rgba8::rgb(0, 0, 0)));
    }

    if opts.badges_frame && badge_count > 0 && !opts.remove_badges {
        let n = badge_count as f64;
        plan.push(panel(
            scale,
            (857.0 - 59.0 * n, 15.0, 59.0 * n + 8.0, 61.0),
            17.0,
            Rgba8::rgb(0, 0, 0),
        ));
    }
    plan
}

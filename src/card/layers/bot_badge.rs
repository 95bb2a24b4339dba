use crate::card::builtin;
use crate::card::effective::EffectiveStyle;
use crate::card::layers::BOT_BADGE;
use crate::card::text_fit::TextFitResult;
use crate::render::plan::LayerPlan;

/// Bot tag placed 10 units after the end of the drawn username.
pub fn build(style: &EffectiveStyle, username: &TextFitResult) -> LayerPlan {
    let scale = &style.scale;
    let x = scale.x(310.0) + username.measured_width_px;
    let mut plan = LayerPlan::new(BOT_BADGE);
    for op in builtin::bot_badge(style.bot_badge, x, 110.0, &style.font_family, scale) {
        plan.push(op);
    }
    plan
}

use std::sync::Arc;

use crate::assets::decode::PreparedImage;
use crate::card::effective::EffectiveStyle;
use crate::card::layers::AVATAR_FRAME;
use crate::card::layers::status::{cutout, parse_presence};
use crate::foundation::error::CardResult;
use crate::render::plan::{DrawOp, LayerPlan};

/// Decoration frame around the avatar, with the status notch cut out of it.
pub fn build(style: &EffectiveStyle, frame: &Arc<PreparedImage>) -> CardResult<LayerPlan> {
    let scale = &style.scale;
    let mut plan = LayerPlan::new(AVATAR_FRAME);
    plan.push(DrawOp::image(
        Arc::clone(frame),
        scale.rect(25.0, 18.0, 269.0, 269.0),
    ));
    if let Some(status) = parse_presence(style.options.presence_status.as_deref())? {
        plan.push(cutout(status, scale));
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::model::CardSpec;
    use crate::card::options::StyleOptions;

    #[test]
    fn notch_follows_presence() {
        let frame = Arc::new(PreparedImage::solid(4, 4, [9, 9, 9, 255]).unwrap());
        let card = CardSpec::new("neo", "a.png");
        let plain = EffectiveStyle::resolve(&card, &StyleOptions::default());
        assert_eq!(build(&plain, &frame).unwrap().ops.len(), 1);

        let phone = EffectiveStyle::resolve(
            &card,
            &StyleOptions {
                presence_status: Some("phone".into()),
                ..StyleOptions::default()
            },
        );
        assert_eq!(build(&phone, &frame).unwrap().ops.len(), 2);
    }
}

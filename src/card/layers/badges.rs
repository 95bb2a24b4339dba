use std::sync::Arc;

use crate::assets::decode::PreparedImage;
use crate::card::effective::BadgeLayout;
use crate::card::layers::BADGES;
use crate::card::scale::ScaleContext;
use crate::render::plan::{DrawOp, ImageFilter, LayerPlan};

/// Per-badge placement inside its slot, reference units before `badgeScale`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BadgeGeometry {
    /// Shift from the cursor; only applied to right-anchored layouts.
    pub offset_x: f64,
    pub offset_y: f64,
    /// Square draw size.
    pub base_width: f64,
}

impl BadgeGeometry {
    /// Account badge artwork fills its slot.
    pub const ACCOUNT: Self = Self {
        offset_x: 0.0,
        offset_y: 0.0,
        base_width: 60.0,
    };
    /// Custom badges are drawn smaller and centred in the slot.
    pub const CUSTOM: Self = Self {
        offset_x: 10.0,
        offset_y: 22.0,
        base_width: 46.0,
    };
}

#[derive(Clone, Debug, PartialEq)]
pub struct BadgeEntry {
    pub image: Arc<PreparedImage>,
    pub geometry: BadgeGeometry,
}

/// Display order: account badges newest first, then custom badges, which replace the account
/// set entirely when `overwrite` is set.
pub fn arrange(
    account: Vec<Arc<PreparedImage>>,
    custom: Vec<Arc<PreparedImage>>,
    overwrite: bool,
) -> Vec<BadgeEntry> {
    let mut entries = Vec::with_capacity(account.len() + custom.len());
    if !(overwrite && !custom.is_empty()) {
        entries.extend(account.into_iter().rev().map(|image| BadgeEntry {
            image,
            geometry: BadgeGeometry::ACCOUNT,
        }));
    }
    entries.extend(custom.into_iter().map(|image| BadgeEntry {
        image,
        geometry: BadgeGeometry::CUSTOM,
    }));
    entries
}

/// Reference-space `(x, y, size)` of every badge.
///
/// The cursor starts at the anchor and moves by `spacing` per badge: rightward for left anchors,
/// leftward otherwise.
pub fn positions(layout: &BadgeLayout, badges: &[BadgeEntry]) -> Vec<(f64, f64, f64)> {
    let (start_x, start_y) = layout.position.start();
    let left = layout.position.is_left();
    let mut x = start_x;
    badges
        .iter()
        .map(|badge| {
            let g = badge.geometry;
            let size = g.base_width * layout.scale;
            let x_pos = if left { x } else { x + g.offset_x * layout.scale };
            let y_pos = start_y + g.offset_y * layout.scale;
            x += if left { layout.spacing } else { -layout.spacing };
            (x_pos, y_pos, size)
        })
        .collect()
}

pub fn build(scale: &ScaleContext, layout: &BadgeLayout, badges: &[BadgeEntry]) -> LayerPlan {
    let mut plan = LayerPlan::new(BADGES);
    for (badge, (x, y, size)) in badges.iter().zip(positions(layout, badges)) {
        plan.push(DrawOp::Image {
            image: Arc::clone(&badge.image),
            dest: scale.rect(x, y, size, size),
            opacity: layout.opacity,
            filter: ImageFilter::default(),
        });
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::options::BadgePosition;

    fn img(tag: u8) -> Arc<PreparedImage> {
        Arc::new(PreparedImage::solid(2, 2, [tag, 0, 0, 255]).unwrap())
    }

    fn layout(position: BadgePosition) -> BadgeLayout {
        BadgeLayout {
            position,
            spacing: 59.0,
            opacity: 1.0,
            scale: 1.0,
        }
    }

    #[test]
    fn account_badges_are_reversed_then_custom_appended() {
        let entries = arrange(vec![img(1), img(2)], vec![img(3)], false);
        let tags: Vec<u8> = entries.iter().map(|e| e.image.rgba8_premul[0]).collect();
        assert_eq!(tags, vec![2, 1, 3]);
        assert_eq!(entries[2].geometry, BadgeGeometry::CUSTOM);
    }

    #[test]
    fn overwrite_replaces_account_badges() {
        let entries = arrange(vec![img(1), img(2)], vec![img(3)], true);
        assert_eq!(entries.len(), 1);
        // Nothing to overwrite with keeps the account set.
        assert_eq!(arrange(vec![img(1)], vec![], true).len(), 1);
    }

    #[test]
    fn top_left_marches_right_by_spacing() {
        let badges = arrange(vec![img(1), img(2), img(3)], vec![], false);
        let pos = positions(&layout(BadgePosition::TopLeft), &badges);
        for (k, (x, y, size)) in pos.into_iter().enumerate() {
            assert_eq!(x, 85.0 + k as f64 * 59.0);
            assert_eq!(y, 15.0);
            assert_eq!(size, 60.0);
        }
    }

    #[test]
    fn top_right_marches_left_and_custom_offsets_apply() {
        let badges = arrange(vec![img(1)], vec![img(2)], false);
        let mut l = layout(BadgePosition::TopRight);
        l.scale = 2.0;
        let pos = positions(&l, &badges);
        assert_eq!(pos[0], (800.0, 15.0, 120.0));
        assert_eq!(pos[1], (800.0 - 59.0 + 20.0, 15.0 + 44.0, 92.0));
    }

    #[test]
    fn build_applies_opacity_and_scale() {
        let badges = arrange(vec![img(1)], vec![], false);
        let mut l = layout(BadgePosition::BottomLeft);
        l.opacity = 0.5;
        let plan = build(&ScaleContext::new(Some(1770), Some(606)), &l, &badges);
        let DrawOp::Image { dest, opacity, .. } = &plan.ops[0] else {
            panic!("expected image");
        };
        assert_eq!(*opacity, 0.5);
        assert_eq!((dest.x0, dest.y0, dest.width()), (170.0, 454.0, 120.0));
    }
}

//! Presence-status cutout shared by the avatar and avatar-frame layers.

use crate::card::builtin::{self, PHONE_ANCHOR};
use crate::card::options::PresenceStatus;
use crate::card::scale::ScaleContext;
use crate::foundation::error::CardResult;
use crate::render::plan::{DrawOp, Shape};

/// Parse the `presenceStatus` option; unset yields `None`.
pub fn parse_presence(value: Option<&str>) -> CardResult<Option<PresenceStatus>> {
    value.map(str::parse).transpose()
}

/// Region erased around the status icon: a tall rounded notch for phone, a circle otherwise.
pub fn notch(status: PresenceStatus, scale: &ScaleContext) -> Shape {
    match status {
        PresenceStatus::Phone => {
            let (cx, cy) = PHONE_ANCHOR;
            Shape::rounded(scale.rect(cx - 8.0, cy - 8.0, 57.0, 78.0), scale.radius(10.0))
        }
        _ => Shape::rounded(scale.rect(212.0, 204.0, 62.0, 62.0), scale.radius(62.0)),
    }
}

/// Punch the notch into what the layer has drawn so far.
pub fn cutout(status: PresenceStatus, scale: &ScaleContext) -> DrawOp {
    DrawOp::punch(notch(status, scale))
}

/// Cutout followed by the status icon.
pub fn cutout_with_icon(status: PresenceStatus, scale: &ScaleContext) -> Vec<DrawOp> {
    vec![cutout(status, scale), builtin::status_icon(status, scale)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_notch_differs_from_every_other_status() {
        let s = ScaleContext::reference();
        let phone = notch(PresenceStatus::Phone, &s).bounds();
        assert_eq!(
            (phone.x0, phone.y0, phone.width(), phone.height()),
            (216.5, 194.0, 57.0, 78.0)
        );
        for status in [
            PresenceStatus::Online,
            PresenceStatus::Idle,
            PresenceStatus::Dnd,
            PresenceStatus::Offline,
            PresenceStatus::Invisible,
            PresenceStatus::Streaming,
        ] {
            let b = notch(status, &s).bounds();
            assert_eq!((b.x0, b.y0, b.width(), b.height()), (212.0, 204.0, 62.0, 62.0));
            assert_ne!(b, phone);
        }
    }

    #[test]
    fn invalid_presence_is_validation_error() {
        assert_eq!(parse_presence(None).unwrap(), None);
        assert_eq!(parse_presence(Some("dnd")).unwrap(), Some(PresenceStatus::Dnd));
        assert!(parse_presence(Some("away")).unwrap_err().is_validation());
    }
}

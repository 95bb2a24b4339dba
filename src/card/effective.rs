use crate::card::format::date_text;
use crate::card::model::CardSpec;
use crate::card::options::{BadgePosition, BorderAlign, StyleOptions};
use crate::card::scale::ScaleContext;

/// Family used when `customFont` is not set.
pub const DEFAULT_FONT_FAMILY: &str = "Helvetica";

/// Fully resolved render configuration.
///
/// Built once per render by [`EffectiveStyle::resolve`]; layers only read it. Options that can
/// fail validation (colours, presence, rank data) stay raw here and are checked by the layer that
/// consumes them.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectiveStyle {
    pub options: StyleOptions,
    pub scale: ScaleContext,
    pub font_family: String,
    pub display_name: String,
    pub tag: String,
    pub is_bot: bool,
    pub bot_badge: BotBadgeKind,
    /// `None` when no border should be drawn.
    pub border: Option<ResolvedBorder>,
    pub badges: BadgeLayout,
    pub background: BackgroundFilter,
    /// `None` when hidden or when no date is known.
    pub date: Option<String>,
    /// Subtitle lines; empty when rank data takes the bottom panel.
    pub subtitles: Vec<String>,
}

/// Border colours plus orientation after theme fallback.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedBorder {
    pub colors: Vec<String>,
    pub align: BorderAlign,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BadgeLayout {
    pub position: BadgePosition,
    pub spacing: f64,
    pub opacity: f32,
    pub scale: f64,
}

/// Blur and brightness for the background image, in output pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackgroundFilter {
    pub blur_sigma: f32,
    pub brightness: f32,
}

/// Which bot tag artwork to draw next to the username.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BotBadgeKind {
    Ai,
    Verified,
    Unverified,
}

impl EffectiveStyle {
    pub fn resolve(card: &CardSpec, options: &StyleOptions) -> Self {
        let scale = ScaleContext::new(options.custom_width, options.custom_height);
        let identity = &card.identity;

        let font_family = options
            .custom_font
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_FONT_FAMILY)
            .to_owned();

        let display_name = options
            .custom_username
            .clone()
            .unwrap_or_else(|| identity.display_name().to_owned());

        let tag = match &options.custom_tag {
            Some(tag) => tag.clone(),
            None if identity.is_ai_account() => "@clyde".to_owned(),
            None => match identity.discriminator.as_deref() {
                None | Some("") | Some("0") => format!("@{}", identity.username),
                Some(disc) => format!("#{disc}"),
            },
        };

        let bot_badge = if identity.is_ai_account() {
            BotBadgeKind::Ai
        } else if identity.verified {
            BotBadgeKind::Verified
        } else {
            BotBadgeKind::Unverified
        };

        let badges = BadgeLayout {
            position: options.badge_position.unwrap_or_default(),
            spacing: options.badge_spacing.unwrap_or(59.0),
            opacity: options.badge_opacity.unwrap_or(1.0).clamp(0.0, 1.0),
            scale: options.badge_scale.unwrap_or(1.0),
        };

        let blur_ref = if options.disable_background_blur {
            0.0
        } else if options.more_background_blur {
            9.0
        } else {
            3.0
        };
        let background = BackgroundFilter {
            blur_sigma: scale.length(blur_ref) as f32,
            brightness: ((100.0 + options.background_brightness.unwrap_or(0.0)) / 100.0).max(0.0),
        };

        let date = if options.hide_date {
            None
        } else {
            Some(date_text(
                options.custom_date.as_deref(),
                identity.created_timestamp,
                options.local_date_type.as_deref(),
            ))
            .filter(|d| !d.is_empty())
        };

        let subtitles = if options.rank_data.is_some() {
            Vec::new()
        } else if let Some(lines) = &options.multiline_subtitle {
            lines.clone()
        } else {
            options.custom_subtitle.iter().cloned().collect()
        };

        Self {
            border: resolve_border(card, options),
            options: options.clone(),
            scale,
            font_family,
            display_name,
            tag,
            is_bot: identity.bot,
            bot_badge,
            badges,
            background,
            date,
            subtitles,
        }
    }
}

/// A set `borderColor` always wins, even when it holds nothing drawable; otherwise the profile
/// theme applies unless disabled. Theme colours default to a vertical gradient, explicit ones to
/// horizontal. Blank entries are dropped.
fn resolve_border(card: &CardSpec, options: &StyleOptions) -> Option<ResolvedBorder> {
    if options.remove_border {
        return None;
    }
    if let Some(colors) = &options.border_color {
        let colors: Vec<String> = colors
            .as_slice()
            .iter()
            .filter(|c| !c.trim().is_empty())
            .cloned()
            .collect();
        if colors.is_empty() {
            tracing::debug!("borderColor set without colours, no border");
            return None;
        }
        return Some(ResolvedBorder {
            colors,
            align: options.border_allign.unwrap_or(BorderAlign::Horizontal),
        });
    }
    if options.disable_profile_theme {
        return None;
    }
    let theme = card
        .decoration
        .profile_colors
        .as_ref()
        .filter(|c| !c.is_empty())?;
    Some(ResolvedBorder {
        colors: theme.clone(),
        align: options.border_allign.unwrap_or(BorderAlign::Vertical),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::model::AI_ACCOUNT_ID;
    use crate::card::options::{OneOrMany, RankOptions};

    fn card() -> CardSpec {
        let mut card = CardSpec::new("neo", "avatar.png");
        card.decoration.profile_colors = Some(vec!["#111111".into(), "#222222".into()]);
        card
    }

    #[test]
    fn tag_resolution() {
        let mut c = card();
        let s = EffectiveStyle::resolve(&c, &StyleOptions::default());
        assert_eq!(s.tag, "@neo");

        c.identity.discriminator = Some("1337".into());
        assert_eq!(EffectiveStyle::resolve(&c, &StyleOptions::default()).tag, "#1337");

        c.identity.id = AI_ACCOUNT_ID.into();
        let s = EffectiveStyle::resolve(&c, &StyleOptions::default());
        assert_eq!(s.tag, "@clyde");
        assert_eq!(s.bot_badge, BotBadgeKind::Ai);

        let opts = StyleOptions {
            custom_tag: Some("custom".into()),
            ..StyleOptions::default()
        };
        assert_eq!(EffectiveStyle::resolve(&c, &opts).tag, "custom");
    }

    #[test]
    fn resolve_does_not_touch_the_options() {
        let mut c = card();
        c.identity.id = AI_ACCOUNT_ID.into();
        let opts = StyleOptions::default();
        let s = EffectiveStyle::resolve(&c, &opts);
        assert_eq!(s.options.custom_tag, None);
        assert_eq!(opts, StyleOptions::default());
    }

    #[test]
    fn theme_border_defaults_vertical() {
        let s = EffectiveStyle::resolve(&card(), &StyleOptions::default());
        let border = s.border.unwrap();
        assert_eq!(border.colors.len(), 2);
        assert_eq!(border.align, BorderAlign::Vertical);
    }

    #[test]
    fn explicit_border_defaults_horizontal_and_wins() {
        let opts = StyleOptions {
            border_color: Some(OneOrMany::from("#ff0000")),
            ..StyleOptions::default()
        };
        let border = EffectiveStyle::resolve(&card(), &opts).border.unwrap();
        assert_eq!(border.colors, vec!["#ff0000".to_owned()]);
        assert_eq!(border.align, BorderAlign::Horizontal);
    }

    #[test]
    fn empty_border_color_draws_nothing_and_blocks_the_theme() {
        for json in [
            r#"{"borderColor": ""}"#,
            r#"{"borderColor": []}"#,
            r#"{"borderColor": [" "]}"#,
        ] {
            let opts: StyleOptions = serde_json::from_str(json).unwrap();
            assert_eq!(EffectiveStyle::resolve(&card(), &opts).border, None, "{json}");
        }

        let opts: StyleOptions =
            serde_json::from_str(r##"{"borderColor": ["", "#00ff00"]}"##).unwrap();
        let border = EffectiveStyle::resolve(&card(), &opts).border.unwrap();
        assert_eq!(border.colors, vec!["#00ff00".to_owned()]);
    }

    #[test]
    fn disabled_theme_or_removed_border_yields_none() {
        let opts = StyleOptions {
            disable_profile_theme: true,
            ..StyleOptions::default()
        };
        assert!(EffectiveStyle::resolve(&card(), &opts).border.is_none());

        let opts = StyleOptions {
            remove_border: true,
            border_color: Some(OneOrMany::from("#ff0000")),
            ..StyleOptions::default()
        };
        assert!(EffectiveStyle::resolve(&card(), &opts).border.is_none());
    }

    #[test]
    fn background_blur_levels_and_brightness() {
        let s = EffectiveStyle::resolve(&card(), &StyleOptions::default());
        assert_eq!(s.background.blur_sigma, 3.0);
        assert_eq!(s.background.brightness, 1.0);

        let opts = StyleOptions {
            more_background_blur: true,
            background_brightness: Some(20.0),
            custom_width: Some(1770),
            custom_height: Some(606),
            ..StyleOptions::default()
        };
        let s = EffectiveStyle::resolve(&card(), &opts);
        assert_eq!(s.background.blur_sigma, 18.0);
        assert!((s.background.brightness - 1.2).abs() < 1e-6);

        let opts = StyleOptions {
            disable_background_blur: true,
            more_background_blur: true,
            ..StyleOptions::default()
        };
        assert_eq!(EffectiveStyle::resolve(&card(), &opts).background.blur_sigma, 0.0);
    }

    #[test]
    fn subtitles_yield_to_rank_data() {
        let opts = StyleOptions {
            multiline_subtitle: Some(vec!["a".into(), "b".into()]),
            custom_subtitle: Some("ignored".into()),
            ..StyleOptions::default()
        };
        assert_eq!(EffectiveStyle::resolve(&card(), &opts).subtitles, vec!["a", "b"]);

        let opts = StyleOptions {
            custom_subtitle: Some("one".into()),
            rank_data: Some(RankOptions::new(1.0, 2.0, 3.0)),
            ..StyleOptions::default()
        };
        assert!(EffectiveStyle::resolve(&card(), &opts).subtitles.is_empty());
    }

    #[test]
    fn date_hidden_or_missing() {
        let mut c = card();
        assert_eq!(EffectiveStyle::resolve(&c, &StyleOptions::default()).date, None);
        c.identity.created_timestamp = Some(1_583_366_400_000);
        assert_eq!(
            EffectiveStyle::resolve(&c, &StyleOptions::default()).date.as_deref(),
            Some("Mar 5, 2020")
        );
        let opts = StyleOptions {
            hide_date: true,
            ..StyleOptions::default()
        };
        assert_eq!(EffectiveStyle::resolve(&c, &opts).date, None);
    }
}

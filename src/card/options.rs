use crate::assets::loader::ImageRef;
use crate::render::gradient::GradientDirection;

/// A single value or a list, as accepted by colour-list options.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::One(v) => std::slice::from_ref(v),
            Self::Many(v) => v,
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(v) => vec![v],
            Self::Many(v) => v,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(v: Vec<T>) -> Self {
        Self::Many(v)
    }
}

impl From<&str> for OneOrMany<String> {
    fn from(v: &str) -> Self {
        Self::One(v.to_owned())
    }
}

/// Width plus colour used for avatar borders, text strokes and bar borders.
///
/// Only applied when both are present, the width is positive and the colour is non-empty.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BorderStyle {
    pub width: Option<f64>,
    pub color: Option<String>,
}

impl BorderStyle {
    pub fn new(width: f64, color: impl Into<String>) -> Self {
        Self {
            width: Some(width),
            color: Some(color.into()),
        }
    }

    /// `(width, colour)` when the style is active.
    pub fn active(&self) -> Option<(f64, &str)> {
        let width = self.width.filter(|w| w.is_finite() && *w > 0.0)?;
        let color = self.color.as_deref().filter(|c| !c.trim().is_empty())?;
        Some((width, color))
    }
}

/// Border gradient orientation (option name keeps its historical spelling, `borderAllign`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderAlign {
    #[default]
    Horizontal,
    Vertical,
}

impl BorderAlign {
    pub fn direction(self) -> GradientDirection {
        match self {
            Self::Horizontal => GradientDirection::Horizontal,
            Self::Vertical => GradientDirection::Vertical,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BadgePosition {
    #[default]
    TopRight,
    TopLeft,
    BottomRight,
    BottomLeft,
}

impl BadgePosition {
    /// Reference-space start of the badge cursor.
    pub fn start(self) -> (f64, f64) {
        match self {
            Self::TopRight => (800.0, 15.0),
            Self::TopLeft => (85.0, 15.0),
            Self::BottomRight => (800.0, 227.0),
            Self::BottomLeft => (85.0, 227.0),
        }
    }

    pub fn is_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::BottomLeft)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum XpBarStyle {
    #[default]
    Rounded,
    Sharp,
    Capsule,
}

/// Presence value; options carry it as a string and the status cutout parses it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresenceStatus {
    Online,
    Idle,
    Offline,
    Dnd,
    Invisible,
    Streaming,
    Phone,
}

impl std::str::FromStr for PresenceStatus {
    type Err = crate::foundation::error::CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "online" => Self::Online,
            "idle" => Self::Idle,
            "offline" => Self::Offline,
            "dnd" => Self::Dnd,
            "invisible" => Self::Invisible,
            "streaming" => Self::Streaming,
            "phone" => Self::Phone,
            other => {
                return Err(crate::foundation::error::CardError::validation(format!(
                    "invalid presenceStatus ('{other}') must be 'online' | 'idle' | 'offline' | \
                     'dnd' | 'invisible' | 'streaming' | 'phone'"
                )));
            }
        })
    }
}

/// Profile card options. Every field is optional; absent fields take the documented default.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleOptions {
    /// Output width in pixels (default 885).
    pub custom_width: Option<u32>,
    /// Output height in pixels (default 303).
    pub custom_height: Option<u32>,

    pub custom_username: Option<String>,
    pub custom_tag: Option<String>,
    pub custom_subtitle: Option<String>,
    pub multiline_subtitle: Option<Vec<String>>,
    /// Subtitle text colour (default `#dadada`).
    pub color: Option<String>,
    pub username_color: Option<String>,
    pub tag_color: Option<String>,

    pub custom_background: Option<ImageRef>,
    pub disable_background_blur: bool,
    pub more_background_blur: bool,
    /// Added to 100 to form a CSS brightness percentage.
    pub background_brightness: Option<f32>,
    /// Default `rgba(42, 45, 51, 0.2)`.
    pub overlay_color: Option<String>,

    pub border_color: Option<OneOrMany<String>>,
    pub border_allign: Option<BorderAlign>,
    pub disable_profile_theme: bool,
    pub remove_border: bool,

    pub custom_badges: Option<Vec<ImageRef>>,
    pub overwrite_badges: bool,
    pub badges_frame: bool,
    pub remove_badges: bool,
    pub badge_position: Option<BadgePosition>,
    /// Default 59.
    pub badge_spacing: Option<f64>,
    /// Default 1.0.
    pub badge_opacity: Option<f32>,
    /// Default 1.0.
    pub badge_scale: Option<f64>,

    pub presence_status: Option<String>,
    pub square_avatar: bool,
    pub avatar_border: Option<BorderStyle>,
    pub remove_avatar_frame: bool,

    /// Verbatim string, or an RFC 3339 timestamp that gets formatted.
    pub custom_date: Option<String>,
    pub local_date_type: Option<String>,
    pub hide_date: bool,

    /// Default `Helvetica`.
    pub custom_font: Option<String>,
    /// Fixed username size; bypasses fitting.
    pub username_size: Option<f32>,
    /// Default 60.
    pub tag_size: Option<f32>,
    pub text_shadow: bool,
    pub text_stroke: Option<BorderStyle>,

    pub rank_data: Option<RankOptions>,
}

/// Experience bar and rank/level labels.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RankOptions {
    #[serde(deserialize_with = "lenient_number")]
    pub current_xp: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub required_xp: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub level: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub rank: Option<f64>,

    pub bar_color: Option<OneOrMany<String>>,
    pub level_color: Option<String>,
    pub auto_color_rank: bool,
    pub rank_color: Option<String>,
    /// Default `RANK`.
    pub rank_prefix: Option<String>,
    pub hide_rank: bool,
    pub hide_level: bool,
    pub show_percentage: bool,
    /// Default 36.
    pub xp_bar_height: Option<f64>,
    pub xp_bar_style: Option<XpBarStyle>,
    pub bar_gradient_direction: Option<GradientDirection>,
    pub bar_border: Option<BorderStyle>,
}

impl RankOptions {
    pub fn new(current_xp: f64, required_xp: f64, level: f64) -> Self {
        Self {
            current_xp: Some(current_xp),
            required_xp: Some(required_xp),
            level: Some(level),
            ..Self::default()
        }
    }
}

/// Welcome/goodbye banner flavour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerKind {
    #[default]
    Welcome,
    Goodbye,
}

/// Welcome/goodbye banner options.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WelcomeOptions {
    /// Default 1024.
    pub custom_width: Option<u32>,
    /// Default 500.
    pub custom_height: Option<u32>,

    pub custom_background: Option<ImageRef>,
    /// Default 3.
    pub background_blur: Option<f32>,
    pub background_brightness: Option<f32>,
    /// Default `rgba(0, 0, 0, 0.4)`.
    pub overlay_color: Option<String>,

    /// Default 200.
    pub avatar_size: Option<f64>,
    /// Default 8px white.
    pub avatar_border: Option<BorderStyle>,
    /// Default 80.
    pub avatar_y: Option<f64>,

    pub welcome_text: Option<String>,
    pub custom_username: Option<String>,
    pub custom_font: Option<String>,
    pub welcome_color: Option<String>,
    pub username_color: Option<String>,
    /// Default on.
    pub text_shadow: Option<bool>,
    pub text_stroke: Option<BorderStyle>,
    /// Default 80.
    pub custom_font_size: Option<f32>,
    /// Default 40.
    pub custom_username_size: Option<f32>,

    #[serde(rename = "type")]
    pub kind: Option<BannerKind>,
}

/// Numbers arrive from loosely typed JSON; anything non-numeric becomes NaN so the consuming
/// layer can reject it with a validation error.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize as _;

    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => None,
        serde_json::Value::Number(n) => Some(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Some(s.trim().parse::<f64>().unwrap_or(f64::NAN)),
        _ => Some(f64::NAN),
    })
}

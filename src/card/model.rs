use crate::assets::loader::ImageRef;

/// Account id that gets the `@clyde` tag and the AI bot badge.
pub const AI_ACCOUNT_ID: &str = "1081004946872352958";

/// Immutable input bundle for one render.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSpec {
    pub identity: Identity,
    pub assets: CardAssets,
    #[serde(default)]
    pub decoration: Decoration,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Identity {
    pub id: String,
    pub username: String,
    /// Display name; preferred over `username` when set.
    pub global_name: Option<String>,
    /// Legacy 4-digit tag; absent or `"0"` means the account uses `@username`.
    pub discriminator: Option<String>,
    pub bot: bool,
    pub verified: bool,
    /// Account creation time, milliseconds since the Unix epoch.
    pub created_timestamp: Option<i64>,
}

impl Identity {
    pub fn is_ai_account(&self) -> bool {
        self.id == AI_ACCOUNT_ID
    }

    /// Global name when present and non-empty, else the username.
    pub fn display_name(&self) -> &str {
        self.global_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.username)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardAssets {
    pub avatar: ImageRef,
    #[serde(default)]
    pub banner: Option<ImageRef>,
    /// Account badges in grant order.
    #[serde(default)]
    pub badges: Vec<BadgeAsset>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BadgeAsset {
    pub name: String,
    pub icon: ImageRef,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Decoration {
    /// Profile theme accent colours.
    pub profile_colors: Option<Vec<String>>,
    pub avatar_frame: Option<ImageRef>,
}

impl CardSpec {
    /// Minimal card with just a username and an avatar reference.
    pub fn new(username: impl Into<String>, avatar: impl Into<ImageRef>) -> Self {
        Self {
            identity: Identity {
                username: username.into(),
                ..Identity::default()
            },
            assets: CardAssets {
                avatar: avatar.into(),
                banner: None,
                badges: Vec::new(),
            },
            decoration: Decoration::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_json_round_trip_fields() {
        let card: CardSpec = serde_json::from_str(
            r#"{
                "identity": {"id": "42", "username": "neo", "globalName": "Neo", "bot": true,
                             "createdTimestamp": 1583366400000},
                "assets": {"avatar": "avatar.png", "badges": [{"name": "hype", "icon": "hype.png"}]}
            }"#,
        )
        .unwrap();
        assert_eq!(card.identity.display_name(), "Neo");
        assert!(card.identity.bot);
        assert_eq!(card.assets.badges[0].icon.as_str(), "hype.png");
        assert_eq!(card.decoration, Decoration::default());
    }

    #[test]
    fn empty_global_name_falls_back_to_username() {
        let mut id = Identity {
            username: "neo".into(),
            global_name: Some(String::new()),
            ..Identity::default()
        };
        assert_eq!(id.display_name(), "neo");
        id.id = AI_ACCOUNT_ID.into();
        assert!(id.is_ai_account());
    }
}

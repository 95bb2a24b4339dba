use std::path::Path;

use anyhow::Context as _;

use crate::card::model::CardSpec;
use crate::foundation::error::{CardError, CardResult};

/// Source of identity, asset and decoration data for a user.
pub trait ProfileProvider: Send + Sync {
    /// Card for `user`, matched by id or username.
    fn fetch(&self, user: &str) -> CardResult<CardSpec>;
}

/// Profiles held in memory, typically loaded from a JSON array of cards.
#[derive(Clone, Debug, Default)]
pub struct JsonProfileProvider {
    cards: Vec<CardSpec>,
}

impl JsonProfileProvider {
    pub fn new(cards: Vec<CardSpec>) -> Self {
        Self { cards }
    }

    /// Accepts either a single card object or an array of cards.
    pub fn from_json_str(s: &str) -> CardResult<Self> {
        let value: serde_json::Value =
            serde_json::from_str(s).context("profile JSON is not valid JSON")?;
        let cards = if value.is_array() {
            serde_json::from_value::<Vec<CardSpec>>(value)
        } else {
            serde_json::from_value::<CardSpec>(value).map(|c| vec![c])
        }
        .context("profile JSON does not match the card schema")?;
        Ok(Self { cards })
    }

    pub fn from_path(path: &Path) -> CardResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read profiles from '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    pub fn cards(&self) -> &[CardSpec] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl ProfileProvider for JsonProfileProvider {
    fn fetch(&self, user: &str) -> CardResult<CardSpec> {
        self.cards
            .iter()
            .find(|c| c.identity.id == user)
            .or_else(|| self.cards.iter().find(|c| c.identity.username == user))
            .cloned()
            .ok_or_else(|| CardError::Other(anyhow::anyhow!("unknown user '{user}'")))
    }
}

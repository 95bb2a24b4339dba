/// Result alias used across the crate.
pub type CardResult<T> = Result<T, CardError>;

/// Every failure a render can surface to its caller.
///
/// A render either returns a complete encoded image or one of these; partial output is never
/// returned.
#[derive(thiserror::Error, Debug)]
pub enum CardError {
    /// Invalid option value (presence status, rank data, colour list length, colour syntax).
    #[error("validation error: {0}")]
    Validation(String),

    /// A required image (avatar, badge, custom badge, avatar frame) could not be loaded/decoded.
    #[error("asset load error: {0}")]
    AssetLoad(String),

    /// Font lookup or font parsing failure.
    #[error("font error: {0}")]
    Font(String),

    /// Internal surface, rasterization or encoding failure.
    #[error("render error: {0}")]
    Render(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CardError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn asset_load(msg: impl Into<String>) -> Self {
        Self::AssetLoad(msg.into())
    }

    pub fn font(msg: impl Into<String>) -> Self {
        Self::Font(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// `true` for [`CardError::Validation`].
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// `true` for [`CardError::AssetLoad`].
    pub fn is_asset_load(&self) -> bool {
        matches!(self, Self::AssetLoad(_))
    }
}

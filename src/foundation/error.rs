use crate::tile::code::TileCodeError;

/// Convenience result type used across the renderer.
pub type PixelmapResult<T> = Result<T, PixelmapError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum PixelmapError {
    /// Invalid configuration or caller-provided data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A tile code that cannot be rendered (wrong length or bad digit).
    #[error("malformed tile code: {0}")]
    MalformedCode(#[from] TileCodeError),

    /// Attempt to move the progress cursor backwards.
    #[error("cursor regression: current {current}, requested {requested}")]
    CursorRegression {
        /// Value currently persisted.
        current: u64,
        /// Value the caller tried to store.
        requested: u64,
    },

    /// Store read/write or image write failure. The affected event is retried on the next pass.
    #[error("io error: {0}")]
    Io(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PixelmapError {
    /// Build a [`PixelmapError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PixelmapError::Io`] value.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Build a [`PixelmapError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether the failure leaves the current event unprocessed so a later pass can retry it.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Other(_))
    }
}

impl From<std::io::Error> for PixelmapError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PixelmapError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

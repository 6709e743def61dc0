/// Convenience result type used across texrepack.
pub type RepackResult<T> = Result<T, RepackError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum RepackError {
    /// A source image could not be turned into pixels by any decode path.
    #[error("decode error: {0}")]
    Decode(String),

    /// Destination or source dimensions are zero or overflow addressable memory.
    #[error("dimension error: {0}")]
    Dimension(String),

    /// A source was invalidated while a full-resolution job was reading it.
    #[error("cache invalidation race: {0}")]
    CacheInvalidationRace(String),

    /// Invalid user-provided parameters or job data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while encoding or persisting output images.
    #[error("encode error: {0}")]
    Encode(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepackError {
    /// Build a [`RepackError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`RepackError::Dimension`] value.
    pub fn dimension(msg: impl Into<String>) -> Self {
        Self::Dimension(msg.into())
    }

    /// Build a [`RepackError::CacheInvalidationRace`] value.
    pub fn invalidation_race(msg: impl Into<String>) -> Self {
        Self::CacheInvalidationRace(msg.into())
    }

    /// Build a [`RepackError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`RepackError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Return `true` for [`RepackError::Decode`].
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

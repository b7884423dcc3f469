/// Convenience result type used across eraframe.
pub type AlbumResult<T> = Result<T, AlbumError>;

/// Top-level error taxonomy used by library APIs.
///
/// Per-item generation failures are not represented here: they are folded into
/// [`GenerationState::Error`](crate::GenerationState::Error) and never abort a round.
#[derive(thiserror::Error, Debug)]
pub enum AlbumError {
    /// Invalid user-provided data (empty label sets, empty compositions, bad layout values).
    #[error("validation error: {0}")]
    Validation(String),

    /// An image source could not be loaded or decoded. Fatal to page composition.
    #[error("failed to load image '{source_ref}': {reason}")]
    LoadFailure {
        /// Truncated reference to the offending source.
        source_ref: String,
        /// Human-readable cause.
        reason: String,
    },

    /// The drawing surface could not be set up.
    #[error("environment error: {0}")]
    Environment(String),

    /// A required font could not be resolved before drawing text.
    #[error("font unavailable: {0}")]
    FontUnavailable(String),

    /// Errors while encoding the finished page.
    #[error("encode error: {0}")]
    Encode(String),

    /// Errors while reading or validating configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AlbumError {
    /// Build a [`AlbumError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`AlbumError::LoadFailure`] value; `source_ref` is truncated for display.
    pub fn load_failure(source_ref: &str, reason: impl Into<String>) -> Self {
        Self::LoadFailure {
            source_ref: truncate_reference(source_ref),
            reason: reason.into(),
        }
    }

    /// Build a [`AlbumError::Environment`] value.
    pub fn environment(msg: impl Into<String>) -> Self {
        Self::Environment(msg.into())
    }

    /// Build a [`AlbumError::FontUnavailable`] value.
    pub fn font_unavailable(msg: impl Into<String>) -> Self {
        Self::FontUnavailable(msg.into())
    }

    /// Build a [`AlbumError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`AlbumError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

const MAX_REFERENCE_CHARS: usize = 50;

/// Shorten a source reference (path, URL, byte summary) for error messages.
pub fn truncate_reference(reference: &str) -> String {
    if reference.chars().count() <= MAX_REFERENCE_CHARS {
        return reference.to_string();
    }
    let mut out: String = reference.chars().take(MAX_REFERENCE_CHARS).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

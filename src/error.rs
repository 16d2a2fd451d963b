use thiserror::Error;

/// Error raised while upcasting a stored representation.
///
/// This is the default error type of [`UpcasterChain`](crate::UpcasterChain).
/// Chains may use any other error type; the chain itself never creates,
/// wraps or swallows errors.
#[derive(Debug, Error)]
pub enum UpcastError {
    /// The representation does not have the shape the step expects.
    #[error("malformed `{type_name}` representation: {reason}")]
    Malformed { type_name: String, reason: String },

    /// The representation is at a revision the step cannot handle.
    #[error("unexpected revision {found} for `{type_name}`, expected {expected}")]
    UnexpectedRevision {
        type_name: String,
        found: u32,
        expected: u32,
    },

    /// A revision step failed to rewrite its input.
    #[error("upcasting `{type_name}` v{from}→v{to} failed: {reason}")]
    StepFailed {
        type_name: String,
        from: u32,
        to: u32,
        reason: String,
    },

    /// The underlying store failed to supply the next representation.
    #[error("failed to read stored representation")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl UpcastError {
    /// Shorthand for [`UpcastError::Malformed`].
    pub fn malformed(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a store read failure.
    pub fn from_source(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Source(Box::new(err))
    }
}

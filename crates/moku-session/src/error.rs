//! Error types for the session layer.

/// Errors from role persistence.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The backing store could not be read or written.
    #[error("role store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// An operation that requires an attached channel ran before attach
    /// (or after detach).
    #[error("channel {0} is not attached")]
    NotAttached(String),

    /// Publishing a message failed.
    #[error("publish failed: {0}")]
    PublishFailed(String),

    /// A presence operation failed.
    #[error("presence operation failed: {0}")]
    PresenceFailed(String),

    /// The transport connection was closed.
    #[error("transport closed")]
    Closed,
}

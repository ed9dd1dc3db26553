//! Room errors.

use moku_protocol::ProtocolError;
use moku_rules::Player;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why entering, running, or leaving a room failed.
///
/// Transport, directory, and role-store backends are generic, so their
/// concrete error types are boxed here rather than enumerated.
#[derive(Debug, Error)]
pub enum RoomError {
    /// The requested player seat is already held by a live member.
    #[error("the {0} seat is already taken")]
    SlotTaken(Player),

    /// Code generation kept colliding with registered rooms.
    #[error("no unused room code found after {0} attempts")]
    CodeSpaceExhausted(usize),

    /// A payload failed to encode or decode.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The pub/sub transport failed.
    #[error("transport: {0}")]
    Transport(#[source] BoxError),

    /// The room directory failed.
    #[error("directory: {0}")]
    Directory(#[source] BoxError),

    /// The role store failed.
    #[error("role store: {0}")]
    Store(#[source] BoxError),
}

impl RoomError {
    /// Wraps a transport backend error.
    pub fn transport(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        RoomError::Transport(Box::new(error))
    }

    /// Wraps a directory backend error.
    pub fn directory(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        RoomError::Directory(Box::new(error))
    }

    /// Wraps a role-store backend error.
    pub fn store(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        RoomError::Store(Box::new(error))
    }
}

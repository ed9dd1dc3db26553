//! Unified error type for the Moku meta-crate.

use moku_match::MatchError;
use moku_protocol::ProtocolError;
use moku_room::RoomError;
use moku_session::SessionError;
use moku_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Applications using the `moku` meta-crate deal with this single type;
/// the `#[from]` attributes let `?` convert sub-crate errors
/// automatically.
#[derive(Debug, thiserror::Error)]
pub enum MokuError {
    /// A rejected match action (out of turn, occupied cell, ...).
    #[error(transparent)]
    Match(#[from] MatchError),

    /// A room-level failure (seat taken, backend trouble, ...).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A payload failed to encode or decode.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The role store failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The in-memory transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The match client actor has already exited; no commands can reach
    /// it anymore.
    #[error("match client is no longer running")]
    ClientClosed,
}

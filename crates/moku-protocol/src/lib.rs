//! Wire protocol for Moku.
//!
//! This crate defines the "language" participants speak over the shared
//! channel:
//!
//! - **Types** ([`Role`], [`PresenceData`], [`RoomCode`], [`Winner`],
//!   directory rows) — the values that travel on the wire.
//! - **Messages** ([`MessageKind`], [`GameMessage`] and its payload
//!   structs) — the reserved channel message types and their exact JSON
//!   shapes.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how payloads are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while doing so.
//!
//! The message-type name travels as the channel message's `kind`, never
//! inside the JSON body; the body is just the payload object. That is the
//! shape browser clients on the same channels exchange, and the tests in
//! this crate pin it field by field.

mod codec;
mod error;
mod messages;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use messages::{
    BoardUpdate, GameMessage, GameOverNotice, GameStateRequest, MessageKind, PlayAgainRequest,
    PlayAgainResponse, RoomCreated,
};
pub use types::{NewRoom, PresenceData, Role, RoomCode, RoomRecord, Winner, WinnerFromIntError};

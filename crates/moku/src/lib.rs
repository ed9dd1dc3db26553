//! # Moku
//!
//! Peer-to-peer five-in-a-row matches over a shared pub/sub channel.
//!
//! There is no game server. Every participant attaches to the room's
//! channel, declares its role in the channel's presence set, and holds
//! its own replica of the game. Moves are applied locally and broadcast;
//! peers fold incoming messages into their replicas, and since each peer
//! only ever writes moves for its own color, the replicas converge
//! without coordination. Presence, not a directory lookup, decides who
//! is in the room — when the last player leaves, everyone tears the
//! room down.
//!
//! [`create_match`] and [`join_match`] spawn a client actor per
//! participant; the application drives it through a [`MatchHandle`] and
//! renders the [`MatchEvent`]s coming back.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use moku::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), MokuError> {
//!     let hub = MemoryHub::new();
//!     let transport = hub.connect(generate_client_id());
//!
//!     let (handle, mut events) = create_match(
//!         &transport,
//!         MemoryDirectory::default(),
//!         MemoryRoleStore::new(),
//!         JsonCodec,
//!         ConfirmPolicy::default(),
//!         MatchConfig::default(),
//!     )
//!     .await?;
//!     println!("share this code: {}", handle.room_code());
//!
//!     while let Some(event) = events.recv().await {
//!         println!("{event:?}");
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod events;

pub use client::{EventStream, MatchHandle, MatchInfo, create_match, join_match};
pub use error::MokuError;
pub use events::{CloseReason, MatchEvent};

// The sub-crate surface applications touch, re-exported so `moku` can be
// their only direct dependency.
pub use moku_match::{GameState, MatchConfig, MatchError, MoveSuggester, Phase};
pub use moku_protocol::{
    Codec, JsonCodec, PresenceData, ProtocolError, Role, RoomCode, RoomRecord, Winner,
};
pub use moku_room::{ConfirmPolicy, DirectoryError, MemoryDirectory, RoomDirectory, RoomError};
pub use moku_rules::{Board, Cell, GameRules, Player, Position};
pub use moku_session::{MemoryRoleStore, RoleStore, SessionError, generate_client_id};
pub use moku_transport::{ClientId, MemoryHub, Transport, TransportError};

/// The names almost every Moku application needs.
pub mod prelude {
    pub use crate::{
        ClientId, CloseReason, ConfirmPolicy, EventStream, GameRules, GameState, JsonCodec,
        MatchConfig, MatchEvent, MatchHandle, MatchInfo, MemoryDirectory, MemoryHub,
        MemoryRoleStore, MokuError, Phase, Player, Position, Role, RoomCode, Winner,
        create_match, generate_client_id, join_match,
    };
}

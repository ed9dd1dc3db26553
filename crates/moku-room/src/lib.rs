//! Room plumbing for Moku: occupancy, lifecycle, and the directory.
//!
//! A room is one match, identified by a shareable code and backed by one
//! pub/sub channel named `game:{CODE}`. Who is *in* the room is decided
//! entirely by the channel's presence set — the external
//! [`RoomDirectory`] only advertises rooms and reserves codes.
//!
//! Presence reads are eventually consistent, so every conclusion drawn
//! from one (tearing down an abandoned room, rejecting a seat claim)
//! goes through [`ConfirmPolicy`]: wait one settle interval, read again,
//! and only then act.

mod confirm;
mod directory;
mod error;
mod lifecycle;
mod presence;

pub use confirm::ConfirmPolicy;
pub use directory::{DirectoryError, MemoryDirectory, RoomDirectory};
pub use error::RoomError;
pub use lifecycle::{
    RoomEntry, allocate_room_code, channel_name, cleanup_room, create_room, generate_room_code,
    join_room, publish,
};
pub use presence::{Occupancy, sample_occupancy};

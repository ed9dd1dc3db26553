//! Participant identity for Moku.
//!
//! Two small concerns live here:
//!
//! 1. **Identity** — [`generate_client_id`] mints the random id a
//!    participant presents to the transport and embeds in payloads.
//! 2. **Role persistence** — the [`RoleStore`] trait, the per-room
//!    mapping of "which role am I in this room". Written on
//!    create/join and on a rematch color swap, cleared on room cleanup.
//!
//! The store is deliberately a trait: browser clients keep this mapping
//! in local storage; tests and demos use [`MemoryRoleStore`].

mod error;
mod identity;
mod store;

pub use error::SessionError;
pub use identity::generate_client_id;
pub use store::{MemoryRoleStore, RoleStore};

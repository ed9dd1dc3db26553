//! The match state machine for Moku.
//!
//! Every peer in a room runs its own [`MatchMachine`]. Local actions
//! (placing a stone, surrendering, voting on a rematch) validate against
//! the machine's current state and produce a [`GameMessage`] for the
//! caller to publish; remote messages (including the echo of the peer's
//! own publishes) are folded back in through [`MatchMachine::apply_remote`],
//! which returns the [`Effect`]s the surrounding client should surface.
//!
//! The machine is deliberately synchronous and transport-free so it can
//! be driven from tests without a runtime. Convergence rests on two
//! properties: each peer only ever authors moves for its own colour, and
//! applying the same message twice leaves the state unchanged.
//!
//! [`GameMessage`]: moku_protocol::GameMessage

mod config;
mod error;
mod machine;
mod rematch;
mod state;
mod suggest;

pub use config::MatchConfig;
pub use error::MatchError;
pub use machine::{Effect, MatchMachine};
pub use rematch::RematchVote;
pub use state::{GameState, Phase};
pub use suggest::MoveSuggester;

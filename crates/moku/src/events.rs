//! Events the match client surfaces to the application.

use std::fmt;

use moku_match::GameState;
use moku_protocol::{Role, Winner};
use moku_rules::Position;
use moku_transport::ClientId;

/// One thing that happened in the match, as far as a renderer cares.
///
/// The client actor pushes these onto the event stream returned by
/// [`create_match`] and [`join_match`]; each carries enough to redraw
/// without querying the client back. Events for this peer's own actions
/// arrive through the same stream — the channel echoes publishes back to
/// their sender, and the echo is what produces the event.
///
/// [`create_match`]: crate::create_match
/// [`join_match`]: crate::join_match
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchEvent {
    /// This peer is the only player present. The board was reset and
    /// moves are rejected until an opponent joins.
    WaitingForOpponent,

    /// Both seats are filled; the game is on.
    RoomActive,

    /// The shared game state changed (a move landed or a snapshot was
    /// applied).
    BoardUpdated(GameState),

    /// A result was recorded: win, draw, or surrender.
    GameEnded {
        winner: Winner,
        /// The five winning cells; empty for draws and surrenders.
        winning_cells: Vec<Position>,
    },

    /// A peer asked for a rematch and is waiting for this peer's answer.
    RematchRequested { requester: ClientId },

    /// The rematch starts. The board is fresh and this peer now holds
    /// `role` — colors swap every rematch.
    RematchAccepted { role: Role },

    /// The rematch was turned down; the final board stays up.
    RematchDeclined,

    /// The client left the room and its actor exited. Always the last
    /// event on the stream.
    RoomClosed { reason: CloseReason },
}

/// Why the client closed the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// No players are left in the room.
    Abandoned,

    /// This peer declined a rematch and backed out of the room.
    RematchDeclined,

    /// The application asked to leave.
    Left,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::Abandoned => write!(f, "abandoned"),
            CloseReason::RematchDeclined => write!(f, "rematch declined"),
            CloseReason::Left => write!(f, "left"),
        }
    }
}

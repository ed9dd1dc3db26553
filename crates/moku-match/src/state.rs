//! Game state and match lifecycle.

use moku_protocol::Winner;
use moku_rules::{Board, Player, Position};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// The full, replicated state of a game.
///
/// Every peer holds its own copy. A local move mutates the copy first and
/// publishes the result; remote updates overwrite whichever fields the
/// message carries. Because each peer only authors moves for its own
/// colour, concurrent writers never fight over the same cell and replicas
/// converge without coordination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// The board grid.
    pub board: Board,

    /// Whose turn it is. Black always opens.
    pub current_player: Player,

    /// Set once the game ends; `None` while play continues.
    pub winner: Option<Winner>,

    /// The five cells of the winning run. Empty for draws and surrenders.
    pub winning_cells: Vec<Position>,

    /// `true` once a win, draw, or surrender has been recorded.
    pub game_over: bool,

    /// The most recently placed stone, if any.
    pub last_move: Option<Position>,
}

impl GameState {
    /// A fresh game on an empty `size` x `size` board, black to move.
    pub fn new(size: usize) -> Self {
        Self {
            board: Board::empty(size),
            current_player: Player::Black,
            winner: None,
            winning_cells: Vec::new(),
            game_over: false,
            last_move: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Where the match is in its lifecycle.
///
/// ```text
/// Waiting ⇄ Active → GameOver
///    ↑                  │
///    └── opponent left ─┘   (rematch accepted: GameOver → Active)
/// ```
///
/// - **Waiting**: fewer than two players are present. The board is empty
///   and moves are rejected.
/// - **Active**: both seats are filled and play is in progress.
/// - **GameOver**: a win, draw, or surrender has been recorded. The board
///   stays visible; only rematch votes are accepted.
///
/// Phase is derived locally from presence and game results; it never
/// travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Waiting,
    Active,
    GameOver,
}

impl Phase {
    /// Returns `true` while the match waits for a second player.
    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` while moves are being accepted.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns `true` once a result has been recorded.
    pub fn is_over(&self) -> bool {
        matches!(self, Self::GameOver)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Active => write!(f, "Active"),
            Self::GameOver => write!(f, "GameOver"),
        }
    }
}

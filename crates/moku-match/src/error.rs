//! Match errors.

use moku_rules::Position;
use thiserror::Error;

/// Why a local match action was rejected.
///
/// These never travel on the wire: a rejected action publishes nothing,
/// so peers simply never learn it was attempted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// The position does not address a cell on the board.
    #[error("position {0} is outside the board")]
    OutOfBounds(Position),

    /// The cell already holds a stone.
    #[error("cell {0} is already occupied")]
    CellOccupied(Position),

    /// A result has already been recorded for this game.
    #[error("the game is already over")]
    GameAlreadyOver,

    /// Spectators can watch and ask for snapshots, nothing else.
    #[error("spectators cannot play in this match")]
    NotAPlayer,

    /// The second seat is still empty.
    #[error("waiting for an opponent to join")]
    WaitingForOpponent,

    /// It is the other player's turn.
    #[error("not your turn")]
    NotYourTurn,

    /// Rematch votes are only valid once the game has ended.
    #[error("the game is still in progress")]
    GameNotOver,

    /// There is no incoming rematch request to answer.
    #[error("no rematch request is pending")]
    NoPendingRequest,

    /// A move suggester failed to produce a position.
    #[error("move suggestion failed: {0}")]
    SuggestionFailed(String),
}

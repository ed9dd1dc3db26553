//! Pluggable move suggestion.

use std::future::Future;

use moku_rules::{Board, GameRules, Player, Position};

use crate::MatchError;

/// Produces a move for `player` on the given board.
///
/// Implementations range from a local heuristic to a remote service; the
/// machine does not care. The returned position goes through the same
/// validation as a human move, so a suggester that proposes an occupied
/// or off-board cell is rejected rather than trusted.
pub trait MoveSuggester: Send + Sync + 'static {
    /// Picks a position for `player` to play next.
    fn suggest(
        &self,
        board: &Board,
        rules: GameRules,
        player: Player,
    ) -> impl Future<Output = Result<Position, MatchError>> + Send;
}

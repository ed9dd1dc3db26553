//! Match configuration.

use moku_rules::GameRules;
use serde::{Deserialize, Serialize};

/// Configuration for a single match.
///
/// Both peers must run the same configuration; it is fixed when the room
/// is created and never travels on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Side length of the square board.
    pub board_size: usize,

    /// Win-detection rules applied after every move.
    pub rules: GameRules,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            board_size: 15,
            rules: GameRules::default(),
        }
    }
}

impl MatchConfig {
    /// Overrides the board size, keeping the default rules.
    pub fn with_board_size(mut self, board_size: usize) -> Self {
        self.board_size = board_size;
        self
    }

    /// Overrides the rule set.
    pub fn with_rules(mut self, rules: GameRules) -> Self {
        self.rules = rules;
        self
    }
}

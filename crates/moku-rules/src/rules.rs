//! Win and draw detection.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Cell, Player, Position};

/// Togglable win-rule variants.
///
/// Defaults are exactly-five on, no-blocked-wins off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRules {
    /// A line wins only at length exactly 5; runs of 6+ never win.
    pub exactly_five: bool,
    /// A 5-run flanked by opponent stones on both ends does not win.
    pub no_blocked_wins: bool,
}

impl Default for GameRules {
    fn default() -> GameRules {
        GameRules {
            exactly_five: true,
            no_blocked_wins: false,
        }
    }
}

/// Outcome of [`check_win`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinResult {
    pub is_win: bool,
    /// The contiguous run that won, starting at the just-played cell and
    /// continuing outward in each direction. Empty when `is_win` is false.
    pub winning_cells: Vec<Position>,
}

impl WinResult {
    fn win(winning_cells: Vec<Position>) -> WinResult {
        WinResult {
            is_win: true,
            winning_cells,
        }
    }

    fn none() -> WinResult {
        WinResult {
            is_win: false,
            winning_cells: Vec::new(),
        }
    }
}

/// The four line directions through a cell. Order is fixed: horizontal,
/// vertical, down-right diagonal, down-left diagonal.
const DIRECTIONS: [(i64, i64); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Evaluates whether the stone just played at `pos` completes a winning
/// line for `player`.
///
/// Each direction is walked both ways from the played cell, counting the
/// contiguous run and noting the first cell beyond each end (the flanks,
/// possibly off-board). The first direction that satisfies the active
/// rules wins; directions are independent because every run examined
/// passes through the single just-played cell.
///
/// `pos` must be in bounds and already hold the player's stone — the
/// state machine validates moves before applying them, so violations
/// here are programming errors and panic via indexing.
pub fn check_win(board: &Board, pos: Position, player: Player, rules: GameRules) -> WinResult {
    let stone = player.cell();

    for (dr, dc) in DIRECTIONS {
        let mut run = vec![pos];

        let (mut r, mut c) = (pos.row as i64 + dr, pos.col as i64 + dc);
        while board.probe(r, c) == Some(stone) {
            run.push(Position::new(r as usize, c as usize));
            r += dr;
            c += dc;
        }
        let forward_flank = (r, c);

        let (mut r, mut c) = (pos.row as i64 - dr, pos.col as i64 - dc);
        while board.probe(r, c) == Some(stone) {
            run.push(Position::new(r as usize, c as usize));
            r -= dr;
            c -= dc;
        }
        let backward_flank = (r, c);

        if run.len() < 5 {
            continue;
        }
        if rules.exactly_five && run.len() != 5 {
            continue;
        }
        if rules.no_blocked_wins && run.len() == 5 {
            let blocked_by_opponent = |(row, col): (i64, i64)| {
                matches!(board.probe(row, col), Some(cell) if cell != Cell::Empty && cell != stone)
            };
            if blocked_by_opponent(forward_flank) && blocked_by_opponent(backward_flank) {
                continue;
            }
        }
        return WinResult::win(run);
    }

    WinResult::none()
}

/// True iff no empty cell remains. Only meaningful when the just-played
/// move did not win; callers check [`check_win`] first.
pub fn check_draw(board: &Board) -> bool {
    board.is_full()
}

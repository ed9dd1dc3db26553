//! Board model: cells, players, positions.
//!
//! Wire encoding is numeric — `0` empty, `1` black, `2` white — and the
//! board itself serializes as a bare 2-D array of those numbers, so a
//! serialized board is exactly what web clients on the same channel
//! exchange.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Cell / Player
// ---------------------------------------------------------------------------

/// One square of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Cell {
    Empty,
    Black,
    White,
}

/// Raised when a wire value outside `0..=2` is decoded into a [`Cell`].
#[derive(Debug, thiserror::Error)]
#[error("invalid cell value {0}, expected 0, 1 or 2")]
pub struct CellFromIntError(pub u8);

impl From<Cell> for u8 {
    fn from(cell: Cell) -> u8 {
        match cell {
            Cell::Empty => 0,
            Cell::Black => 1,
            Cell::White => 2,
        }
    }
}

impl TryFrom<u8> for Cell {
    type Error = CellFromIntError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Cell::Empty),
            1 => Ok(Cell::Black),
            2 => Ok(Cell::White),
            other => Err(CellFromIntError(other)),
        }
    }
}

/// One of the two stone colors. Same wire values as the matching cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Player {
    Black,
    White,
}

impl Player {
    /// The opponent.
    pub fn other(self) -> Player {
        match self {
            Player::Black => Player::White,
            Player::White => Player::Black,
        }
    }

    /// The cell state this player's stones occupy.
    pub fn cell(self) -> Cell {
        match self {
            Player::Black => Cell::Black,
            Player::White => Cell::White,
        }
    }
}

impl From<Player> for u8 {
    fn from(player: Player) -> u8 {
        match player {
            Player::Black => 1,
            Player::White => 2,
        }
    }
}

impl TryFrom<u8> for Player {
    type Error = CellFromIntError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Player::Black),
            2 => Ok(Player::White),
            other => Err(CellFromIntError(other)),
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::Black => write!(f, "black"),
            Player::White => write!(f, "white"),
        }
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A 0-indexed board coordinate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Position {
        Position { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// A square grid of cells.
///
/// Serializes transparently as rows of numeric cells. Indexed access
/// panics on out-of-range coordinates: callers validate bounds before
/// mutating, so an out-of-range index is a bug, not a runtime condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: Vec<Vec<Cell>>,
}

impl Board {
    /// A size × size board of empty cells.
    pub fn empty(size: usize) -> Board {
        Board {
            cells: vec![vec![Cell::Empty; size]; size],
        }
    }

    /// Side length.
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    /// The grid in row-major order, for rendering and scans.
    pub fn cells(&self) -> &[Vec<Cell>] {
        &self.cells
    }

    pub fn get(&self, pos: Position) -> Cell {
        self.cells[pos.row][pos.col]
    }

    pub fn set(&mut self, pos: Position, cell: Cell) {
        self.cells[pos.row][pos.col] = cell;
    }

    /// True when `pos` addresses a cell on this board.
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.row < self.size() && pos.col < self.size()
    }

    /// Cell at signed coordinates, or `None` when off-board.
    /// Ray walks step off the edge; this keeps that arithmetic in one place.
    pub fn probe(&self, row: i64, col: i64) -> Option<Cell> {
        if row < 0 || col < 0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        if row >= self.size() || col >= self.size() {
            return None;
        }
        Some(self.cells[row][col])
    }

    /// True when no empty cell remains.
    pub fn is_full(&self) -> bool {
        self.cells
            .iter()
            .all(|row| row.iter().all(|&cell| cell != Cell::Empty))
    }
}

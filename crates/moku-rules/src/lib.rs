//! Deterministic rule engine for Moku.
//!
//! Pure functions over a square board — no I/O, no clocks, no transport.
//! Every participant in a match runs this engine over the same inputs and
//! must reach the same verdict; that determinism is what lets the
//! coordination protocol get away with having no referee.
//!
//! # Key items
//!
//! - [`Board`], [`Cell`], [`Player`], [`Position`] — the board model
//! - [`GameRules`] — togglable win-rule variants
//! - [`check_win`] — line detection through the just-played cell
//! - [`check_draw`] — full-board detection

mod board;
mod rules;

pub use board::{Board, Cell, CellFromIntError, Player, Position};
pub use rules::{GameRules, WinResult, check_draw, check_win};

//! Core wire types: roles, room codes, winners, directory rows.

use std::fmt;

use serde::{Deserialize, Serialize};

use moku_rules::Player;
use moku_transport::ClientId;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// A participant's capacity in a room.
///
/// At most one live participant holds each player role in a room at any
/// time; any number may spectate. The wire strings are the exact role
/// names browser clients put in their presence data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    PlayerBlack,
    PlayerWhite,
    Spectator,
}

impl Role {
    /// The stone color this role plays, or `None` for spectators.
    pub fn player(self) -> Option<Player> {
        match self {
            Role::PlayerBlack => Some(Player::Black),
            Role::PlayerWhite => Some(Player::White),
            Role::Spectator => None,
        }
    }

    pub fn from_player(player: Player) -> Role {
        match player {
            Player::Black => Role::PlayerBlack,
            Player::White => Role::PlayerWhite,
        }
    }

    pub fn is_player(self) -> bool {
        self != Role::Spectator
    }

    /// The role after a rematch color swap. Spectators keep their role.
    pub fn swapped(self) -> Role {
        match self {
            Role::PlayerBlack => Role::PlayerWhite,
            Role::PlayerWhite => Role::PlayerBlack,
            Role::Spectator => Role::Spectator,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::PlayerBlack => write!(f, "black"),
            Role::PlayerWhite => write!(f, "white"),
            Role::Spectator => write!(f, "spectator"),
        }
    }
}

/// The data each participant attaches to its presence entry.
///
/// Membership decisions (slot taken? room active?) are made from these
/// declared roles, so this struct is the whole presence payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceData {
    pub role: Role,
}

impl PresenceData {
    pub fn new(role: Role) -> PresenceData {
        PresenceData { role }
    }
}

// ---------------------------------------------------------------------------
// RoomCode
// ---------------------------------------------------------------------------

/// A short human-shareable room identifier.
///
/// Doubles as the channel name and the directory `room_name`. Codes are
/// uppercase alphanumeric; [`RoomCode::parse`] normalizes user input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Wraps an already-canonical code (as received on the wire).
    pub fn new(code: impl Into<String>) -> RoomCode {
        RoomCode(code.into())
    }

    /// Normalizes typed user input: trims whitespace and uppercases.
    pub fn parse(input: &str) -> RoomCode {
        RoomCode(input.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Winner
// ---------------------------------------------------------------------------

/// Raised when a wire value outside `0..=2` is decoded into a [`Winner`].
#[derive(Debug, thiserror::Error)]
#[error("invalid winner value {0}, expected 0, 1 or 2")]
pub struct WinnerFromIntError(pub u8);

/// Outcome of a finished game. `Draw` is the full-board-no-winner case;
/// wire value 0, with the player values matching their cell numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Winner {
    Draw,
    Black,
    White,
}

impl Winner {
    /// The winning player, or `None` for a draw.
    pub fn player(self) -> Option<Player> {
        match self {
            Winner::Draw => None,
            Winner::Black => Some(Player::Black),
            Winner::White => Some(Player::White),
        }
    }
}

impl From<Player> for Winner {
    fn from(player: Player) -> Winner {
        match player {
            Player::Black => Winner::Black,
            Player::White => Winner::White,
        }
    }
}

impl From<Winner> for u8 {
    fn from(winner: Winner) -> u8 {
        match winner {
            Winner::Draw => 0,
            Winner::Black => 1,
            Winner::White => 2,
        }
    }
}

impl TryFrom<u8> for Winner {
    type Error = WinnerFromIntError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Winner::Draw),
            1 => Ok(Winner::Black),
            2 => Ok(Winner::White),
            other => Err(WinnerFromIntError(other)),
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Winner::Draw => write!(f, "draw"),
            Winner::Black => write!(f, "black"),
            Winner::White => write!(f, "white"),
        }
    }
}

// ---------------------------------------------------------------------------
// Directory rows
// ---------------------------------------------------------------------------

/// A room as advertised by the external directory service.
///
/// Bookkeeping only — presence, not the directory, decides who may join.
/// Field names are the REST service's own (snake_case).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    /// Directory-assigned row id.
    pub id: u64,
    /// The room code.
    pub room_name: String,
    /// The creator's client id.
    pub host_client_id: ClientId,
}

/// Registration request for a new room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRoom {
    pub room_name: String,
    pub host_client_id: ClientId,
}

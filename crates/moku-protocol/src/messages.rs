//! The reserved channel message types and their payloads.
//!
//! Presence coordination, move traffic, and the rematch handshake all
//! share one channel, so the type names must stay disjoint. The type name
//! travels as the channel message's `kind`; the JSON body is the bare
//! payload object, camelCase, with boards and players in their numeric
//! encodings.

use std::fmt;

use serde::{Deserialize, Serialize};

use moku_rules::{Board, Player, Position};
use moku_transport::ClientId;

use crate::codec::Codec;
use crate::error::ProtocolError;
use crate::types::{Role, RoomCode, Winner};

// ---------------------------------------------------------------------------
// MessageKind
// ---------------------------------------------------------------------------

/// The channel message-type names this protocol reserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    BoardUpdate,
    GameOver,
    PlayAgainRequest,
    PlayAgainResponse,
    RequestGameState,
    RoomCreated,
}

impl MessageKind {
    pub const ALL: [MessageKind; 6] = [
        MessageKind::BoardUpdate,
        MessageKind::GameOver,
        MessageKind::PlayAgainRequest,
        MessageKind::PlayAgainResponse,
        MessageKind::RequestGameState,
        MessageKind::RoomCreated,
    ];

    /// The wire name, as used for `Channel::publish`.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::BoardUpdate => "board-update",
            MessageKind::GameOver => "game-over",
            MessageKind::PlayAgainRequest => "play-again-request",
            MessageKind::PlayAgainResponse => "play-again-response",
            MessageKind::RequestGameState => "request-game-state",
            MessageKind::RoomCreated => "room-created",
        }
    }

    /// Looks a wire name up; `None` for types this protocol doesn't know,
    /// which receivers skip rather than treat as errors.
    pub fn parse(name: &str) -> Option<MessageKind> {
        MessageKind::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// `board-update`: the mover's post-move snapshot, also used to answer
/// `request-game-state`. Receivers overwrite board, turn, and last move
/// wholesale — last-writer-wins by construction, since only the mover
/// publishes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardUpdate {
    pub board: Board,
    pub current_player: Player,
    pub last_move: Option<Position>,
}

/// `game-over`: a win, a draw, or a surrender.
///
/// The winning move carries the final board and last move; a surrender
/// carries neither (there is no move), so both fields are absent from
/// that JSON rather than null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOverNotice {
    pub winner: Winner,
    pub winning_cells: Vec<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_move: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<Board>,
}

/// `play-again-request`: first half of the rematch handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayAgainRequest {
    pub requester_id: ClientId,
}

/// `play-again-response`: second half of the rematch handshake. Consumed
/// by every participant, the responder included (via echo).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayAgainResponse {
    pub accepted: bool,
    pub responder_id: ClientId,
}

/// `request-game-state`: a late joiner or spectator asking any present
/// member to republish the current board snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateRequest {
    pub requester_id: ClientId,
}

/// `room-created`: lifecycle announcement published by the creator after
/// registering the room with the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCreated {
    pub room_id: RoomCode,
    pub host_id: ClientId,
    pub role: Role,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

// ---------------------------------------------------------------------------
// GameMessage
// ---------------------------------------------------------------------------

/// One decoded channel message of any reserved kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameMessage {
    BoardUpdate(BoardUpdate),
    GameOver(GameOverNotice),
    PlayAgainRequest(PlayAgainRequest),
    PlayAgainResponse(PlayAgainResponse),
    RequestGameState(GameStateRequest),
    RoomCreated(RoomCreated),
}

impl GameMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            GameMessage::BoardUpdate(_) => MessageKind::BoardUpdate,
            GameMessage::GameOver(_) => MessageKind::GameOver,
            GameMessage::PlayAgainRequest(_) => MessageKind::PlayAgainRequest,
            GameMessage::PlayAgainResponse(_) => MessageKind::PlayAgainResponse,
            GameMessage::RequestGameState(_) => MessageKind::RequestGameState,
            GameMessage::RoomCreated(_) => MessageKind::RoomCreated,
        }
    }

    /// Encodes just the payload body; the kind travels as the channel
    /// message name.
    pub fn encode<C: Codec>(&self, codec: &C) -> Result<Vec<u8>, ProtocolError> {
        match self {
            GameMessage::BoardUpdate(payload) => codec.encode(payload),
            GameMessage::GameOver(payload) => codec.encode(payload),
            GameMessage::PlayAgainRequest(payload) => codec.encode(payload),
            GameMessage::PlayAgainResponse(payload) => codec.encode(payload),
            GameMessage::RequestGameState(payload) => codec.encode(payload),
            GameMessage::RoomCreated(payload) => codec.encode(payload),
        }
    }

    /// Decodes a payload body of the given kind.
    pub fn decode<C: Codec>(
        codec: &C,
        kind: MessageKind,
        data: &[u8],
    ) -> Result<GameMessage, ProtocolError> {
        Ok(match kind {
            MessageKind::BoardUpdate => GameMessage::BoardUpdate(codec.decode(data)?),
            MessageKind::GameOver => GameMessage::GameOver(codec.decode(data)?),
            MessageKind::PlayAgainRequest => GameMessage::PlayAgainRequest(codec.decode(data)?),
            MessageKind::PlayAgainResponse => GameMessage::PlayAgainResponse(codec.decode(data)?),
            MessageKind::RequestGameState => GameMessage::RequestGameState(codec.decode(data)?),
            MessageKind::RoomCreated => GameMessage::RoomCreated(codec.decode(data)?),
        })
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::JsonCodec;
    use moku_rules::Cell;

    fn small_board() -> Board {
        let mut board = Board::empty(3);
        board.set(Position::new(0, 0), Cell::Black);
        board.set(Position::new(1, 1), Cell::White);
        board
    }

    #[test]
    fn test_kind_names_match_wire_protocol() {
        assert_eq!(MessageKind::BoardUpdate.as_str(), "board-update");
        assert_eq!(MessageKind::GameOver.as_str(), "game-over");
        assert_eq!(MessageKind::PlayAgainRequest.as_str(), "play-again-request");
        assert_eq!(
            MessageKind::PlayAgainResponse.as_str(),
            "play-again-response"
        );
        assert_eq!(
            MessageKind::RequestGameState.as_str(),
            "request-game-state"
        );
        assert_eq!(MessageKind::RoomCreated.as_str(), "room-created");
    }

    #[test]
    fn test_kind_parse_roundtrips_all_names() {
        for kind in MessageKind::ALL {
            assert_eq!(MessageKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(MessageKind::parse("chat-message"), None);
    }

    #[test]
    fn test_kind_names_are_disjoint() {
        // All five game types plus the lifecycle announcement share one
        // channel; any collision would cross-wire the handlers.
        let mut names: Vec<&str> = MessageKind::ALL.iter().map(|k| k.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), MessageKind::ALL.len());
    }

    #[test]
    fn test_board_update_json_shape() {
        let payload = BoardUpdate {
            board: small_board(),
            current_player: Player::White,
            last_move: Some(Position::new(0, 0)),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "board": [[1, 0, 0], [0, 2, 0], [0, 0, 0]],
                "currentPlayer": 2,
                "lastMove": { "row": 0, "col": 0 },
            })
        );
    }

    #[test]
    fn test_board_update_snapshot_may_carry_null_last_move() {
        let payload = BoardUpdate {
            board: Board::empty(3),
            current_player: Player::Black,
            last_move: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["currentPlayer"], 1);
        assert!(json["lastMove"].is_null());
    }

    #[test]
    fn test_game_over_win_json_shape() {
        let payload = GameOverNotice {
            winner: Winner::Black,
            winning_cells: vec![Position::new(7, 7), Position::new(7, 8)],
            last_move: Some(Position::new(7, 8)),
            board: Some(small_board()),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["winner"], 1);
        assert_eq!(json["winningCells"][1], serde_json::json!({ "row": 7, "col": 8 }));
        assert_eq!(json["lastMove"]["col"], 8);
        assert_eq!(json["board"][0][0], 1);
    }

    #[test]
    fn test_game_over_surrender_omits_board_and_last_move() {
        let payload = GameOverNotice {
            winner: Winner::White,
            winning_cells: vec![],
            last_move: None,
            board: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj["winner"], 2);
        assert_eq!(obj["winningCells"], serde_json::json!([]));
        assert!(!obj.contains_key("lastMove"));
        assert!(!obj.contains_key("board"));
    }

    #[test]
    fn test_game_over_draw_uses_zero_winner() {
        let payload = GameOverNotice {
            winner: Winner::Draw,
            winning_cells: vec![],
            last_move: Some(Position::new(2, 2)),
            board: Some(small_board()),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["winner"], 0);
    }

    #[test]
    fn test_play_again_request_json_shape() {
        let payload = PlayAgainRequest {
            requester_id: ClientId::new("abc123"),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({ "requesterId": "abc123" }));
    }

    #[test]
    fn test_play_again_response_json_shape() {
        let payload = PlayAgainResponse {
            accepted: true,
            responder_id: ClientId::new("def456"),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "accepted": true, "responderId": "def456" })
        );
    }

    #[test]
    fn test_request_game_state_json_shape() {
        let payload = GameStateRequest {
            requester_id: ClientId::new("watcher"),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({ "requesterId": "watcher" }));
    }

    #[test]
    fn test_room_created_json_shape() {
        let payload = RoomCreated {
            room_id: RoomCode::new("AB12CD"),
            host_id: ClientId::new("host"),
            role: Role::PlayerBlack,
            timestamp: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "roomId": "AB12CD",
                "hostId": "host",
                "role": "PLAYER_BLACK",
                "timestamp": 1_700_000_000_000u64,
            })
        );
    }

    #[test]
    fn test_game_message_encode_decode_roundtrip() {
        let codec = JsonCodec;
        let message = GameMessage::BoardUpdate(BoardUpdate {
            board: small_board(),
            current_player: Player::White,
            last_move: Some(Position::new(1, 1)),
        });
        let bytes = message.encode(&codec).unwrap();
        let decoded = GameMessage::decode(&codec, MessageKind::BoardUpdate, &bytes).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_game_message_decode_garbage_fails() {
        let codec = JsonCodec;
        let result = GameMessage::decode(&codec, MessageKind::GameOver, b"not json at all");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_game_message_decode_wrong_payload_fails() {
        // A play-again body is not a board update.
        let codec = JsonCodec;
        let bytes = codec
            .encode(&PlayAgainRequest {
                requester_id: ClientId::new("abc"),
            })
            .unwrap();
        let result = GameMessage::decode(&codec, MessageKind::BoardUpdate, &bytes);
        assert!(result.is_err());
    }

    #[test]
    fn test_game_message_kind_matches_variant() {
        let message = GameMessage::RequestGameState(GameStateRequest {
            requester_id: ClientId::new("abc"),
        });
        assert_eq!(message.kind(), MessageKind::RequestGameState);
    }
}

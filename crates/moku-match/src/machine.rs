//! The per-peer match state machine.

use moku_protocol::{
    BoardUpdate, GameMessage, GameOverNotice, PlayAgainRequest, PlayAgainResponse, Role, Winner,
};
use moku_rules::{check_draw, check_win, Cell, Position};
use moku_transport::ClientId;

use crate::{GameState, MatchConfig, MatchError, Phase, RematchVote};

// ---------------------------------------------------------------------------
// Effect
// ---------------------------------------------------------------------------

/// What the surrounding client should do after a remote message was applied.
///
/// The machine itself never touches the transport; it hands these back so
/// the caller can publish, surface events, or tear the room down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// The board, turn, or last move changed.
    BoardChanged,

    /// The game ended with a win, draw, or surrender.
    GameEnded {
        winner: Winner,
        winning_cells: Vec<Position>,
    },

    /// A peer asked for a rematch and is waiting for an answer.
    RematchPrompted { requester: ClientId },

    /// The rematch was accepted; the machine reset and this peer now
    /// holds `role`.
    RematchAccepted { role: Role },

    /// The rematch was declined. Pending votes are cleared; the board
    /// keeps its final position.
    RematchDeclined,

    /// This peer declined a rematch and should leave the room.
    ExitRoom,

    /// A peer asked for the current state; publish this snapshot.
    PublishSnapshot(GameMessage),
}

// ---------------------------------------------------------------------------
// MatchMachine
// ---------------------------------------------------------------------------

/// One peer's view of a match.
///
/// Local actions validate against this replica and return the message to
/// publish; nothing is sent by the machine itself. Remote messages come
/// back through [`apply_remote`], including the echo of this peer's own
/// publishes, and are applied wholesale without re-validation. The two
/// paths meet in the middle: a local move is applied optimistically and
/// its echo re-applies the same values, so delivery order per sender is
/// all that convergence needs.
///
/// [`apply_remote`]: MatchMachine::apply_remote
#[derive(Debug, Clone)]
pub struct MatchMachine {
    client_id: ClientId,
    role: Role,
    config: MatchConfig,
    phase: Phase,
    state: GameState,
    vote: RematchVote,
}

impl MatchMachine {
    /// A machine for one peer, starting alone in the waiting phase.
    pub fn new(client_id: ClientId, role: Role, config: MatchConfig) -> Self {
        Self {
            state: GameState::new(config.board_size),
            vote: RematchVote::default(),
            phase: Phase::Waiting,
            client_id,
            role,
            config,
        }
    }

    /// This peer's transport identity.
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// This peer's current role. Changes only when a rematch swaps colours.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The match configuration the machine was built with.
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Where the match is in its lifecycle.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The replicated game state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Pending rematch votes.
    pub fn vote(&self) -> &RematchVote {
        &self.vote
    }

    /// The current board as a board-update message, for snapshot replies.
    pub fn snapshot_message(&self) -> GameMessage {
        GameMessage::BoardUpdate(BoardUpdate {
            board: self.state.board.clone(),
            current_player: self.state.current_player,
            last_move: self.state.last_move,
        })
    }

    /// Marks the match active once a second player is present.
    ///
    /// A finished game stays finished; only the waiting phase is lifted.
    pub fn activate(&mut self) {
        if self.phase == Phase::Waiting {
            self.phase = Phase::Active;
        }
    }

    /// Returns the match to a fresh waiting state after the opponent left.
    pub fn reset_for_waiting(&mut self) {
        self.state = GameState::new(self.config.board_size);
        self.vote.reset();
        self.phase = Phase::Waiting;
    }

    /// Places a stone for this peer and returns the message to publish.
    ///
    /// The move is applied locally before anything is sent; the published
    /// message carries the whole board, so the echo and every peer arrive
    /// at the same state this replica already holds.
    pub fn place_stone(&mut self, pos: Position) -> Result<GameMessage, MatchError> {
        let Some(me) = self.role.player() else {
            return Err(MatchError::NotAPlayer);
        };
        match self.phase {
            Phase::Waiting => return Err(MatchError::WaitingForOpponent),
            Phase::GameOver => return Err(MatchError::GameAlreadyOver),
            Phase::Active => {}
        }
        if !self.state.board.in_bounds(pos) {
            return Err(MatchError::OutOfBounds(pos));
        }
        if self.state.board.get(pos) != Cell::Empty {
            return Err(MatchError::CellOccupied(pos));
        }
        if self.state.current_player != me {
            return Err(MatchError::NotYourTurn);
        }

        self.state.board.set(pos, me.cell());
        self.state.last_move = Some(pos);

        let result = check_win(&self.state.board, pos, me, self.config.rules);
        if result.is_win {
            return Ok(self.finish(me.into(), result.winning_cells, Some(pos)));
        }
        if check_draw(&self.state.board) {
            return Ok(self.finish(Winner::Draw, Vec::new(), Some(pos)));
        }

        self.state.current_player = me.other();
        Ok(GameMessage::BoardUpdate(BoardUpdate {
            board: self.state.board.clone(),
            current_player: self.state.current_player,
            last_move: Some(pos),
        }))
    }

    /// Concedes the game, awarding the win to the opponent.
    ///
    /// Nothing is applied locally: the returned message carries no board
    /// and no winning run, and this replica records the result when its
    /// own echo comes back through [`apply_remote`], the same way every
    /// other peer does.
    ///
    /// [`apply_remote`]: MatchMachine::apply_remote
    pub fn surrender(&self) -> Result<GameMessage, MatchError> {
        let Some(me) = self.role.player() else {
            return Err(MatchError::NotAPlayer);
        };
        match self.phase {
            Phase::Waiting => return Err(MatchError::WaitingForOpponent),
            Phase::GameOver => return Err(MatchError::GameAlreadyOver),
            Phase::Active => {}
        }
        Ok(GameMessage::GameOver(GameOverNotice {
            winner: me.other().into(),
            winning_cells: Vec::new(),
            last_move: None,
            board: None,
        }))
    }

    /// Asks the opponent for a rematch once the game has ended.
    pub fn request_rematch(&mut self) -> Result<GameMessage, MatchError> {
        if !self.role.is_player() {
            return Err(MatchError::NotAPlayer);
        }
        if self.phase != Phase::GameOver {
            return Err(MatchError::GameNotOver);
        }
        self.vote.record_mine();
        Ok(GameMessage::PlayAgainRequest(PlayAgainRequest {
            requester_id: self.client_id.clone(),
        }))
    }

    /// Answers a pending rematch request.
    ///
    /// Only the message is produced here; the reset (on accept) or the
    /// exit (on decline) happens when the response echoes back, so the
    /// responder goes through the same transition as everyone else.
    pub fn respond_rematch(&mut self, accepted: bool) -> Result<GameMessage, MatchError> {
        if !self.role.is_player() {
            return Err(MatchError::NotAPlayer);
        }
        if self.vote.take_peer().is_none() {
            return Err(MatchError::NoPendingRequest);
        }
        Ok(GameMessage::PlayAgainResponse(PlayAgainResponse {
            accepted,
            responder_id: self.client_id.clone(),
        }))
    }

    /// Folds one channel message into the replica.
    ///
    /// Applying the same message twice leaves the state unchanged, which
    /// is what makes the optimistic local apply plus echo safe.
    pub fn apply_remote(&mut self, message: GameMessage) -> Vec<Effect> {
        match message {
            GameMessage::BoardUpdate(update) => {
                self.state.board = update.board;
                self.state.current_player = update.current_player;
                self.state.last_move = update.last_move;
                vec![Effect::BoardChanged]
            }
            GameMessage::GameOver(notice) => {
                self.state.winner = Some(notice.winner);
                self.state.winning_cells = notice.winning_cells.clone();
                self.state.game_over = true;
                self.state.last_move = notice.last_move;
                if let Some(board) = notice.board {
                    self.state.board = board;
                }
                self.phase = Phase::GameOver;
                vec![Effect::GameEnded {
                    winner: notice.winner,
                    winning_cells: notice.winning_cells,
                }]
            }
            GameMessage::PlayAgainRequest(request) => {
                if request.requester_id == self.client_id {
                    return Vec::new();
                }
                self.vote.record_peer(request.requester_id.clone());
                vec![Effect::RematchPrompted {
                    requester: request.requester_id,
                }]
            }
            GameMessage::PlayAgainResponse(response) => {
                if response.accepted {
                    // Colours swap every rematch; spectators stay put.
                    self.role = self.role.swapped();
                    self.state = GameState::new(self.config.board_size);
                    self.vote.reset();
                    self.phase = Phase::Active;
                    vec![Effect::RematchAccepted { role: self.role }]
                } else if response.responder_id == self.client_id {
                    self.vote.reset();
                    vec![Effect::ExitRoom]
                } else {
                    self.vote.reset();
                    vec![Effect::RematchDeclined]
                }
            }
            GameMessage::RequestGameState(request) => {
                if request.requester_id == self.client_id {
                    return Vec::new();
                }
                vec![Effect::PublishSnapshot(self.snapshot_message())]
            }
            // Room announcements are consumed by the lobby, not the match.
            GameMessage::RoomCreated(_) => Vec::new(),
        }
    }

    fn finish(
        &mut self,
        winner: Winner,
        winning_cells: Vec<Position>,
        last_move: Option<Position>,
    ) -> GameMessage {
        self.phase = Phase::GameOver;
        self.state.winner = Some(winner);
        self.state.winning_cells = winning_cells.clone();
        self.state.game_over = true;
        GameMessage::GameOver(GameOverNotice {
            winner,
            winning_cells,
            last_move,
            board: Some(self.state.board.clone()),
        })
    }
}

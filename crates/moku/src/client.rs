//! Match client actor: a Tokio task that owns one peer's room membership.
//!
//! Each client runs in its own task, holding the attached channel, the
//! match machine, and the subscriptions. The application talks to it
//! through a cloneable [`MatchHandle`] and listens on an [`EventStream`];
//! the actor folds commands, channel messages, and presence changes into
//! one loop, so nothing else ever touches the shared state.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use moku_match::{Effect, GameState, MatchConfig, MatchError, MatchMachine, Phase};
use moku_protocol::{
    Codec, GameMessage, GameStateRequest, MessageKind, PresenceData, Role, RoomCode,
};
use moku_room::{
    ConfirmPolicy, Occupancy, RoomDirectory, RoomEntry, RoomError, cleanup_room, create_room,
    join_room, publish, sample_occupancy,
};
use moku_rules::Position;
use moku_session::RoleStore;
use moku_transport::{
    Channel, ChannelMessage, ClientId, MessageStream, Presence, PresenceStream, Transport,
};

use crate::{CloseReason, MatchEvent, MokuError};

/// Command channel depth; callers wait when the actor falls behind.
const DEFAULT_COMMAND_BUFFER: usize = 64;

/// Stream of [`MatchEvent`]s for the application to render.
///
/// Ends (returns `None`) once the actor has exited; every deliberate exit
/// is preceded by a [`MatchEvent::RoomClosed`].
pub type EventStream = mpsc::UnboundedReceiver<MatchEvent>;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Commands sent to a match client actor through its channel.
///
/// The `oneshot::Sender` in each variant is the reply channel — the
/// handle sends a command and waits for the answer on it.
pub(crate) enum MatchCommand {
    /// Place a stone for this peer's color.
    PlaceStone {
        pos: Position,
        reply: oneshot::Sender<Result<(), MokuError>>,
    },

    /// Concede the game to the opponent.
    Surrender {
        reply: oneshot::Sender<Result<(), MokuError>>,
    },

    /// Ask the opponent for a rematch.
    RequestRematch {
        reply: oneshot::Sender<Result<(), MokuError>>,
    },

    /// Answer a pending rematch request.
    RespondRematch {
        accepted: bool,
        reply: oneshot::Sender<Result<(), MokuError>>,
    },

    /// Request a copy of the current game state.
    Snapshot { reply: oneshot::Sender<GameState> },

    /// Request the client metadata.
    Info { reply: oneshot::Sender<MatchInfo> },

    /// Leave the room and shut the actor down.
    Leave { reply: oneshot::Sender<()> },
}

/// A snapshot of client metadata (not the game state itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchInfo {
    /// The room this client is in.
    pub room_code: RoomCode,
    /// This peer's transport identity.
    pub client_id: ClientId,
    /// This peer's current role. Changes when a rematch swaps colors.
    pub role: Role,
    /// Where the match is in its lifecycle.
    pub phase: Phase,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Handle to a running match client. Used to send commands to it.
///
/// Cheap to clone — it's an `mpsc::Sender` wrapper. Game actions resolve
/// once the action has been applied locally and published; the resulting
/// events arrive on the [`EventStream`] when the echo comes back.
#[derive(Clone)]
pub struct MatchHandle {
    room_code: RoomCode,
    sender: mpsc::Sender<MatchCommand>,
}

impl MatchHandle {
    /// The code of the room this client is in.
    pub fn room_code(&self) -> &RoomCode {
        &self.room_code
    }

    /// Places a stone at `pos` for this peer's color.
    pub async fn place_stone(&self, pos: Position) -> Result<(), MokuError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchCommand::PlaceStone {
                pos,
                reply: reply_tx,
            })
            .await
            .map_err(|_| MokuError::ClientClosed)?;
        reply_rx.await.map_err(|_| MokuError::ClientClosed)?
    }

    /// Concedes the game; the opponent wins.
    pub async fn surrender(&self) -> Result<(), MokuError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchCommand::Surrender { reply: reply_tx })
            .await
            .map_err(|_| MokuError::ClientClosed)?;
        reply_rx.await.map_err(|_| MokuError::ClientClosed)?
    }

    /// Asks the opponent for a rematch once the game is over.
    pub async fn request_rematch(&self) -> Result<(), MokuError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchCommand::RequestRematch { reply: reply_tx })
            .await
            .map_err(|_| MokuError::ClientClosed)?;
        reply_rx.await.map_err(|_| MokuError::ClientClosed)?
    }

    /// Answers a pending rematch request. Accepting resets the board and
    /// swaps colors; declining also makes this client leave the room.
    pub async fn respond_rematch(&self, accepted: bool) -> Result<(), MokuError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchCommand::RespondRematch {
                accepted,
                reply: reply_tx,
            })
            .await
            .map_err(|_| MokuError::ClientClosed)?;
        reply_rx.await.map_err(|_| MokuError::ClientClosed)?
    }

    /// A copy of the current game state.
    pub async fn game_state(&self) -> Result<GameState, MokuError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| MokuError::ClientClosed)?;
        reply_rx.await.map_err(|_| MokuError::ClientClosed)
    }

    /// The client metadata: room, identity, role, phase.
    pub async fn info(&self) -> Result<MatchInfo, MokuError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchCommand::Info { reply: reply_tx })
            .await
            .map_err(|_| MokuError::ClientClosed)?;
        reply_rx.await.map_err(|_| MokuError::ClientClosed)
    }

    /// Leaves the room: presence, stored role, and directory entry are
    /// cleaned up before this resolves. The actor exits afterwards.
    pub async fn leave(&self) -> Result<(), MokuError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchCommand::Leave { reply: reply_tx })
            .await
            .map_err(|_| MokuError::ClientClosed)?;
        reply_rx.await.map_err(|_| MokuError::ClientClosed)
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// The internal client actor state. Runs inside a Tokio task.
struct MatchActor<Ch, D, S, C> {
    code: RoomCode,
    machine: MatchMachine,
    channel: Ch,
    directory: D,
    store: S,
    codec: C,
    policy: ConfirmPolicy,
    commands: mpsc::Receiver<MatchCommand>,
    events: mpsc::UnboundedSender<MatchEvent>,
    messages: MessageStream,
    presence_events: PresenceStream,
    /// Player count at the previous reconciliation; `None` before the
    /// first one. Guards the waiting/active transitions so repeated
    /// presence samples don't repeat events.
    last_players: Option<usize>,
}

impl<Ch, D, S, C> MatchActor<Ch, D, S, C>
where
    Ch: Channel,
    D: RoomDirectory,
    S: RoleStore,
    C: Codec,
{
    /// Runs the actor loop until the client leaves or the room dies.
    async fn run(mut self) {
        info!(room_code = %self.code, role = %self.machine.role(), "match client started");
        self.run_inner().await;
        info!(room_code = %self.code, "match client stopped");
    }

    async fn run_inner(&mut self) {
        // Take stock before reacting to anything: the room may already be
        // dead, and a lone creator should hear WaitingForOpponent first.
        if self.reconcile_occupancy().await {
            return;
        }
        if self.machine.role() == Role::Spectator {
            self.request_game_state().await;
        }

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        // Every handle dropped; treat it as leaving.
                        self.close(CloseReason::Left).await;
                        return;
                    };
                    if self.handle_command(command).await {
                        return;
                    }
                }
                message = self.messages.recv() => {
                    let Some(message) = message else {
                        warn!(room_code = %self.code, "message stream ended, shutting down");
                        return;
                    };
                    if self.handle_channel_message(message).await {
                        return;
                    }
                }
                event = self.presence_events.recv() => {
                    let Some(event) = event else {
                        warn!(room_code = %self.code, "presence stream ended, shutting down");
                        return;
                    };
                    debug!(
                        room_code = %self.code,
                        action = ?event.action,
                        member = %event.member.client_id,
                        "presence changed"
                    );
                    if self.reconcile_occupancy().await {
                        return;
                    }
                }
            }
        }
    }

    /// Handles one command. Returns `true` when the actor should exit.
    async fn handle_command(&mut self, command: MatchCommand) -> bool {
        match command {
            MatchCommand::PlaceStone { pos, reply } => {
                let result = self.perform(|machine| machine.place_stone(pos)).await;
                let _ = reply.send(result);
            }
            MatchCommand::Surrender { reply } => {
                let result = self.perform(|machine| machine.surrender()).await;
                let _ = reply.send(result);
            }
            MatchCommand::RequestRematch { reply } => {
                let result = self.perform(|machine| machine.request_rematch()).await;
                let _ = reply.send(result);
            }
            MatchCommand::RespondRematch { accepted, reply } => {
                let result = self
                    .perform(|machine| machine.respond_rematch(accepted))
                    .await;
                let _ = reply.send(result);
            }
            MatchCommand::Snapshot { reply } => {
                let _ = reply.send(self.machine.state().clone());
            }
            MatchCommand::Info { reply } => {
                let _ = reply.send(self.info());
            }
            MatchCommand::Leave { reply } => {
                self.close(CloseReason::Left).await;
                let _ = reply.send(());
                return true;
            }
        }
        false
    }

    /// Validates a local action against the machine and publishes the
    /// resulting message. The echo, not this call, produces the events.
    async fn perform(
        &mut self,
        action: impl FnOnce(&mut MatchMachine) -> Result<GameMessage, MatchError>,
    ) -> Result<(), MokuError> {
        let message = action(&mut self.machine)?;
        publish(&self.channel, &self.codec, &message).await?;
        Ok(())
    }

    /// Decodes and applies one channel message. Returns `true` when the
    /// actor should exit.
    async fn handle_channel_message(&mut self, message: ChannelMessage) -> bool {
        let Some(kind) = MessageKind::parse(&message.kind) else {
            debug!(room_code = %self.code, kind = %message.kind, "unknown message kind, skipping");
            return false;
        };
        let decoded = match GameMessage::decode(&self.codec, kind, &message.data) {
            Ok(decoded) => decoded,
            Err(error) => {
                warn!(room_code = %self.code, %kind, %error, "undecodable message, skipping");
                return false;
            }
        };

        for effect in self.machine.apply_remote(decoded) {
            if self.apply_effect(effect).await {
                return true;
            }
        }
        false
    }

    /// Carries out one effect from the machine. Returns `true` when the
    /// actor should exit.
    async fn apply_effect(&mut self, effect: Effect) -> bool {
        match effect {
            Effect::BoardChanged => {
                self.emit(MatchEvent::BoardUpdated(self.machine.state().clone()));
            }
            Effect::GameEnded {
                winner,
                winning_cells,
            } => {
                info!(room_code = %self.code, %winner, "game ended");
                self.emit(MatchEvent::GameEnded {
                    winner,
                    winning_cells,
                });
            }
            Effect::RematchPrompted { requester } => {
                self.emit(MatchEvent::RematchRequested { requester });
            }
            Effect::RematchAccepted { role } => {
                self.adopt_role(role).await;
                self.emit(MatchEvent::RematchAccepted { role });
            }
            Effect::RematchDeclined => {
                self.emit(MatchEvent::RematchDeclined);
            }
            Effect::ExitRoom => {
                self.close(CloseReason::RematchDeclined).await;
                return true;
            }
            Effect::PublishSnapshot(message) => {
                if let Err(error) = publish(&self.channel, &self.codec, &message).await {
                    warn!(room_code = %self.code, %error, "failed to publish state snapshot");
                }
            }
        }
        false
    }

    /// Persists a role change and re-declares it in presence, so later
    /// occupancy samples see the new seat assignment.
    async fn adopt_role(&mut self, role: Role) {
        if let Err(error) = self.store.save(&self.code, role).await {
            warn!(room_code = %self.code, %error, "failed to persist swapped role");
        }
        match self.codec.encode(&PresenceData::new(role)) {
            Ok(data) => {
                if let Err(error) = self.channel.presence().enter(&data).await {
                    warn!(room_code = %self.code, %error, "failed to update presence role");
                }
            }
            Err(error) => {
                warn!(room_code = %self.code, %error, "failed to encode presence data");
            }
        }
    }

    /// Re-reads presence and reacts to a changed player count.
    ///
    /// An empty-looking room is re-sampled once after the settle interval
    /// before it counts as abandoned. Returns `true` when the room is
    /// abandoned and the actor should exit; sampling errors are logged
    /// and change nothing.
    async fn reconcile_occupancy(&mut self) -> bool {
        let presence = self.channel.presence();
        let sampled = self
            .policy
            .confirm(
                || sample_occupancy(&presence, &self.codec),
                |occupancy: &Occupancy| occupancy.is_abandoned(),
            )
            .await;
        let occupancy = match sampled {
            Ok(occupancy) => occupancy,
            Err(error) => {
                warn!(room_code = %self.code, %error, "failed to sample presence");
                return false;
            }
        };

        if occupancy.is_abandoned() {
            info!(room_code = %self.code, "no players left, closing room");
            self.close(CloseReason::Abandoned).await;
            return true;
        }

        if occupancy.is_waiting() {
            if self.last_players != Some(1) {
                self.machine.reset_for_waiting();
                self.emit(MatchEvent::WaitingForOpponent);
            }
        } else if !matches!(self.last_players, Some(n) if n >= 2) {
            self.machine.activate();
            self.emit(MatchEvent::RoomActive);
        }
        self.last_players = Some(occupancy.player_count());
        false
    }

    /// Asks the room to republish its current state. Used by spectators,
    /// who join without a replica of the game so far.
    async fn request_game_state(&self) {
        let message = GameMessage::RequestGameState(GameStateRequest {
            requester_id: self.machine.client_id().clone(),
        });
        if let Err(error) = publish(&self.channel, &self.codec, &message).await {
            warn!(room_code = %self.code, %error, "failed to request game state");
        }
    }

    /// Tears the room membership down and reports it. The actor must
    /// exit right after.
    async fn close(&mut self, reason: CloseReason) {
        cleanup_room(&self.channel, &self.store, &self.directory, &self.code).await;
        if let Err(error) = self.channel.detach().await {
            warn!(room_code = %self.code, %error, "failed to detach channel");
        }
        self.emit(MatchEvent::RoomClosed { reason });
    }

    fn emit(&self, event: MatchEvent) {
        // A dropped event stream just means nobody is watching.
        let _ = self.events.send(event);
    }

    fn info(&self) -> MatchInfo {
        MatchInfo {
            room_code: self.code.clone(),
            client_id: self.machine.client_id().clone(),
            role: self.machine.role(),
            phase: self.machine.phase(),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Creates a fresh room and spawns a client actor driving it.
///
/// The creator plays black. The first event on the stream is
/// [`MatchEvent::WaitingForOpponent`]; share [`MatchHandle::room_code`]
/// so an opponent can [`join_match`].
pub async fn create_match<T, D, S, C>(
    transport: &T,
    directory: D,
    store: S,
    codec: C,
    policy: ConfirmPolicy,
    config: MatchConfig,
) -> Result<(MatchHandle, EventStream), MokuError>
where
    T: Transport,
    D: RoomDirectory,
    S: RoleStore,
    C: Codec,
{
    let entry = create_room(transport, &directory, &store, &codec, &policy).await?;
    spawn_match(
        transport.client_id().clone(),
        entry,
        directory,
        store,
        codec,
        policy,
        config,
    )
    .await
}

/// Joins an existing room as `role` and spawns a client actor driving it.
///
/// Player roles are first-come-first-served: if the seat is already held,
/// this fails with [`RoomError::SlotTaken`] and nothing is joined. Any
/// number of spectators may join; they are sent the current game state by
/// whoever is present.
pub async fn join_match<T, D, S, C>(
    transport: &T,
    directory: D,
    store: S,
    codec: C,
    policy: ConfirmPolicy,
    config: MatchConfig,
    code: RoomCode,
    role: Role,
) -> Result<(MatchHandle, EventStream), MokuError>
where
    T: Transport,
    D: RoomDirectory,
    S: RoleStore,
    C: Codec,
{
    let entry = join_room(transport, &store, &codec, &policy, code, role).await?;
    spawn_match(
        transport.client_id().clone(),
        entry,
        directory,
        store,
        codec,
        policy,
        config,
    )
    .await
}

/// Subscribes to the entered room and spawns the actor task.
async fn spawn_match<Ch, D, S, C>(
    client_id: ClientId,
    entry: RoomEntry<Ch>,
    directory: D,
    store: S,
    codec: C,
    policy: ConfirmPolicy,
    config: MatchConfig,
) -> Result<(MatchHandle, EventStream), MokuError>
where
    Ch: Channel,
    D: RoomDirectory,
    S: RoleStore,
    C: Codec,
{
    let RoomEntry {
        code,
        role,
        channel,
    } = entry;
    let messages = channel.subscribe().await.map_err(RoomError::transport)?;
    let presence_events = channel
        .presence()
        .subscribe()
        .await
        .map_err(RoomError::transport)?;

    let (command_tx, command_rx) = mpsc::channel(DEFAULT_COMMAND_BUFFER);
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let actor = MatchActor {
        code: code.clone(),
        machine: MatchMachine::new(client_id, role, config),
        channel,
        directory,
        store,
        codec,
        policy,
        commands: command_rx,
        events: event_tx,
        messages,
        presence_events,
        last_players: None,
    };
    tokio::spawn(actor.run());

    Ok((
        MatchHandle {
            room_code: code,
            sender: command_tx,
        },
        event_rx,
    ))
}

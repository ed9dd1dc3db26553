//! Entering and leaving rooms.

use std::time::{SystemTime, UNIX_EPOCH};

use moku_protocol::{Codec, GameMessage, NewRoom, PresenceData, Role, RoomCode, RoomCreated};
use moku_session::RoleStore;
use moku_transport::{Channel, Presence, Transport};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::confirm::ConfirmPolicy;
use crate::directory::RoomDirectory;
use crate::error::RoomError;
use crate::presence::{Occupancy, sample_occupancy};

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LEN: usize = 6;
const CODE_ATTEMPTS: usize = 8;

/// The channel a room lives on.
pub fn channel_name(code: &RoomCode) -> String {
    format!("game:{code}")
}

/// A random shareable room code, 6 chars of A-Z and 0-9.
pub fn generate_room_code() -> RoomCode {
    let mut rng = rand::rng();
    let code: String = (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    RoomCode::new(code)
}

/// Generates a room code that is not yet in the directory.
///
/// Collisions trigger a fresh draw; after a bounded number of attempts
/// the allocation gives up rather than looping forever.
pub async fn allocate_room_code<D: RoomDirectory>(directory: &D) -> Result<RoomCode, RoomError> {
    for _ in 0..CODE_ATTEMPTS {
        let code = generate_room_code();
        match directory.get(&code).await.map_err(RoomError::directory)? {
            None => return Ok(code),
            Some(_) => debug!(room_code = %code, "room code collision, regenerating"),
        }
    }
    Err(RoomError::CodeSpaceExhausted(CODE_ATTEMPTS))
}

/// Milliseconds since the Unix epoch, for announcement timestamps.
fn unix_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Encodes and publishes one message under its reserved kind.
pub async fn publish<Ch, C>(channel: &Ch, codec: &C, message: &GameMessage) -> Result<(), RoomError>
where
    Ch: Channel,
    C: Codec,
{
    let data = message.encode(codec)?;
    channel
        .publish(message.kind().as_str(), &data)
        .await
        .map_err(RoomError::transport)
}

/// An entered room: the attached channel plus what this peer is in it.
#[derive(Debug)]
pub struct RoomEntry<Ch> {
    pub code: RoomCode,
    pub role: Role,
    pub channel: Ch,
}

/// Creates a fresh room and enters it as the black player.
///
/// Allocates a collision-checked code, persists the creator's role,
/// attaches the channel and enters presence, waits one settle interval
/// for the entry to propagate, registers the room in the directory, and
/// announces it with a `room-created` message.
pub async fn create_room<T, D, S, C>(
    transport: &T,
    directory: &D,
    store: &S,
    codec: &C,
    policy: &ConfirmPolicy,
) -> Result<RoomEntry<T::Channel>, RoomError>
where
    T: Transport,
    D: RoomDirectory,
    S: RoleStore,
    C: Codec,
{
    let code = allocate_room_code(directory).await?;
    let role = Role::PlayerBlack;
    store.save(&code, role).await.map_err(RoomError::store)?;

    let channel = transport
        .channel(&channel_name(&code))
        .await
        .map_err(RoomError::transport)?;
    channel.attach().await.map_err(RoomError::transport)?;
    let data = codec.encode(&PresenceData::new(role))?;
    channel
        .presence()
        .enter(&data)
        .await
        .map_err(RoomError::transport)?;

    // Let the presence entry propagate before the room becomes findable.
    policy.wait().await;

    directory
        .create(NewRoom {
            room_name: code.to_string(),
            host_client_id: transport.client_id().clone(),
        })
        .await
        .map_err(RoomError::directory)?;

    publish(
        &channel,
        codec,
        &GameMessage::RoomCreated(RoomCreated {
            room_id: code.clone(),
            host_id: transport.client_id().clone(),
            role,
            timestamp: unix_timestamp_ms(),
        }),
    )
    .await?;

    info!(room_code = %code, "room created");
    Ok(RoomEntry {
        code,
        role,
        channel,
    })
}

/// Joins an existing room in the given role.
///
/// Player seats are claimed against live presence: if the seat looks
/// taken, the claim is re-checked once after a settle interval before it
/// is rejected with [`RoomError::SlotTaken`], so one stale read cannot
/// turn a joiner away. Spectators are never rejected. On success the role
/// is persisted and presence entered.
pub async fn join_room<T, S, C>(
    transport: &T,
    store: &S,
    codec: &C,
    policy: &ConfirmPolicy,
    code: RoomCode,
    role: Role,
) -> Result<RoomEntry<T::Channel>, RoomError>
where
    T: Transport,
    S: RoleStore,
    C: Codec,
{
    let channel = transport
        .channel(&channel_name(&code))
        .await
        .map_err(RoomError::transport)?;
    channel.attach().await.map_err(RoomError::transport)?;

    if let Some(seat) = role.player() {
        let presence = channel.presence();
        let occupancy = policy
            .confirm(
                || sample_occupancy(&presence, codec),
                |occupancy: &Occupancy| occupancy.seat_taken(seat),
            )
            .await
            .map_err(RoomError::transport)?;
        if occupancy.seat_taken(seat) {
            channel.detach().await.map_err(RoomError::transport)?;
            return Err(RoomError::SlotTaken(seat));
        }
    }

    store.save(&code, role).await.map_err(RoomError::store)?;
    let data = codec.encode(&PresenceData::new(role))?;
    channel
        .presence()
        .enter(&data)
        .await
        .map_err(RoomError::transport)?;

    info!(room_code = %code, %role, "joined room");
    Ok(RoomEntry {
        code,
        role,
        channel,
    })
}

/// Tears down this peer's stake in a room: clears the persisted role,
/// leaves presence, and deletes the directory entry.
///
/// Best-effort and idempotent — each step that fails is logged and the
/// rest still run, so a half-dead backend cannot wedge a departure.
/// Dropping subscriptions (the caller owns those) and detaching the
/// channel happen around this call, in that order.
pub async fn cleanup_room<Ch, S, D>(channel: &Ch, store: &S, directory: &D, code: &RoomCode)
where
    Ch: Channel,
    S: RoleStore,
    D: RoomDirectory,
{
    if let Err(error) = store.clear(code).await {
        warn!(room_code = %code, %error, "failed to clear stored role");
    }
    if let Err(error) = channel.presence().leave().await {
        warn!(room_code = %code, %error, "failed to leave presence");
    }
    if let Err(error) = directory.delete(code).await {
        warn!(room_code = %code, %error, "failed to delete room from directory");
    }
    info!(room_code = %code, "room cleanup finished");
}

//! Integration tests for room entry, seat claims, and cleanup over the
//! in-memory transport.

use std::time::Duration;

use moku_protocol::{
    Codec, GameMessage, JsonCodec, MessageKind, NewRoom, PresenceData, Role, RoomCode, RoomCreated,
    RoomRecord,
};
use moku_room::{
    ConfirmPolicy, MemoryDirectory, RoomDirectory, RoomError, allocate_room_code, cleanup_room,
    create_room, join_room, publish, sample_occupancy,
};
use moku_rules::Player;
use moku_session::{MemoryRoleStore, RoleStore};
use moku_transport::{Channel, ClientId, MemoryHub, Presence, Transport};

fn fast_policy() -> ConfirmPolicy {
    ConfirmPolicy::with_settle(Duration::from_millis(10))
}

#[tokio::test]
async fn test_create_room_registers_persists_and_enters() {
    let hub = MemoryHub::default();
    let directory = MemoryDirectory::default();
    let store = MemoryRoleStore::default();
    let host = hub.connect(ClientId::new("host"));

    let entry = create_room(&host, &directory, &store, &JsonCodec, &fast_policy())
        .await
        .unwrap();

    assert_eq!(entry.role, Role::PlayerBlack);
    assert_eq!(entry.channel.name(), format!("game:{}", entry.code));

    let record = directory.get(&entry.code).await.unwrap().unwrap();
    assert_eq!(record.host_client_id, ClientId::new("host"));
    assert_eq!(record.room_name, entry.code.as_str());

    assert_eq!(
        store.load(&entry.code).await.unwrap(),
        Some(Role::PlayerBlack)
    );

    let occupancy = sample_occupancy(&entry.channel.presence(), &JsonCodec)
        .await
        .unwrap();
    assert_eq!(occupancy.player_count(), 1);
    assert!(occupancy.seat_taken(Player::Black));
}

#[tokio::test]
async fn test_allocate_room_code_gives_up_when_everything_collides() {
    /// Directory where every code is always taken.
    #[derive(Debug, Clone, Default)]
    struct FullDirectory;

    impl RoomDirectory for FullDirectory {
        type Error = moku_room::DirectoryError;

        async fn create(&self, room: NewRoom) -> Result<RoomRecord, Self::Error> {
            Ok(RoomRecord {
                id: 1,
                room_name: room.room_name,
                host_client_id: room.host_client_id,
            })
        }

        async fn list(&self) -> Result<Vec<RoomRecord>, Self::Error> {
            Ok(Vec::new())
        }

        async fn get(&self, code: &RoomCode) -> Result<Option<RoomRecord>, Self::Error> {
            Ok(Some(RoomRecord {
                id: 1,
                room_name: code.to_string(),
                host_client_id: ClientId::new("someone"),
            }))
        }

        async fn delete(&self, _code: &RoomCode) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    let err = allocate_room_code(&FullDirectory).await.unwrap_err();
    assert!(matches!(err, RoomError::CodeSpaceExhausted(_)));
}

#[tokio::test]
async fn test_join_room_fills_the_second_seat() {
    let hub = MemoryHub::default();
    let directory = MemoryDirectory::default();
    let host = hub.connect(ClientId::new("host"));
    let entry = create_room(
        &host,
        &directory,
        &MemoryRoleStore::default(),
        &JsonCodec,
        &fast_policy(),
    )
    .await
    .unwrap();

    let guest = hub.connect(ClientId::new("guest"));
    let guest_store = MemoryRoleStore::default();
    let joined = join_room(
        &guest,
        &guest_store,
        &JsonCodec,
        &fast_policy(),
        entry.code.clone(),
        Role::PlayerWhite,
    )
    .await
    .unwrap();

    assert_eq!(joined.role, Role::PlayerWhite);
    assert_eq!(
        guest_store.load(&entry.code).await.unwrap(),
        Some(Role::PlayerWhite)
    );

    let occupancy = sample_occupancy(&joined.channel.presence(), &JsonCodec)
        .await
        .unwrap();
    assert!(occupancy.is_active());
}

#[tokio::test]
async fn test_join_room_rejects_taken_seat_after_resampling() {
    let hub = MemoryHub::default();
    let directory = MemoryDirectory::default();
    let host = hub.connect(ClientId::new("host"));
    let entry = create_room(
        &host,
        &directory,
        &MemoryRoleStore::default(),
        &JsonCodec,
        &fast_policy(),
    )
    .await
    .unwrap();

    let latecomer = hub.connect(ClientId::new("latecomer"));
    let err = join_room(
        &latecomer,
        &MemoryRoleStore::default(),
        &JsonCodec,
        &fast_policy(),
        entry.code.clone(),
        Role::PlayerBlack,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, RoomError::SlotTaken(Player::Black)));

    // The rejected joiner left no trace in presence.
    let occupancy = sample_occupancy(&entry.channel.presence(), &JsonCodec)
        .await
        .unwrap();
    assert_eq!(occupancy.player_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_join_room_claims_seat_freed_during_the_settle_wait() {
    let hub = MemoryHub::default();

    // A squatter holds white, then leaves while the joiner's confirm
    // sleep is pending.
    let squatter = hub.connect(ClientId::new("squatter"));
    let channel = squatter.channel("game:RETRY1").await.unwrap();
    channel.attach().await.unwrap();
    let data = JsonCodec
        .encode(&PresenceData::new(Role::PlayerWhite))
        .unwrap();
    channel.presence().enter(&data).await.unwrap();

    let leaver = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        channel.presence().leave().await.unwrap();
    });

    let joiner = hub.connect(ClientId::new("joiner"));
    let joined = join_room(
        &joiner,
        &MemoryRoleStore::default(),
        &JsonCodec,
        &ConfirmPolicy::default(),
        RoomCode::new("RETRY1"),
        Role::PlayerWhite,
    )
    .await
    .unwrap();

    assert_eq!(joined.role, Role::PlayerWhite);
    leaver.await.unwrap();
}

#[tokio::test]
async fn test_join_room_never_rejects_spectators() {
    let hub = MemoryHub::default();
    let directory = MemoryDirectory::default();
    let host = hub.connect(ClientId::new("host"));
    let entry = create_room(
        &host,
        &directory,
        &MemoryRoleStore::default(),
        &JsonCodec,
        &fast_policy(),
    )
    .await
    .unwrap();

    let guest = hub.connect(ClientId::new("guest"));
    join_room(
        &guest,
        &MemoryRoleStore::default(),
        &JsonCodec,
        &fast_policy(),
        entry.code.clone(),
        Role::PlayerWhite,
    )
    .await
    .unwrap();

    // Both seats taken; watchers still get in.
    let watcher = hub.connect(ClientId::new("watcher"));
    let joined = join_room(
        &watcher,
        &MemoryRoleStore::default(),
        &JsonCodec,
        &fast_policy(),
        entry.code.clone(),
        Role::Spectator,
    )
    .await
    .unwrap();

    let occupancy = sample_occupancy(&joined.channel.presence(), &JsonCodec)
        .await
        .unwrap();
    assert_eq!(occupancy.player_count(), 2);
    assert_eq!(occupancy.spectators, 1);
}

#[tokio::test]
async fn test_cleanup_room_is_idempotent_and_leaves_nothing_behind() {
    let hub = MemoryHub::default();
    let directory = MemoryDirectory::default();
    let store = MemoryRoleStore::default();
    let host = hub.connect(ClientId::new("host"));
    let entry = create_room(&host, &directory, &store, &JsonCodec, &fast_policy())
        .await
        .unwrap();

    cleanup_room(&entry.channel, &store, &directory, &entry.code).await;

    assert_eq!(store.load(&entry.code).await.unwrap(), None);
    assert_eq!(directory.get(&entry.code).await.unwrap(), None);

    let observer = hub.connect(ClientId::new("observer"));
    let channel = observer
        .channel(&format!("game:{}", entry.code))
        .await
        .unwrap();
    channel.attach().await.unwrap();
    let occupancy = sample_occupancy(&channel.presence(), &JsonCodec)
        .await
        .unwrap();
    assert!(occupancy.is_abandoned());

    // Running it again is harmless.
    cleanup_room(&entry.channel, &store, &directory, &entry.code).await;
}

#[tokio::test]
async fn test_publish_tags_messages_with_their_reserved_kind() {
    let hub = MemoryHub::default();
    let announcer = hub.connect(ClientId::new("announcer"));
    let listener = hub.connect(ClientId::new("listener"));

    let listen_channel = listener.channel("game:PUB001").await.unwrap();
    listen_channel.attach().await.unwrap();
    let mut messages = listen_channel.subscribe().await.unwrap();

    let announce_channel = announcer.channel("game:PUB001").await.unwrap();
    announce_channel.attach().await.unwrap();
    let message = GameMessage::RoomCreated(RoomCreated {
        room_id: RoomCode::new("PUB001"),
        host_id: ClientId::new("announcer"),
        role: Role::PlayerBlack,
        timestamp: 1_700_000_000_000,
    });
    publish(&announce_channel, &JsonCodec, &message).await.unwrap();

    let received = messages.recv().await.unwrap();
    assert_eq!(received.kind, MessageKind::RoomCreated.as_str());
    let decoded = GameMessage::decode(&JsonCodec, MessageKind::RoomCreated, &received.data).unwrap();
    assert_eq!(decoded, message);
}

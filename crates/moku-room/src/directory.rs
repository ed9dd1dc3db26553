//! The external room directory.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use moku_protocol::{NewRoom, RoomCode, RoomRecord};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Advertising and bookkeeping for joinable rooms.
///
/// The directory is deliberately dumb: rooms are registered so they can
/// be listed and codes checked for collisions, and deleted when abandoned.
/// It is never consulted to decide who may join — presence is the only
/// source of truth for membership.
pub trait RoomDirectory: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Registers a room under its code (`room_name` carries the code).
    fn create(
        &self,
        room: NewRoom,
    ) -> impl Future<Output = Result<RoomRecord, Self::Error>> + Send;

    /// All currently registered rooms.
    fn list(&self) -> impl Future<Output = Result<Vec<RoomRecord>, Self::Error>> + Send;

    /// Looks up one room by code.
    fn get(
        &self,
        code: &RoomCode,
    ) -> impl Future<Output = Result<Option<RoomRecord>, Self::Error>> + Send;

    /// Removes a room. Deleting an absent room is not an error, so
    /// cleanup stays idempotent.
    fn delete(&self, code: &RoomCode) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

// ---------------------------------------------------------------------------
// MemoryDirectory
// ---------------------------------------------------------------------------

/// Failure modes of the in-memory directory.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// A room with this code is already registered.
    #[error("room {0} already exists")]
    Duplicate(RoomCode),
}

/// In-process [`RoomDirectory`] for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    inner: Arc<DirectoryInner>,
}

#[derive(Debug, Default)]
struct DirectoryInner {
    rooms: Mutex<HashMap<String, RoomRecord>>,
    next_id: AtomicU64,
}

impl RoomDirectory for MemoryDirectory {
    type Error = DirectoryError;

    async fn create(&self, room: NewRoom) -> Result<RoomRecord, DirectoryError> {
        let mut rooms = self.inner.rooms.lock().await;
        if rooms.contains_key(&room.room_name) {
            return Err(DirectoryError::Duplicate(RoomCode::new(room.room_name)));
        }
        let record = RoomRecord {
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            room_name: room.room_name.clone(),
            host_client_id: room.host_client_id,
        };
        rooms.insert(room.room_name, record.clone());
        debug!(room_name = %record.room_name, id = record.id, "room registered");
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<RoomRecord>, DirectoryError> {
        let rooms = self.inner.rooms.lock().await;
        let mut records: Vec<RoomRecord> = rooms.values().cloned().collect();
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    async fn get(&self, code: &RoomCode) -> Result<Option<RoomRecord>, DirectoryError> {
        let rooms = self.inner.rooms.lock().await;
        Ok(rooms.get(code.as_str()).cloned())
    }

    async fn delete(&self, code: &RoomCode) -> Result<(), DirectoryError> {
        let mut rooms = self.inner.rooms.lock().await;
        if rooms.remove(code.as_str()).is_some() {
            debug!(room_name = %code, "room deleted");
        }
        Ok(())
    }
}

//! The persisted (room → role) mapping.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use moku_protocol::{Role, RoomCode};

use crate::SessionError;

/// Where a participant's per-room role lives between operations.
///
/// One store per participant — this is local persistence, not shared
/// state. Implementations may fail (browser storage, a keyring, a file),
/// which is why every method returns a `Result`; [`MemoryRoleStore`]
/// never does.
pub trait RoleStore: Send + Sync + 'static {
    /// The role persisted for `room`, if any.
    fn load(
        &self,
        room: &RoomCode,
    ) -> impl Future<Output = Result<Option<Role>, SessionError>> + Send;

    /// Persists `role` for `room`, replacing any previous value.
    fn save(
        &self,
        room: &RoomCode,
        role: Role,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Removes the mapping for `room`. A no-op when absent.
    fn clear(&self, room: &RoomCode) -> impl Future<Output = Result<(), SessionError>> + Send;
}

/// In-process [`RoleStore`] used by tests and demos.
#[derive(Clone, Default)]
pub struct MemoryRoleStore {
    roles: Arc<Mutex<HashMap<RoomCode, Role>>>,
}

impl MemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoleStore for MemoryRoleStore {
    async fn load(&self, room: &RoomCode) -> Result<Option<Role>, SessionError> {
        Ok(self.roles.lock().await.get(room).copied())
    }

    async fn save(&self, room: &RoomCode, role: Role) -> Result<(), SessionError> {
        debug!(%room, %role, "role persisted");
        self.roles.lock().await.insert(room.clone(), role);
        Ok(())
    }

    async fn clear(&self, room: &RoomCode) -> Result<(), SessionError> {
        if self.roles.lock().await.remove(room).is_some() {
            debug!(%room, "role cleared");
        }
        Ok(())
    }
}

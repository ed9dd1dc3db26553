//! In-process hub implementation of the transport traits.
//!
//! One [`MemoryHub`] plays the role of the hosted pub/sub service; each
//! participant connects to it and gets a [`MemoryTransport`]. Delivery is
//! synchronous fan-out over unbounded channels, which gives exactly the
//! guarantees the protocol assumes: per-sender ordering and echo-to-self.
//! Presence here is immediately consistent — staleness is simulated in
//! tests, not manufactured by the hub.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, trace};

use crate::{
    Channel, ChannelMessage, ClientId, MessageStream, Presence, PresenceAction, PresenceEvent,
    PresenceMember, PresenceStream, Transport, TransportError,
};

type ChannelRegistry = Arc<Mutex<HashMap<String, Arc<ChannelShared>>>>;

/// State shared by every handle to one named channel.
#[derive(Debug)]
struct ChannelShared {
    name: String,
    subscribers: Mutex<Vec<UnboundedSender<ChannelMessage>>>,
    presence_subscribers: Mutex<Vec<UnboundedSender<PresenceEvent>>>,
    members: Mutex<HashMap<ClientId, Vec<u8>>>,
}

impl ChannelShared {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribers: Mutex::new(Vec::new()),
            presence_subscribers: Mutex::new(Vec::new()),
            members: Mutex::new(HashMap::new()),
        }
    }

    /// Fans a message out to every live subscriber, pruning dead ones.
    async fn broadcast(&self, message: ChannelMessage) {
        let mut subs = self.subscribers.lock().await;
        subs.retain(|tx| tx.send(message.clone()).is_ok());
    }

    async fn broadcast_presence(&self, event: PresenceEvent) {
        let mut subs = self.presence_subscribers.lock().await;
        subs.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// The in-process stand-in for the hosted pub/sub service.
///
/// Cheap to clone; all clones share the same channel registry.
#[derive(Clone, Default)]
pub struct MemoryHub {
    channels: ChannelRegistry,
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects a client, producing its transport handle.
    pub fn connect(&self, client_id: ClientId) -> MemoryTransport {
        debug!(client = %client_id, "client connected to memory hub");
        MemoryTransport {
            client_id,
            channels: Arc::clone(&self.channels),
            handles: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }
}

/// One client's connection to a [`MemoryHub`].
pub struct MemoryTransport {
    client_id: ClientId,
    channels: ChannelRegistry,
    /// Channel handles this client opened, so `close` can leave them all.
    handles: Mutex<Vec<MemoryChannel>>,
    closed: AtomicBool,
}

impl Transport for MemoryTransport {
    type Channel = MemoryChannel;
    type Error = TransportError;

    fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    async fn channel(&self, name: &str) -> Result<MemoryChannel, TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        let shared = {
            let mut channels = self.channels.lock().await;
            Arc::clone(
                channels
                    .entry(name.to_string())
                    .or_insert_with(|| Arc::new(ChannelShared::new(name))),
            )
        };
        let handle = MemoryChannel {
            shared,
            client_id: self.client_id.clone(),
            state: Arc::new(HandleState::default()),
        };
        self.handles.lock().await.push(handle.clone());
        Ok(handle)
    }

    async fn close(&self) -> Result<(), TransportError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let handles: Vec<MemoryChannel> = self.handles.lock().await.drain(..).collect();
        for handle in handles {
            handle.detach().await?;
        }
        debug!(client = %self.client_id, "memory transport closed");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct HandleState {
    attached: AtomicBool,
    entered: AtomicBool,
}

/// A client's handle to one named channel.
#[derive(Clone, Debug)]
pub struct MemoryChannel {
    shared: Arc<ChannelShared>,
    client_id: ClientId,
    state: Arc<HandleState>,
}

impl MemoryChannel {
    fn require_attached(&self) -> Result<(), TransportError> {
        if self.state.attached.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TransportError::NotAttached(self.shared.name.clone()))
        }
    }
}

impl Channel for MemoryChannel {
    type Presence = MemoryPresence;
    type Error = TransportError;

    fn name(&self) -> &str {
        &self.shared.name
    }

    async fn attach(&self) -> Result<(), TransportError> {
        self.state.attached.store(true, Ordering::SeqCst);
        trace!(channel = %self.shared.name, client = %self.client_id, "attached");
        Ok(())
    }

    async fn detach(&self) -> Result<(), TransportError> {
        // Leave presence first, while the channel still counts as attached.
        self.presence().leave().await?;
        self.state.attached.store(false, Ordering::SeqCst);
        trace!(channel = %self.shared.name, client = %self.client_id, "detached");
        Ok(())
    }

    async fn publish(&self, kind: &str, data: &[u8]) -> Result<(), TransportError> {
        self.require_attached()?;
        trace!(channel = %self.shared.name, kind, len = data.len(), "publish");
        self.shared
            .broadcast(ChannelMessage {
                kind: kind.to_string(),
                data: data.to_vec(),
            })
            .await;
        Ok(())
    }

    async fn subscribe(&self) -> Result<MessageStream, TransportError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.shared.subscribers.lock().await.push(tx);
        Ok(rx)
    }

    fn presence(&self) -> MemoryPresence {
        MemoryPresence {
            shared: Arc::clone(&self.shared),
            client_id: self.client_id.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

/// Presence sub-interface of a [`MemoryChannel`].
#[derive(Clone)]
pub struct MemoryPresence {
    shared: Arc<ChannelShared>,
    client_id: ClientId,
    state: Arc<HandleState>,
}

impl Presence for MemoryPresence {
    type Error = TransportError;

    async fn enter(&self, data: &[u8]) -> Result<(), TransportError> {
        if !self.state.attached.load(Ordering::SeqCst) {
            return Err(TransportError::NotAttached(self.shared.name.clone()));
        }
        let previous = {
            let mut members = self.shared.members.lock().await;
            members.insert(self.client_id.clone(), data.to_vec())
        };
        self.state.entered.store(true, Ordering::SeqCst);
        let action = if previous.is_some() {
            PresenceAction::Update
        } else {
            PresenceAction::Enter
        };
        debug!(channel = %self.shared.name, client = %self.client_id, ?action, "presence enter");
        self.shared
            .broadcast_presence(PresenceEvent {
                action,
                member: PresenceMember {
                    client_id: self.client_id.clone(),
                    data: data.to_vec(),
                },
            })
            .await;
        Ok(())
    }

    async fn leave(&self) -> Result<(), TransportError> {
        if !self.state.entered.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        let data = {
            let mut members = self.shared.members.lock().await;
            members.remove(&self.client_id)
        };
        if let Some(data) = data {
            debug!(channel = %self.shared.name, client = %self.client_id, "presence leave");
            self.shared
                .broadcast_presence(PresenceEvent {
                    action: PresenceAction::Leave,
                    member: PresenceMember {
                        client_id: self.client_id.clone(),
                        data,
                    },
                })
                .await;
        }
        Ok(())
    }

    async fn get(&self) -> Result<Vec<PresenceMember>, TransportError> {
        if !self.state.attached.load(Ordering::SeqCst) {
            return Err(TransportError::NotAttached(self.shared.name.clone()));
        }
        let members = self.shared.members.lock().await;
        Ok(members
            .iter()
            .map(|(client_id, data)| PresenceMember {
                client_id: client_id.clone(),
                data: data.clone(),
            })
            .collect())
    }

    async fn subscribe(&self) -> Result<PresenceStream, TransportError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.shared.presence_subscribers.lock().await.push(tx);
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub_with(ids: &[&str]) -> (MemoryHub, Vec<MemoryTransport>) {
        let hub = MemoryHub::new();
        let transports = ids
            .iter()
            .map(|id| hub.connect(ClientId::new(*id)))
            .collect();
        (hub, transports)
    }

    #[tokio::test]
    async fn test_publish_echoes_to_publisher() {
        let (_hub, transports) = hub_with(&["a"]);
        let ch = transports[0].channel("room").await.unwrap();
        ch.attach().await.unwrap();
        let mut rx = ch.subscribe().await.unwrap();

        ch.publish("board-update", b"{}").await.unwrap();

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.kind, "board-update");
        assert_eq!(msg.data, b"{}");
    }

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let (_hub, transports) = hub_with(&["a", "b"]);
        let ch_a = transports[0].channel("room").await.unwrap();
        let ch_b = transports[1].channel("room").await.unwrap();
        ch_a.attach().await.unwrap();
        ch_b.attach().await.unwrap();
        let mut rx_a = ch_a.subscribe().await.unwrap();
        let mut rx_b = ch_b.subscribe().await.unwrap();

        ch_a.publish("game-over", b"done").await.unwrap();

        assert_eq!(rx_a.recv().await.unwrap().kind, "game-over");
        assert_eq!(rx_b.recv().await.unwrap().kind, "game-over");
    }

    #[tokio::test]
    async fn test_publish_without_attach_fails() {
        let (_hub, transports) = hub_with(&["a"]);
        let ch = transports[0].channel("room").await.unwrap();
        let err = ch.publish("board-update", b"{}").await.unwrap_err();
        assert!(matches!(err, TransportError::NotAttached(_)));
    }

    #[tokio::test]
    async fn test_publish_preserves_per_sender_order() {
        let (_hub, transports) = hub_with(&["a"]);
        let ch = transports[0].channel("room").await.unwrap();
        ch.attach().await.unwrap();
        let mut rx = ch.subscribe().await.unwrap();

        for i in 0..3u8 {
            ch.publish("board-update", &[i]).await.unwrap();
        }
        for i in 0..3u8 {
            assert_eq!(rx.recv().await.unwrap().data, vec![i]);
        }
    }

    #[tokio::test]
    async fn test_presence_enter_visible_to_other_clients() {
        let (_hub, transports) = hub_with(&["a", "b"]);
        let ch_a = transports[0].channel("room").await.unwrap();
        let ch_b = transports[1].channel("room").await.unwrap();
        ch_a.attach().await.unwrap();
        ch_b.attach().await.unwrap();

        ch_a.presence().enter(b"black").await.unwrap();

        let members = ch_b.presence().get().await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].client_id, ClientId::new("a"));
        assert_eq!(members[0].data, b"black");
    }

    #[tokio::test]
    async fn test_presence_enter_twice_updates_data() {
        let (_hub, transports) = hub_with(&["a"]);
        let ch = transports[0].channel("room").await.unwrap();
        ch.attach().await.unwrap();
        let mut events = ch.presence().subscribe().await.unwrap();

        ch.presence().enter(b"black").await.unwrap();
        ch.presence().enter(b"white").await.unwrap();

        assert_eq!(events.recv().await.unwrap().action, PresenceAction::Enter);
        assert_eq!(events.recv().await.unwrap().action, PresenceAction::Update);
        let members = ch.presence().get().await.unwrap();
        assert_eq!(members[0].data, b"white");
    }

    #[tokio::test]
    async fn test_presence_leave_removes_member_and_notifies() {
        let (_hub, transports) = hub_with(&["a", "b"]);
        let ch_a = transports[0].channel("room").await.unwrap();
        let ch_b = transports[1].channel("room").await.unwrap();
        ch_a.attach().await.unwrap();
        ch_b.attach().await.unwrap();
        let mut events = ch_b.presence().subscribe().await.unwrap();

        ch_a.presence().enter(b"black").await.unwrap();
        ch_a.presence().leave().await.unwrap();

        assert_eq!(events.recv().await.unwrap().action, PresenceAction::Enter);
        let leave = events.recv().await.unwrap();
        assert_eq!(leave.action, PresenceAction::Leave);
        assert_eq!(leave.member.client_id, ClientId::new("a"));
        assert!(ch_b.presence().get().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_presence_leave_when_not_entered_is_noop() {
        let (_hub, transports) = hub_with(&["a"]);
        let ch = transports[0].channel("room").await.unwrap();
        ch.attach().await.unwrap();
        ch.presence().leave().await.unwrap();
        assert!(ch.presence().get().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_detach_implies_presence_leave() {
        let (_hub, transports) = hub_with(&["a", "b"]);
        let ch_a = transports[0].channel("room").await.unwrap();
        let ch_b = transports[1].channel("room").await.unwrap();
        ch_a.attach().await.unwrap();
        ch_b.attach().await.unwrap();

        ch_a.presence().enter(b"black").await.unwrap();
        ch_a.detach().await.unwrap();

        assert!(ch_b.presence().get().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_pruned() {
        let (_hub, transports) = hub_with(&["a"]);
        let ch = transports[0].channel("room").await.unwrap();
        ch.attach().await.unwrap();
        let rx = ch.subscribe().await.unwrap();
        drop(rx);
        // Publishing after the receiver is gone must not error.
        ch.publish("board-update", b"{}").await.unwrap();
    }

    #[tokio::test]
    async fn test_close_leaves_all_entered_channels() {
        let (_hub, transports) = hub_with(&["a", "b"]);
        let ch_a = transports[0].channel("room").await.unwrap();
        let ch_b = transports[1].channel("room").await.unwrap();
        ch_a.attach().await.unwrap();
        ch_b.attach().await.unwrap();
        ch_a.presence().enter(b"black").await.unwrap();

        transports[0].close().await.unwrap();

        assert!(ch_b.presence().get().await.unwrap().is_empty());
        assert!(matches!(
            transports[0].channel("other").await,
            Err(TransportError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_channels_are_isolated_by_name() {
        let (_hub, transports) = hub_with(&["a"]);
        let ch_one = transports[0].channel("one").await.unwrap();
        let ch_two = transports[0].channel("two").await.unwrap();
        ch_one.attach().await.unwrap();
        ch_two.attach().await.unwrap();
        let mut rx_two = ch_two.subscribe().await.unwrap();

        ch_one.publish("board-update", b"x").await.unwrap();

        assert!(rx_two.try_recv().is_err());
    }
}

//! Pub/sub transport abstraction for Moku.
//!
//! Provides the [`Transport`], [`Channel`], and [`Presence`] traits that
//! abstract over a hosted publish/subscribe service with live-membership
//! tracking. The coordination protocol assumes the semantics such services
//! give you:
//!
//! - messages published by one sender on one channel arrive in order;
//! - publishers receive their own messages back (echo);
//! - the presence set is eventually consistent — a read can briefly miss a
//!   member that just entered, or still show one that just left.
//!
//! # Feature flags
//!
//! - `memory` (default) — in-process [`MemoryHub`] implementation, used by
//!   tests and demos.

mod error;
#[cfg(feature = "memory")]
mod memory;

pub use error::TransportError;
#[cfg(feature = "memory")]
pub use memory::{MemoryChannel, MemoryHub, MemoryPresence, MemoryTransport};

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;

/// Opaque identifier for a connected client.
///
/// Unique per connection to the transport; travels inside presence data
/// and message payloads, hence the serde impls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Creates a `ClientId` from a raw string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the underlying `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message delivered on a channel subscription.
#[derive(Debug, Clone)]
pub struct ChannelMessage {
    /// Message-type name the publisher tagged this with.
    pub kind: String,
    /// Encoded payload bytes; the protocol layer decodes them.
    pub data: Vec<u8>,
}

/// One entry of a channel's presence set.
#[derive(Debug, Clone)]
pub struct PresenceMember {
    pub client_id: ClientId,
    /// Encoded data the member entered presence with.
    pub data: Vec<u8>,
}

/// What changed about a presence member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceAction {
    Enter,
    Leave,
    Update,
}

/// A live-membership change notification.
#[derive(Debug, Clone)]
pub struct PresenceEvent {
    pub action: PresenceAction,
    pub member: PresenceMember,
}

/// Stream of inbound channel messages. Dropping it unsubscribes.
pub type MessageStream = UnboundedReceiver<ChannelMessage>;

/// Stream of presence change notifications. Dropping it unsubscribes.
pub type PresenceStream = UnboundedReceiver<PresenceEvent>;

/// A client's connection to the pub/sub service.
///
/// Created once at startup and passed into every component that needs it;
/// [`Transport::close`] is the explicit shutdown hook.
///
/// Methods return explicitly `Send` futures so that code generic over a
/// transport can be driven from spawned tasks.
pub trait Transport: Send + Sync + 'static {
    /// The channel handle type produced by this transport.
    type Channel: Channel;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// The identity this connection presents to other participants.
    fn client_id(&self) -> &ClientId;

    /// Returns a handle to the named channel, creating it if needed.
    fn channel(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Self::Channel, Self::Error>> + Send;

    /// Shuts the connection down, leaving any presence sets it entered.
    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// A named pub/sub channel.
pub trait Channel: Send + Sync + 'static {
    /// The presence sub-interface type.
    type Presence: Presence<Error = Self::Error>;
    /// The error type for channel operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// The channel name.
    fn name(&self) -> &str;

    /// Starts receiving on this channel. Publish and presence operations
    /// require an attached channel.
    fn attach(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Stops receiving and leaves presence if it was entered.
    fn detach(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Publishes one message of the given type.
    ///
    /// Delivery is at-least-once and ordered per publisher; the publisher's
    /// own subscriptions receive the message too.
    fn publish(
        &self,
        kind: &str,
        data: &[u8],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Subscribes to all message types on this channel.
    fn subscribe(&self) -> impl Future<Output = Result<MessageStream, Self::Error>> + Send;

    /// The presence sub-interface for this channel.
    fn presence(&self) -> Self::Presence;
}

/// Live-membership operations of one channel.
pub trait Presence: Send + Sync + 'static {
    /// The error type for presence operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Enters the presence set with the given data; entering again
    /// updates the data in place.
    fn enter(&self, data: &[u8]) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Leaves the presence set. A no-op when not entered.
    fn leave(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Point-in-time snapshot of the presence set. May lag actual
    /// membership; callers that draw conclusions from it re-sample.
    fn get(&self) -> impl Future<Output = Result<Vec<PresenceMember>, Self::Error>> + Send;

    /// Subscribes to membership change notifications.
    fn subscribe(&self) -> impl Future<Output = Result<PresenceStream, Self::Error>> + Send;
}

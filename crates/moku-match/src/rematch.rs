//! Rematch vote bookkeeping.

use moku_transport::ClientId;

/// Tracks the two-message rematch handshake from this peer's point of view.
///
/// A request stays pending until a response arrives on the channel. There
/// is deliberately no timeout: a request that never gets an answer simply
/// sits until the peer responds or leaves, and presence tracking handles
/// the leaving case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RematchVote {
    requested_by_me: bool,
    requested_by_peer: Option<ClientId>,
}

impl RematchVote {
    /// Records that this peer has asked for a rematch.
    pub(crate) fn record_mine(&mut self) {
        self.requested_by_me = true;
    }

    /// Records an incoming request from `peer`.
    pub(crate) fn record_peer(&mut self, peer: ClientId) {
        self.requested_by_peer = Some(peer);
    }

    /// Clears the pending prompt once this peer has answered it.
    pub(crate) fn take_peer(&mut self) -> Option<ClientId> {
        self.requested_by_peer.take()
    }

    /// Drops all pending votes.
    pub(crate) fn reset(&mut self) {
        self.requested_by_me = false;
        self.requested_by_peer = None;
    }

    /// `true` if this peer has an unanswered outgoing request.
    pub fn requested_by_me(&self) -> bool {
        self.requested_by_me
    }

    /// The peer whose request is awaiting this peer's answer, if any.
    pub fn requested_by_peer(&self) -> Option<&ClientId> {
        self.requested_by_peer.as_ref()
    }
}

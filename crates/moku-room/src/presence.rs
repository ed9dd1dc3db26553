//! Occupancy sampling.

use moku_protocol::{Codec, PresenceData};
use moku_rules::Player;
use moku_transport::{ClientId, Presence};
use tracing::warn;

/// A point-in-time head count of a room, derived from the presence set.
///
/// Presence is the only source of truth for who is in a room. It is also
/// eventually consistent, so a single sample is a hint, not a conclusion;
/// call sites that act on it go through [`ConfirmPolicy`] first.
///
/// [`ConfirmPolicy`]: crate::ConfirmPolicy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Occupancy {
    /// Members holding one of the two player seats.
    pub players: Vec<(ClientId, Player)>,

    /// How many members are watching.
    pub spectators: usize,
}

impl Occupancy {
    /// Number of occupied player seats.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// `true` when no player is left in the room.
    pub fn is_abandoned(&self) -> bool {
        self.players.is_empty()
    }

    /// `true` when exactly one player is waiting for an opponent.
    pub fn is_waiting(&self) -> bool {
        self.players.len() == 1
    }

    /// `true` when both seats are filled.
    pub fn is_active(&self) -> bool {
        self.players.len() >= 2
    }

    /// `true` when some member already holds the `seat` colour.
    pub fn seat_taken(&self, seat: Player) -> bool {
        self.players.iter().any(|(_, player)| *player == seat)
    }
}

/// Reads the live presence set and tallies it by declared role.
///
/// Entries whose presence data does not decode count as neither player
/// nor spectator; they are logged and skipped rather than failing the
/// sample, since one misbehaving member must not blind the whole room.
pub async fn sample_occupancy<P, C>(presence: &P, codec: &C) -> Result<Occupancy, P::Error>
where
    P: Presence,
    C: Codec,
{
    let members = presence.get().await?;
    let mut occupancy = Occupancy::default();
    for member in members {
        match codec.decode::<PresenceData>(&member.data) {
            Ok(data) => match data.role.player() {
                Some(player) => occupancy.players.push((member.client_id, player)),
                None => occupancy.spectators += 1,
            },
            Err(error) => {
                warn!(client_id = %member.client_id, %error, "skipping undecodable presence entry");
            }
        }
    }
    Ok(occupancy)
}

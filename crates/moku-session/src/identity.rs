//! Client id generation.

use rand::Rng;

use moku_transport::ClientId;

/// Mints a fresh random client id: 16 random bytes as 32 lowercase hex
/// characters. Collisions are astronomically unlikely, so ids are not
/// checked against anything.
pub fn generate_client_id() -> ClientId {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    ClientId::new(hex)
}

//! Records stored and emitted by the room manager program.
//!
//! Every type here mirrors a struct or record declared by the on-chain
//! program. Field names match the program's declarations exactly, since
//! both codecs address fields by name.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A participant's public address (e.g. `aleo1...`).
///
/// The address is kept in its canonical string form. This crate never
/// parses or checksums it; the ledger does that when the transaction is
/// built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Wraps a canonical address string.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Returns the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The unique key of a room in the `rooms` mapping.
///
/// The program declares room ids as `u32`, so this wraps a `u32` rather
/// than a wider integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u32);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Room records
// ---------------------------------------------------------------------------

/// A player's seat in a room: who joined and how much they put in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRoomConfig {
    pub player_address: Address,
    pub bet: u64,
}

/// The public state of a room, as stored in the `rooms` mapping.
///
/// `joined_users` is append-only and ordered by join time. The host is
/// always `joined_users[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    pub big_blind: u64,
    pub big_blind_seat: u8,
    pub small_blind: u64,
    pub small_blind_seat: u8,
    pub dealer_seat: u8,
    pub min_stack: u64,
    pub seats: u8,
    pub room_id: RoomId,
    pub joined_users: Vec<PlayerRoomConfig>,
    /// Always equal to `joined_users.len()`.
    pub num_joined_users: u8,
    pub game_state_manager_address: Address,
}

impl RoomConfig {
    /// Checks the structural invariants every decoded room must satisfy.
    ///
    /// - `num_joined_users == joined_users.len()`
    /// - `joined_users.len() <= seats`
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if usize::from(self.num_joined_users) != self.joined_users.len() {
            return Err(ProtocolError::InvalidRecord(format!(
                "num_joined_users is {} but joined_users has {} entries",
                self.num_joined_users,
                self.joined_users.len()
            )));
        }
        if self.joined_users.len() > usize::from(self.seats) {
            return Err(ProtocolError::InvalidRecord(format!(
                "{} joined users exceed {} seats",
                self.joined_users.len(),
                self.seats
            )));
        }
        Ok(())
    }

    /// Returns `true` once every seat is taken.
    pub fn is_full(&self) -> bool {
        self.joined_users.len() >= usize::from(self.seats)
    }

    /// Returns `true` if `address` has already joined.
    pub fn contains(&self, address: &Address) -> bool {
        self.joined_users
            .iter()
            .any(|u| &u.player_address == address)
    }

    /// The room creator, i.e. the first joined user.
    pub fn host(&self) -> Option<&PlayerRoomConfig> {
        self.joined_users.first()
    }

    /// Member addresses in join order.
    pub fn player_addresses(&self) -> Vec<Address> {
        self.joined_users
            .iter()
            .map(|u| u.player_address.clone())
            .collect()
    }
}

/// The record handed to the dealer asking it to start a game for a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfigRequest {
    pub room_id: RoomId,
    pub room_config: RoomConfig,
    pub owner: Address,
}

/// The record asking the dealer to build a deck for the listed players.
///
/// `player_addresses` keeps the room's join order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckCreationRequest {
    pub owner: Address,
    pub room_id: RoomId,
    pub player_addresses: Vec<Address>,
}

/// A private record output: the payload we reconstructed from known
/// inputs, paired with the opaque ciphertext the ledger returned.
///
/// The ciphertext is carried as-is; nothing in Roomledger decrypts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordWithCiphertext<T> {
    pub data: T,
    pub ciphertext: String,
}

//! Room records and wire formats for Roomledger.
//!
//! This crate defines the "language" spoken between the room client and
//! the on-chain room manager program:
//!
//! - **Types** ([`RoomConfig`], [`PlayerRoomConfig`], [`RoomConfigRequest`],
//!   [`DeckCreationRequest`], [`RecordWithCiphertext`]): the records the
//!   program stores and emits.
//! - **Inputs** ([`Input`]): how values are rendered as typed program
//!   inputs (`100u64`, `7u32`, `aleo1...`).
//! - **Codecs** ([`RoomCodec`] trait, [`JsonCodec`], [`PlaintextCodec`]):
//!   how a [`RoomConfig`] is converted to and from its wire string.
//! - **Errors** ([`ProtocolError`]): what can go wrong while decoding.
//!
//! # Architecture
//!
//! The protocol layer sits below the ledger client and the room
//! orchestrator. It knows nothing about transactions or polling; it only
//! knows how records look and how to (de)serialize them.
//!
//! ```text
//! Ledger (strings) → Protocol (RoomConfig) → Room orchestrator
//! ```

mod codec;
mod error;
mod input;
mod plaintext;
mod types;

pub use codec::RoomCodec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use input::Input;
pub use plaintext::PlaintextCodec;
pub use types::{
    Address, DeckCreationRequest, PlayerRoomConfig, RecordWithCiphertext,
    RoomConfig, RoomConfigRequest, RoomId,
};

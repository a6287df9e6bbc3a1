//! Room lifecycle orchestration for Roomledger.
//!
//! A room is created, filled and handed to a dealer entirely through
//! ledger transactions. Each operation here builds typed inputs, submits
//! one transaction, waits for it to confirm and decodes what came back.
//!
//! # Key types
//!
//! - [`RoomManager`]: issues create / join / request-game-creation and
//!   reads rooms back from the `rooms` mapping
//! - [`RoomManagerConfig`]: retry policies, bet rule, client-side checks
//! - [`RoomPhase`]: lifecycle state machine
//! - [`BetRule`]: how a joining player's bet must relate to the room
//! - [`GameCreation`]: the records produced by a game creation request

mod config;
mod error;
mod manager;

pub use config::{BetRule, RoomManagerConfig, RoomPhase};
pub use error::RoomError;
pub use manager::{GameCreation, RoomManager};

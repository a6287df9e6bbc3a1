//! # Roomledger
//!
//! Multiplayer room lifecycle on an eventually-confirmed ledger.
//!
//! Rooms live in an on-chain program. Roomledger creates them, adds
//! players, and asks a dealer to start a game, each step being one
//! transaction that is submitted, polled until confirmed, and decoded.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roomledger::prelude::*;
//!
//! # async fn run() -> Result<(), RoomledgerError> {
//! let config = Config::from_env()?;
//! roomledger::telemetry::init("info");
//!
//! let ledger = SimulatedLedger::default();
//! let rooms = config.room_manager(ledger.clone(), ledger.clone());
//!
//! let host = ledger.generate_signer();
//! let game = &config.game;
//! let room = rooms
//!     .create_room(&host, game.big_blind, game.small_blind, game.min_stack, game.seats, game.bet, config.tx.fee())
//!     .await?;
//! println!("created room {}", room.room_id);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! | crate | contents |
//! |---|---|
//! | `roomledger-protocol` | room records, program inputs, codecs |
//! | `roomledger-retry` | retry policy and backoff |
//! | `roomledger-ledger` | ledger client traits, poller, HTTP and simulated nodes |
//! | `roomledger-room` | the room orchestrator |

mod config;
mod error;
pub mod telemetry;

pub use config::{Config, ConfigError, GameDefaults, RetryConfig, TxConfig};
pub use error::RoomledgerError;

pub use roomledger_ledger as ledger;
pub use roomledger_protocol as protocol;
pub use roomledger_retry as retry;
pub use roomledger_room as room;

pub mod prelude {
    pub use crate::{Config, GameDefaults, RoomledgerError, TxConfig};

    pub use roomledger_ledger::{
        ConfirmationPoller, ConfirmedTransaction, Fee, LedgerClient, PrivateKey,
        Signer, TransactionBuilder, TransactionId,
    };
    #[cfg(feature = "http")]
    pub use roomledger_ledger::HttpLedgerClient;
    #[cfg(feature = "simulator")]
    pub use roomledger_ledger::{SimulatedLedger, SimulatorConfig};
    pub use roomledger_protocol::{
        Address, PlaintextCodec, RoomCodec, RoomConfig, RoomId,
    };
    pub use roomledger_retry::RetryPolicy;
    pub use roomledger_room::{
        BetRule, GameCreation, RoomManager, RoomManagerConfig, RoomPhase,
    };
}

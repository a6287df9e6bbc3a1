//! Ledger client boundary for Roomledger.
//!
//! Provides the [`LedgerClient`] and [`TransactionBuilder`] traits that
//! abstract over a ledger node and the SDK that builds and signs
//! executions, plus the [`ConfirmationPoller`] that turns a submitted
//! transaction id into a confirmed transaction.
//!
//! # Feature Flags
//!
//! - `http` (default): [`HttpLedgerClient`], a REST client for a ledger
//!   node via `reqwest`.
//! - `simulator` (default): [`SimulatedLedger`], an in-memory room
//!   manager program used by tests and the demo.

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "http")]
mod http;
mod poller;
#[cfg(feature = "simulator")]
mod simulator;
mod transaction;

pub use error::{ConfirmationError, LedgerError, PendingStatus};
#[cfg(feature = "http")]
pub use http::HttpLedgerClient;
pub use poller::ConfirmationPoller;
#[cfg(feature = "simulator")]
pub use simulator::{SimulatedLedger, SimulatorConfig};
pub use transaction::{
    ConfirmedTransaction, Execution, ExecutionRequest, Fee, Output, PrivateKey,
    SignedTransaction, Signer, Transaction, TransactionId, Transition,
};

use std::future::Future;

/// The on-chain program that manages rooms.
pub const ROOM_MANAGER_PROGRAM: &str = "room_manager.aleo";
/// The program holding public credit balances.
pub const CREDITS_PROGRAM: &str = "credits.aleo";
/// Mapping of room id to room config.
pub const ROOMS_MAPPING: &str = "rooms";

/// Function names exposed by [`ROOM_MANAGER_PROGRAM`].
pub mod functions {
    pub const CREATE_ROOM: &str = "rm_create_room";
    pub const JOIN_ROOM: &str = "rm_join_room";
    pub const REQUEST_GAME_CREATION: &str = "rm_request_game_creation";
}

/// Read and write access to a ledger node.
///
/// Implementations must be cheap to share: the room orchestrator holds a
/// single client and issues every query through `&self`.
pub trait LedgerClient: Send + Sync + 'static {
    /// Broadcasts a signed transaction and returns the id the node
    /// assigned to it. Acceptance here does not mean confirmation.
    fn submit_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> impl Future<Output = Result<TransactionId, LedgerError>> + Send;

    /// Fetches a transaction by id.
    ///
    /// Returns `Ok(None)` when the node has no record of it (yet). A
    /// record with no execution outputs means "not yet confirmed".
    fn get_transaction(
        &self,
        id: &TransactionId,
    ) -> impl Future<Output = Result<Option<Transaction>, LedgerError>> + Send;

    /// Reads one entry of a program mapping. `Ok(None)` means the key is
    /// absent.
    fn get_mapping_value(
        &self,
        program_id: &str,
        mapping: &str,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, LedgerError>> + Send;
}

/// Builds and signs program executions.
///
/// This is where proofs are generated and keys are used; Roomledger only
/// supplies the already-rendered inputs and receives an opaque
/// [`SignedTransaction`].
pub trait TransactionBuilder: Send + Sync + 'static {
    fn build_execution(
        &self,
        request: ExecutionRequest<'_>,
    ) -> impl Future<Output = Result<SignedTransaction, LedgerError>> + Send;
}

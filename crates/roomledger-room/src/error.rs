//! Error types for the room layer.

use roomledger_ledger::{ConfirmationError, LedgerError, TransactionId};
use roomledger_protocol::{ProtocolError, RoomId};
use roomledger_retry::{Classify, ErrorClass};

/// Errors that can occur during room operations.
///
/// Lower-layer errors pass through unchanged so callers can still match
/// on the ledger or codec failure that caused them.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// Building, submitting or reading from the ledger failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A submitted transaction never confirmed.
    #[error(transparent)]
    Confirmation(#[from] ConfirmationError),

    /// A room record could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A confirmed transaction did not have the expected outputs.
    #[error("malformed response for transaction {tx_id}: {reason}")]
    MalformedResponse { tx_id: TransactionId, reason: String },

    /// The `rooms` mapping held a different room under this id.
    #[error("room {room_id} lookup returned room {found}")]
    UnexpectedRoom { room_id: RoomId, found: RoomId },

    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The bet does not satisfy the configured bet rule.
    #[error("bet {bet} rejected for room {room_id}: {reason}")]
    BetRejected {
        room_id: RoomId,
        bet: u64,
        reason: String,
    },

    /// The room is in a phase that doesn't allow this operation.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),
}

impl Classify for RoomError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::Ledger(e) => e.class(),
            Self::Confirmation(ConfirmationError::Timeout { .. }) => ErrorClass::Unknown,
            Self::Confirmation(ConfirmationError::Ledger { source, .. }) => source.class(),
            _ => ErrorClass::Permanent,
        }
    }
}

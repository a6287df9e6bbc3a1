//! Unified error type for Roomledger.

use roomledger_ledger::{ConfirmationError, LedgerError};
use roomledger_protocol::ProtocolError;
use roomledger_room::RoomError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RoomledgerError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A codec error (encode, decode, invalid record).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A ledger node or transaction builder error.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A transaction did not confirm.
    #[error(transparent)]
    Confirmation(#[from] ConfirmationError),

    /// A room operation failed.
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomledger_ledger::{PendingStatus, TransactionId};
    use roomledger_protocol::RoomId;

    #[test]
    fn test_from_protocol_error() {
        let err: RoomledgerError = ProtocolError::MissingField("seats").into();
        assert!(matches!(err, RoomledgerError::Protocol(_)));
        assert!(err.to_string().contains("seats"));
    }

    #[test]
    fn test_from_ledger_error() {
        let err: RoomledgerError = LedgerError::Rejected("room full".into()).into();
        assert!(matches!(err, RoomledgerError::Ledger(_)));
        assert!(err.to_string().contains("room full"));
    }

    #[test]
    fn test_from_confirmation_error() {
        let err: RoomledgerError = ConfirmationError::Timeout {
            tx_id: TransactionId::new("at1x"),
            attempts: 5,
            status: PendingStatus::Unknown,
        }
        .into();
        assert!(matches!(err, RoomledgerError::Confirmation(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err: RoomledgerError = RoomError::NotFound(RoomId(3)).into();
        assert!(matches!(err, RoomledgerError::Room(_)));
        assert_eq!(err.to_string(), "room 3 not found");
    }
}

//! Error types for the ledger layer.

use std::fmt;

use roomledger_retry::{Classify, ErrorClass};

use crate::TransactionId;

/// Errors raised by a [`LedgerClient`](crate::LedgerClient) or
/// [`TransactionBuilder`](crate::TransactionBuilder).
///
/// Each variant is classified at this boundary so the retry engine can
/// tell a flaky node from a transaction that will never be accepted.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The HTTP request itself failed (connect, timeout, body read).
    #[cfg(feature = "http")]
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The node answered with a non-success status.
    #[error("node returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The node or program refused the transaction.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// The builder could not produce a transaction from the request.
    #[error("failed to build transaction: {0}")]
    Build(String),

    /// The node answered, but not in the expected shape.
    #[error("invalid node response: {0}")]
    InvalidResponse(String),

    /// The endpoint URL is unusable.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The node is temporarily unreachable or overloaded.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

impl Classify for LedgerError {
    fn class(&self) -> ErrorClass {
        match self {
            #[cfg(feature = "http")]
            Self::Http(e) => {
                if e.is_timeout() || e.is_connect() {
                    ErrorClass::Transient
                } else if e.is_builder() || e.is_decode() {
                    ErrorClass::Permanent
                } else {
                    ErrorClass::Unknown
                }
            }
            Self::Status { status, .. } => match status {
                408 | 425 | 429 => ErrorClass::Transient,
                500..=599 => ErrorClass::Transient,
                400..=499 => ErrorClass::Permanent,
                _ => ErrorClass::Unknown,
            },
            Self::Unavailable(_) => ErrorClass::Transient,
            Self::Rejected(_)
            | Self::Build(_)
            | Self::InvalidResponse(_)
            | Self::InvalidEndpoint(_) => ErrorClass::Permanent,
        }
    }
}

/// What the poller last saw before giving up on a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingStatus {
    /// The node never returned a record for the id.
    Unknown,
    /// The record exists but has no execution outputs.
    Pending,
    /// The last query failed with a transient ledger error.
    Unreachable,
}

impl fmt::Display for PendingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "no record found"),
            Self::Pending => write!(f, "record has no outputs yet"),
            Self::Unreachable => write!(f, "node unreachable"),
        }
    }
}

/// Why a submitted transaction could not be confirmed.
#[derive(Debug, thiserror::Error)]
pub enum ConfirmationError {
    /// The attempt budget ran out before outputs appeared. The chain may
    /// have rejected the transaction or may simply be slow.
    #[error("transaction {tx_id} not confirmed after {attempts} attempts ({status})")]
    Timeout {
        tx_id: TransactionId,
        attempts: u32,
        status: PendingStatus,
    },

    /// A non-retryable ledger error occurred while polling.
    #[error("polling transaction {tx_id} failed: {source}")]
    Ledger {
        tx_id: TransactionId,
        #[source]
        source: LedgerError,
    },
}

impl ConfirmationError {
    pub fn tx_id(&self) -> &TransactionId {
        match self {
            Self::Timeout { tx_id, .. } | Self::Ledger { tx_id, .. } => tx_id,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

//! Waiting for a submitted transaction to show committed outputs.

use std::fmt;

use roomledger_retry::{retry_if, Classify, RetryError, RetryPolicy};
use tracing::{debug, info, trace, Instrument};

use crate::{
    ConfirmationError, ConfirmedTransaction, LedgerClient, LedgerError,
    PendingStatus, TransactionId,
};

/// Outcome of a single poll that did not confirm.
#[derive(Debug)]
enum PollMiss {
    /// No record, or a record without outputs.
    NotYetConfirmed(PendingStatus),
    Ledger(LedgerError),
}

impl fmt::Display for PollMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotYetConfirmed(status) => write!(f, "not yet confirmed ({status})"),
            Self::Ledger(e) => write!(f, "{e}"),
        }
    }
}

impl PollMiss {
    fn is_retryable(&self) -> bool {
        match self {
            Self::NotYetConfirmed(_) => true,
            Self::Ledger(e) => e.class().is_retryable(),
        }
    }
}

/// Polls a ledger until a transaction's first transition has outputs.
///
/// Each poll is one `get_transaction` call; polls are sequential and
/// spaced by the poller's own [`RetryPolicy`], independent of whatever
/// policy other call sites use.
#[derive(Debug, Clone, Default)]
pub struct ConfirmationPoller {
    policy: RetryPolicy,
}

impl ConfirmationPoller {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Waits for `tx_id` to be confirmed.
    ///
    /// # Errors
    /// - [`ConfirmationError::Timeout`] when the attempt budget runs out
    ///   while the transaction is missing, pending, or the node is
    ///   unreachable.
    /// - [`ConfirmationError::Ledger`] on a permanent ledger error.
    pub async fn await_confirmation<L: LedgerClient>(
        &self,
        ledger: &L,
        tx_id: &TransactionId,
    ) -> Result<ConfirmedTransaction, ConfirmationError> {
        let span = tracing::debug_span!("await_confirmation", %tx_id);
        let result = retry_if(
            &self.policy,
            || async move {
                trace!(%tx_id, "polling transaction");
                match ledger.get_transaction(tx_id).await {
                    Ok(Some(tx)) => ConfirmedTransaction::from_transaction(tx)
                        .ok_or(PollMiss::NotYetConfirmed(PendingStatus::Pending)),
                    Ok(None) => Err(PollMiss::NotYetConfirmed(PendingStatus::Unknown)),
                    Err(e) => Err(PollMiss::Ledger(e)),
                }
            },
            PollMiss::is_retryable,
        )
        .instrument(span)
        .await;

        match result {
            Ok(confirmed) => {
                info!(
                    %tx_id,
                    outputs = confirmed.outputs().len(),
                    "transaction confirmed"
                );
                Ok(confirmed)
            }
            Err(RetryError::Exhausted { attempts, source }) => {
                let status = match source {
                    PollMiss::NotYetConfirmed(status) => status,
                    PollMiss::Ledger(_) => PendingStatus::Unreachable,
                };
                debug!(%tx_id, attempts, %status, "confirmation timed out");
                Err(ConfirmationError::Timeout {
                    tx_id: tx_id.clone(),
                    attempts,
                    status,
                })
            }
            Err(RetryError::Aborted { source, .. }) => match source {
                PollMiss::Ledger(source) => Err(ConfirmationError::Ledger {
                    tx_id: tx_id.clone(),
                    source,
                }),
                // Pending is always retried, so it can only end by exhaustion.
                PollMiss::NotYetConfirmed(status) => Err(ConfirmationError::Timeout {
                    tx_id: tx_id.clone(),
                    attempts: 1,
                    status,
                }),
            },
        }
    }
}

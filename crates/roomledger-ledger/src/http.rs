//! REST client for a ledger node.
//!
//! Endpoints (relative to `{endpoint}/{network}`):
//!
//! | call | method | path |
//! |---|---|---|
//! | submit | `POST` | `transaction/broadcast` |
//! | fetch | `GET` | `transaction/{id}` |
//! | mapping | `GET` | `program/{program}/mapping/{mapping}/{key}` |

use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, trace};
use url::Url;

use crate::{LedgerClient, LedgerError, SignedTransaction, Transaction, TransactionId};

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A [`LedgerClient`] speaking the node's REST API.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpLedgerClient {
    http: reqwest::Client,
    base: Url,
}

impl HttpLedgerClient {
    /// Creates a client for `endpoint` (e.g. `http://localhost:3030`)
    /// and `network` (e.g. `testnet`).
    pub fn new(endpoint: &str, network: &str) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        Self::with_client(http, endpoint, network)
    }

    /// Like [`new`](Self::new), with a caller-configured `reqwest` client.
    pub fn with_client(
        http: reqwest::Client,
        endpoint: &str,
        network: &str,
    ) -> Result<Self, LedgerError> {
        let mut base = Url::parse(endpoint)
            .map_err(|e| LedgerError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(LedgerError::InvalidEndpoint(format!(
                "unsupported scheme {} (expected http or https)",
                base.scheme()
            )));
        }
        base.path_segments_mut()
            .map_err(|_| LedgerError::InvalidEndpoint(endpoint.to_string()))?
            .pop_if_empty()
            .push(network);
        Ok(Self { http, base })
    }

    /// The `{endpoint}/{network}` prefix every request is built on.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, segments: &[&str]) -> Result<Url, LedgerError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| LedgerError::InvalidEndpoint(self.base.to_string()))?
            .extend(segments);
        Ok(url)
    }

    /// Sends a GET and returns the body, or `None` on 404.
    async fn get_optional(&self, url: Url) -> Result<Option<String>, LedgerError> {
        trace!(%url, "GET");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LedgerError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(Some(body))
    }
}

impl LedgerClient for HttpLedgerClient {
    async fn submit_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> Result<TransactionId, LedgerError> {
        let url = self.url(&["transaction", "broadcast"])?;
        debug!(%url, "broadcasting transaction");
        let response = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(transaction.payload().to_string())
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LedgerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // Nodes answer with the id as a JSON string; tolerate a bare id.
        let id = serde_json::from_str::<String>(&body)
            .unwrap_or_else(|_| body.trim().to_string());
        if id.is_empty() {
            return Err(LedgerError::InvalidResponse(
                "broadcast returned an empty transaction id".into(),
            ));
        }
        Ok(TransactionId::new(id))
    }

    async fn get_transaction(
        &self,
        id: &TransactionId,
    ) -> Result<Option<Transaction>, LedgerError> {
        let url = self.url(&["transaction", id.as_str()])?;
        let Some(body) = self.get_optional(url).await? else {
            return Ok(None);
        };
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| LedgerError::InvalidResponse(format!("transaction {id}: {e}")))
    }

    async fn get_mapping_value(
        &self,
        program_id: &str,
        mapping: &str,
        key: &str,
    ) -> Result<Option<String>, LedgerError> {
        let url = self.url(&["program", program_id, "mapping", mapping, key])?;
        let Some(body) = self.get_optional(url).await? else {
            return Ok(None);
        };
        let value: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            LedgerError::InvalidResponse(format!("mapping {mapping}[{key}]: {e}"))
        })?;
        Ok(match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }
}

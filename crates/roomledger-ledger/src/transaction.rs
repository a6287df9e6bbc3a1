//! Transactions as submitted to and returned by a ledger node.

use std::fmt;

use roomledger_protocol::Address;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity and signing
// ---------------------------------------------------------------------------

/// A private key in the SDK's string encoding.
///
/// `Debug` never prints the key, and there is no `Serialize` impl.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct PrivateKey(String);

impl PrivateKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the raw key. Only the transaction builder should call this.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// The identity a transaction is signed with.
///
/// Passed explicitly to every room operation; nothing in Roomledger keeps
/// an "active account".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signer {
    address: Address,
    private_key: PrivateKey,
}

impl Signer {
    pub fn new(address: Address, private_key: PrivateKey) -> Self {
        Self {
            address,
            private_key,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }
}

/// Transaction fee, in credits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fee {
    pub credits: f64,
    /// Pay from a private record instead of the public balance.
    pub private: bool,
}

impl Default for Fee {
    fn default() -> Self {
        Self {
            credits: 0.02,
            private: false,
        }
    }
}

/// Everything the builder needs to produce one program execution.
#[derive(Debug, Clone)]
pub struct ExecutionRequest<'a> {
    pub program_id: &'a str,
    pub function_name: &'a str,
    /// Inputs already rendered in literal syntax (`100u64`, `aleo1...`).
    pub inputs: Vec<String>,
    pub fee: Fee,
    pub signer: &'a Signer,
}

/// A built, signed transaction ready for broadcast. Opaque to Roomledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction(String);

impl SignedTransaction {
    pub fn new(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    /// The serialized transaction as sent to the node.
    pub fn payload(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Node responses
// ---------------------------------------------------------------------------

/// Identifier assigned to a transaction at submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A transaction as reported by the node.
///
/// Only the fields Roomledger reads are modelled; anything else in the
/// node's JSON is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub execution: Option<Execution>,
}

impl Transaction {
    /// Outputs of the first transition, if it has any.
    pub fn first_outputs(&self) -> Option<&[Output]> {
        self.execution
            .as_ref()?
            .transitions
            .first()
            .map(|t| t.outputs.as_slice())
            .filter(|outputs| !outputs.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Execution {
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Transition {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub program: String,
    #[serde(default)]
    pub function: String,
    #[serde(default)]
    pub outputs: Vec<Output>,
}

/// One output of a transition.
///
/// `value` holds a plaintext literal for public outputs and an opaque
/// ciphertext (`record1...`) for private records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Output {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// A transaction whose first transition is known to have outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedTransaction(Transaction);

impl ConfirmedTransaction {
    /// Wraps `transaction` if it has confirmed outputs.
    pub fn from_transaction(transaction: Transaction) -> Option<Self> {
        transaction.first_outputs()?;
        Some(Self(transaction))
    }

    pub fn id(&self) -> &TransactionId {
        &self.0.id
    }

    /// Outputs of the first transition. Never empty.
    pub fn outputs(&self) -> &[Output] {
        self.0.first_outputs().unwrap_or_default()
    }

    pub fn transaction(&self) -> &Transaction {
        &self.0
    }

    pub fn into_inner(self) -> Transaction {
        self.0
    }
}

//! Error types for the protocol layer.
//!
//! Each crate in Roomledger defines its own error enum. A `ProtocolError`
//! always means the problem is in the shape of a record or a wire string,
//! never in networking or in the room program's rules.

/// Errors that can occur while encoding or decoding room records.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization to JSON failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The JSON payload is malformed, truncated, or is missing a
    /// required field.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The plaintext struct literal could not be parsed.
    ///
    /// `offset` is the byte position in the input where parsing stopped.
    #[error("malformed plaintext at byte {offset}: {reason}")]
    Syntax {
        offset: usize,
        reason: String,
    },

    /// A required field is absent from a decoded struct.
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// A field that the record does not declare was present.
    #[error("unknown field `{0}`")]
    UnknownField(String),

    /// A field held a value of the wrong type (e.g. `4u64` where a `u8`
    /// is declared, or an array where an address is expected).
    #[error("field `{field}`: expected {expected}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
    },

    /// A literal does not fit in its declared integer width.
    #[error("integer literal `{0}` out of range")]
    IntegerOverflow(String),

    /// The record parsed but violates a structural invariant
    /// (e.g. `num_joined_users` disagrees with `joined_users`).
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

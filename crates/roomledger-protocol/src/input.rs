//! Typed program inputs.
//!
//! The transaction builder takes its inputs as strings in the ledger's
//! literal syntax: integers carry a width suffix (`100u64`, `7u32`,
//! `4u8`) and addresses are passed in canonical form.

use std::fmt;

use crate::{Address, RoomId};

/// A single typed input to a program function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    U8(u8),
    U32(u32),
    U64(u64),
    Address(Address),
    /// A pre-encoded literal (e.g. a struct produced by a codec).
    Literal(String),
}

impl Input {
    /// Renders a whole argument list.
    pub fn render_all(inputs: &[Input]) -> Vec<String> {
        inputs.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8(v) => write!(f, "{v}u8"),
            Self::U32(v) => write!(f, "{v}u32"),
            Self::U64(v) => write!(f, "{v}u64"),
            Self::Address(a) => f.write_str(a.as_str()),
            Self::Literal(s) => f.write_str(s),
        }
    }
}

impl From<RoomId> for Input {
    fn from(id: RoomId) -> Self {
        Self::U32(id.0)
    }
}

impl From<Address> for Input {
    fn from(a: Address) -> Self {
        Self::Address(a)
    }
}

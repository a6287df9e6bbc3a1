//! The ledger's plaintext struct literal format.
//!
//! Nodes return public outputs and mapping values as struct literals:
//!
//! ```text
//! {
//!   big_blind: 100u64,
//!   big_blind_seat: 1u8,
//!   ...
//!   joined_users: [
//!     {
//!       player_address: aleo1...,
//!       bet: 200u64
//!     }
//!   ],
//!   ...
//! }
//! ```
//!
//! [`PlaintextCodec`] parses this into a small value tree and then maps
//! the tree onto [`RoomConfig`] field by field. Every integer must carry
//! the suffix matching its declared width; a missing, unknown or
//! mistyped field is an error.
//!
//! Addresses are bare `aleo1...` identifiers. [`PlaintextCodec::encode`]
//! refuses any address that would not read back unchanged, such as one
//! with a `.private` tag or without the `aleo1` prefix.

use std::str::FromStr;

use crate::{
    Address, PlayerRoomConfig, ProtocolError, RoomCodec, RoomConfig, RoomId,
};

/// A [`RoomCodec`] for the ledger's struct literal syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextCodec;

impl RoomCodec for PlaintextCodec {
    fn encode(&self, config: &RoomConfig) -> Result<String, ProtocolError> {
        for user in &config.joined_users {
            check_address(&user.player_address, "player_address")?;
        }
        check_address(
            &config.game_state_manager_address,
            "game_state_manager_address",
        )?;

        let users = config
            .joined_users
            .iter()
            .map(|u| {
                format!(
                    "{{ player_address: {}, bet: {}u64 }}",
                    u.player_address, u.bet
                )
            })
            .collect::<Vec<_>>();
        let users = if users.is_empty() {
            "[]".to_string()
        } else {
            format!("[ {} ]", users.join(", "))
        };

        Ok(format!(
            "{{ big_blind: {}u64, big_blind_seat: {}u8, small_blind: {}u64, \
             small_blind_seat: {}u8, dealer_seat: {}u8, min_stack: {}u64, \
             seats: {}u8, room_id: {}u32, joined_users: {}, \
             num_joined_users: {}u8, game_state_manager_address: {} }}",
            config.big_blind,
            config.big_blind_seat,
            config.small_blind,
            config.small_blind_seat,
            config.dealer_seat,
            config.min_stack,
            config.seats,
            config.room_id.0,
            users,
            config.num_joined_users,
            config.game_state_manager_address,
        ))
    }

    fn decode(&self, wire: &str) -> Result<RoomConfig, ProtocolError> {
        let value = Parser::new(wire).parse_document()?;
        let mut fields = Fields::from_value(value, "room config")?;

        let config = RoomConfig {
            big_blind: fields.uint("big_blind", "u64")?,
            big_blind_seat: fields.uint("big_blind_seat", "u8")?,
            small_blind: fields.uint("small_blind", "u64")?,
            small_blind_seat: fields.uint("small_blind_seat", "u8")?,
            dealer_seat: fields.uint("dealer_seat", "u8")?,
            min_stack: fields.uint("min_stack", "u64")?,
            seats: fields.uint("seats", "u8")?,
            room_id: RoomId(fields.uint("room_id", "u32")?),
            joined_users: fields.players("joined_users")?,
            num_joined_users: fields.uint("num_joined_users", "u8")?,
            game_state_manager_address: fields
                .address("game_state_manager_address")?,
        };
        fields.finish()?;
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Value tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Literal(String),
    Struct(Vec<(String, Value)>),
    Array(Vec<Value>),
}

/// Field-by-field extraction from a parsed struct.
struct Fields {
    entries: Vec<(String, Value)>,
}

impl Fields {
    fn from_value(
        value: Value,
        field: &'static str,
    ) -> Result<Self, ProtocolError> {
        match value {
            Value::Struct(entries) => Ok(Self { entries }),
            _ => Err(ProtocolError::TypeMismatch {
                field,
                expected: "struct",
            }),
        }
    }

    fn take(&mut self, name: &'static str) -> Result<Value, ProtocolError> {
        let idx = self
            .entries
            .iter()
            .position(|(k, _)| k == name)
            .ok_or(ProtocolError::MissingField(name))?;
        Ok(self.entries.remove(idx).1)
    }

    fn literal(
        &mut self,
        name: &'static str,
        expected: &'static str,
    ) -> Result<String, ProtocolError> {
        match self.take(name)? {
            Value::Literal(s) => Ok(s),
            _ => Err(ProtocolError::TypeMismatch {
                field: name,
                expected,
            }),
        }
    }

    fn uint<T: FromStr>(
        &mut self,
        name: &'static str,
        suffix: &'static str,
    ) -> Result<T, ProtocolError> {
        let lit = self.literal(name, suffix)?;
        let digits = lit
            .strip_suffix(suffix)
            .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
            .ok_or(ProtocolError::TypeMismatch {
                field: name,
                expected: suffix,
            })?;
        digits
            .parse::<T>()
            .map_err(|_| ProtocolError::IntegerOverflow(lit.clone()))
    }

    fn address(&mut self, name: &'static str) -> Result<Address, ProtocolError> {
        let lit = self.literal(name, "address")?;
        let address = Address::new(lit);
        check_address(&address, name)?;
        Ok(address)
    }

    fn players(
        &mut self,
        name: &'static str,
    ) -> Result<Vec<PlayerRoomConfig>, ProtocolError> {
        let items = match self.take(name)? {
            Value::Array(items) => items,
            _ => {
                return Err(ProtocolError::TypeMismatch {
                    field: name,
                    expected: "array",
                })
            }
        };
        items
            .into_iter()
            .map(|item| {
                let mut player = Fields::from_value(item, name)?;
                let parsed = PlayerRoomConfig {
                    player_address: player.address("player_address")?,
                    bet: player.uint("bet", "u64")?,
                };
                player.finish()?;
                Ok(parsed)
            })
            .collect()
    }

    /// Fails if any field was left unconsumed.
    fn finish(self) -> Result<(), ProtocolError> {
        match self.entries.into_iter().next() {
            Some((name, _)) => Err(ProtocolError::UnknownField(name)),
            None => Ok(()),
        }
    }
}

fn check_address(address: &Address, field: &'static str) -> Result<(), ProtocolError> {
    let s = address.as_str();
    let plain = s.len() > "aleo1".len()
        && s.starts_with("aleo1")
        && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if plain {
        Ok(())
    } else {
        Err(ProtocolError::TypeMismatch {
            field,
            expected: "address",
        })
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Deepest struct/array nesting accepted. A room record needs three.
const MAX_DEPTH: usize = 16;

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src: src.as_bytes(),
            pos: 0,
            depth: 0,
        }
    }

    fn parse_document(mut self) -> Result<Value, ProtocolError> {
        let value = self.parse_value()?;
        self.skip_ws();
        if self.pos != self.src.len() {
            return Err(self.error("trailing characters"));
        }
        Ok(value)
    }

    fn parse_value(&mut self) -> Result<Value, ProtocolError> {
        self.skip_ws();
        match self.peek() {
            Some(b'{') => self.nested(Self::parse_struct),
            Some(b'[') => self.nested(Self::parse_array),
            Some(_) => self.parse_literal().map(Value::Literal),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<Value, ProtocolError>,
    ) -> Result<Value, ProtocolError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn parse_struct(&mut self) -> Result<Value, ProtocolError> {
        self.expect(b'{')?;
        let mut entries = Vec::new();
        loop {
            self.skip_ws();
            if self.eat(b'}') {
                return Ok(Value::Struct(entries));
            }
            let key = self.parse_ident()?;
            self.skip_ws();
            self.expect(b':')?;
            let value = self.parse_value()?;
            entries.push((key, value));
            self.skip_ws();
            if !self.eat(b',') {
                self.skip_ws();
                self.expect(b'}')?;
                return Ok(Value::Struct(entries));
            }
        }
    }

    fn parse_array(&mut self) -> Result<Value, ProtocolError> {
        self.expect(b'[')?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.eat(b']') {
                return Ok(Value::Array(items));
            }
            items.push(self.parse_value()?);
            self.skip_ws();
            if !self.eat(b',') {
                self.skip_ws();
                self.expect(b']')?;
                return Ok(Value::Array(items));
            }
        }
    }

    fn parse_ident(&mut self) -> Result<String, ProtocolError> {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'_')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected identifier"));
        }
        Ok(String::from_utf8_lossy(&self.src[start..self.pos]).into_owned())
    }

    fn parse_literal(&mut self) -> Result<String, ProtocolError> {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(b) if b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
        ) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected literal"));
        }
        let raw = String::from_utf8_lossy(&self.src[start..self.pos]);
        // Outputs may carry a visibility tag, e.g. `100u64.public`.
        let lit = raw
            .strip_suffix(".public")
            .or_else(|| raw.strip_suffix(".private"))
            .unwrap_or(&*raw);
        Ok(lit.to_string())
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), ProtocolError> {
        if self.eat(byte) {
            Ok(())
        } else {
            Err(self.error(&format!("expected `{}`", byte as char)))
        }
    }

    fn error(&self, reason: &str) -> ProtocolError {
        ProtocolError::Syntax {
            offset: self.pos,
            reason: reason.to_string(),
        }
    }
}

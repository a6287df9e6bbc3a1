//! Codec trait and implementations for the room record.
//!
//! A "codec" converts between a [`RoomConfig`] and the string the ledger
//! stores or returns. The room orchestrator doesn't care HOW a room is
//! serialized, only that it can hand a snapshot to the program and read
//! one back. Two implementations exist:
//!
//! - [`JsonCodec`]: plain JSON, for clients that exchange rooms as JSON.
//! - [`PlaintextCodec`](crate::PlaintextCodec): the ledger's own struct
//!   literal syntax, which is what a real node returns for mapping values.

use crate::{ProtocolError, RoomConfig};

/// Encodes a room to its wire string and decodes it back.
///
/// Implementations must satisfy `decode(encode(x)) == x` for every room
/// that passes [`RoomConfig::validate`], with 64-bit fields preserved
/// exactly. `encode` may refuse a value its format cannot carry (such as
/// a malformed address) but must never change one silently. `decode` must reject missing fields rather than filling in
/// defaults, and must run [`RoomConfig::validate`] on the result.
pub trait RoomCodec: Send + Sync + 'static {
    /// Serializes a room.
    fn encode(&self, config: &RoomConfig) -> Result<String, ProtocolError>;

    /// Parses a room from its wire form.
    ///
    /// # Errors
    /// Any malformed, incomplete, or invariant-violating input.
    fn decode(&self, wire: &str) -> Result<RoomConfig, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`RoomCodec`] that uses JSON (via `serde_json`).
///
/// `serde_json` writes `u64` values as exact integer literals, so large
/// blinds and stacks survive the round trip without passing through a
/// float.
///
/// ```rust
/// use roomledger_protocol::{Address, JsonCodec, PlayerRoomConfig, RoomCodec, RoomConfig, RoomId};
///
/// let room = RoomConfig {
///     big_blind: 100,
///     big_blind_seat: 1,
///     small_blind: 50,
///     small_blind_seat: 0,
///     dealer_seat: 0,
///     min_stack: 1000,
///     seats: 4,
///     room_id: RoomId(1),
///     joined_users: vec![PlayerRoomConfig {
///         player_address: Address::new("aleo1host"),
///         bet: 200,
///     }],
///     num_joined_users: 1,
///     game_state_manager_address: Address::new("aleo1gsm"),
/// };
///
/// let wire = JsonCodec.encode(&room).unwrap();
/// assert_eq!(JsonCodec.decode(&wire).unwrap(), room);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl RoomCodec for JsonCodec {
    fn encode(&self, config: &RoomConfig) -> Result<String, ProtocolError> {
        serde_json::to_string(config).map_err(ProtocolError::Encode)
    }

    fn decode(&self, wire: &str) -> Result<RoomConfig, ProtocolError> {
        let config: RoomConfig =
            serde_json::from_str(wire).map_err(ProtocolError::Decode)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{Address, PlayerRoomConfig, RoomId};

    fn sample() -> RoomConfig {
        RoomConfig {
            big_blind: u64::MAX,
            big_blind_seat: 1,
            small_blind: 9_007_199_254_740_993, // 2^53 + 1: not representable as f64
            small_blind_seat: 0,
            dealer_seat: 3,
            min_stack: 1000,
            seats: 4,
            room_id: RoomId(u32::MAX),
            joined_users: vec![
                PlayerRoomConfig {
                    player_address: Address::new("aleo1alice"),
                    bet: 200,
                },
                PlayerRoomConfig {
                    player_address: Address::new("aleo1bob"),
                    bet: 250,
                },
            ],
            num_joined_users: 2,
            game_state_manager_address: Address::new("aleo1gsm"),
        }
    }

    #[test]
    fn test_json_round_trip_preserves_large_integers_and_order() {
        let room = sample();
        let wire = JsonCodec.encode(&room).unwrap();
        assert!(wire.contains("9007199254740993"));
        let decoded = JsonCodec.decode(&wire).unwrap();
        assert_eq!(decoded, room);
        assert_eq!(decoded.joined_users[1].player_address.as_str(), "aleo1bob");
    }

    #[test]
    fn test_json_decode_rejects_missing_field() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value.as_object_mut().unwrap().remove("min_stack");
        let wire = value.to_string();
        let err = JsonCodec.decode(&wire).unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
        assert!(err.to_string().contains("min_stack"));
    }

    #[test]
    fn test_json_decode_rejects_garbage() {
        assert!(matches!(
            JsonCodec.decode("not json"),
            Err(ProtocolError::Decode(_))
        ));
    }

    #[test]
    fn test_json_decode_rejects_inconsistent_count() {
        let mut room = sample();
        room.num_joined_users = 1;
        let wire = serde_json::to_string(&room).unwrap();
        assert!(matches!(
            JsonCodec.decode(&wire),
            Err(ProtocolError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_json_decode_rejects_out_of_range_seat() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["seats"] = serde_json::json!(300);
        assert!(JsonCodec.decode(&value.to_string()).is_err());
    }
}

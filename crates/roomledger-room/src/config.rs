//! Orchestrator configuration and room state machine.

use std::fmt;

use roomledger_protocol::RoomConfig;
use roomledger_retry::RetryPolicy;

// ---------------------------------------------------------------------------
// RoomManagerConfig
// ---------------------------------------------------------------------------

/// Settings for a [`RoomManager`](crate::RoomManager).
///
/// Confirmation polling and mapping lookups use separate policies: a
/// transaction can take many blocks to land, while a mapping read either
/// works or the node is down.
#[derive(Debug, Clone)]
pub struct RoomManagerConfig {
    /// Spacing and budget for `get_transaction` polls.
    pub confirmation_policy: RetryPolicy,

    /// Spacing and budget for `rooms` mapping reads.
    pub lookup_policy: RetryPolicy,

    /// Constraint on the bet a joining player may offer.
    pub bet_rule: BetRule,

    /// Refuse to request game creation unless the snapshot is full.
    /// The program checks this anyway; enabling it saves a fee.
    pub require_full_room: bool,
}

impl Default for RoomManagerConfig {
    fn default() -> Self {
        Self {
            confirmation_policy: RetryPolicy::default(),
            lookup_policy: RetryPolicy::default(),
            bet_rule: BetRule::Any,
            require_full_room: false,
        }
    }
}

// ---------------------------------------------------------------------------
// BetRule
// ---------------------------------------------------------------------------

/// How a joining player's bet must relate to the room.
///
/// Anything other than [`BetRule::Any`] costs one extra mapping read per
/// join, since the room has to be fetched before submitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BetRule {
    /// Any bet is accepted.
    #[default]
    Any,
    /// The bet must equal the host's bet.
    MatchHost,
    /// The bet must equal this amount.
    Exact(u64),
    /// The bet must be at least this amount.
    AtLeast(u64),
}

impl BetRule {
    /// Checks `bet` against `room`, returning the reason on failure.
    pub fn check(&self, room: &RoomConfig, bet: u64) -> Result<(), String> {
        match *self {
            Self::Any => Ok(()),
            Self::MatchHost => match room.host() {
                Some(host) if host.bet == bet => Ok(()),
                Some(host) => Err(format!("host bet is {}", host.bet)),
                None => Err("room has no host".into()),
            },
            Self::Exact(amount) if bet == amount => Ok(()),
            Self::Exact(amount) => Err(format!("bet must be exactly {amount}")),
            Self::AtLeast(min) if bet >= min => Ok(()),
            Self::AtLeast(min) => Err(format!("bet must be at least {min}")),
        }
    }

    /// Returns `true` if checking this rule needs the room's current state.
    pub fn needs_room(&self) -> bool {
        !matches!(self, Self::Any)
    }
}

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a room.
///
/// ```text
/// Uncreated → Open(1/seats) → … → Full(seats/seats) → GameRequested
/// ```
///
/// Membership is append-only and a room never leaves `GameRequested`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    Uncreated,
    Open { joined: u8, seats: u8 },
    Full { seats: u8 },
    GameRequested,
}

impl RoomPhase {
    /// The phase implied by a room read from the ledger.
    ///
    /// A room record alone cannot show whether a game was requested, so
    /// this never returns [`RoomPhase::GameRequested`].
    pub fn of(room: Option<&RoomConfig>) -> Self {
        match room {
            None => Self::Uncreated,
            Some(room) if room.is_full() => Self::Full { seats: room.seats },
            Some(room) => Self::Open {
                joined: room.num_joined_users,
                seats: room.seats,
            },
        }
    }

    /// Returns `true` if another player may join.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// The phase after one more player joins, or `None` if joining is
    /// not possible.
    pub fn next_after_join(self) -> Option<Self> {
        match self {
            Self::Open { joined, seats } => {
                let joined = joined.checked_add(1)?;
                Some(if joined >= seats {
                    Self::Full { seats }
                } else {
                    Self::Open { joined, seats }
                })
            }
            _ => None,
        }
    }

    /// Returns `true` if moving to `target` is a legal single step.
    pub fn can_transition_to(self, target: Self) -> bool {
        match (self, target) {
            (Self::Uncreated, Self::Open { joined: 1, seats }) => seats > 1,
            (Self::Uncreated, Self::Full { seats: 1 }) => true,
            (Self::Open { .. }, _) => self.next_after_join() == Some(target),
            (Self::Full { .. }, Self::GameRequested) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uncreated => write!(f, "Uncreated"),
            Self::Open { joined, seats } => write!(f, "Open({joined}/{seats})"),
            Self::Full { seats } => write!(f, "Full({seats}/{seats})"),
            Self::GameRequested => write!(f, "GameRequested"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomledger_protocol::{Address, PlayerRoomConfig, RoomId};

    fn room(bets: &[u64], seats: u8) -> RoomConfig {
        let joined_users: Vec<_> = bets
            .iter()
            .enumerate()
            .map(|(i, &bet)| PlayerRoomConfig {
                player_address: Address::new(format!("aleo1player{i}")),
                bet,
            })
            .collect();
        RoomConfig {
            big_blind: 100,
            big_blind_seat: 2,
            small_blind: 50,
            small_blind_seat: 1,
            dealer_seat: 0,
            min_stack: 1000,
            seats,
            room_id: RoomId(1),
            num_joined_users: joined_users.len() as u8,
            joined_users,
            game_state_manager_address: Address::new("aleo1gsm"),
        }
    }

    #[test]
    fn test_phase_of_room() {
        assert_eq!(RoomPhase::of(None), RoomPhase::Uncreated);
        assert_eq!(
            RoomPhase::of(Some(&room(&[200], 4))),
            RoomPhase::Open { joined: 1, seats: 4 }
        );
        assert_eq!(
            RoomPhase::of(Some(&room(&[200; 4], 4))),
            RoomPhase::Full { seats: 4 }
        );
    }

    #[test]
    fn test_join_fills_room() {
        let phase = RoomPhase::Open { joined: 3, seats: 4 };
        assert_eq!(phase.next_after_join(), Some(RoomPhase::Full { seats: 4 }));
        assert_eq!(RoomPhase::Full { seats: 4 }.next_after_join(), None);
        assert_eq!(RoomPhase::GameRequested.next_after_join(), None);
    }

    #[test]
    fn test_transitions_are_strictly_ordered() {
        let open1 = RoomPhase::Open { joined: 1, seats: 4 };
        let open2 = RoomPhase::Open { joined: 2, seats: 4 };
        assert!(RoomPhase::Uncreated.can_transition_to(open1));
        assert!(open1.can_transition_to(open2));
        assert!(!open1.can_transition_to(RoomPhase::Full { seats: 4 }));
        assert!(!open2.can_transition_to(RoomPhase::GameRequested));
        assert!(RoomPhase::Full { seats: 4 }.can_transition_to(RoomPhase::GameRequested));
        assert!(!RoomPhase::GameRequested.can_transition_to(open1));
    }

    #[test]
    fn test_only_open_rooms_are_joinable() {
        assert!(RoomPhase::Open { joined: 1, seats: 2 }.is_joinable());
        assert!(!RoomPhase::Uncreated.is_joinable());
        assert!(!RoomPhase::Full { seats: 2 }.is_joinable());
        assert!(!RoomPhase::GameRequested.is_joinable());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(RoomPhase::Open { joined: 2, seats: 4 }.to_string(), "Open(2/4)");
        assert_eq!(RoomPhase::Full { seats: 4 }.to_string(), "Full(4/4)");
    }

    #[test]
    fn test_bet_rules() {
        let r = room(&[200], 4);
        assert!(BetRule::Any.check(&r, 1).is_ok());
        assert!(BetRule::MatchHost.check(&r, 200).is_ok());
        assert!(BetRule::MatchHost.check(&r, 150).is_err());
        assert!(BetRule::Exact(300).check(&r, 300).is_ok());
        assert!(BetRule::Exact(300).check(&r, 200).is_err());
        assert!(BetRule::AtLeast(100).check(&r, 100).is_ok());
        assert!(BetRule::AtLeast(100).check(&r, 99).is_err());
        assert!(!BetRule::Any.needs_room());
        assert!(BetRule::MatchHost.needs_room());
    }

    #[test]
    fn test_config_defaults() {
        let config = RoomManagerConfig::default();
        assert_eq!(config.bet_rule, BetRule::Any);
        assert!(!config.require_full_room);
        assert_eq!(config.confirmation_policy.max_attempts, 5);
    }
}

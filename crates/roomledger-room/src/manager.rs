//! Room manager: drives rooms through their on-chain lifecycle.

use roomledger_ledger::{
    functions, ConfirmationPoller, ConfirmedTransaction, ExecutionRequest, Fee,
    LedgerClient, Signer, TransactionBuilder, ROOMS_MAPPING, ROOM_MANAGER_PROGRAM,
};
use roomledger_protocol::{
    Address, DeckCreationRequest, Input, PlaintextCodec, RecordWithCiphertext,
    RoomCodec, RoomConfig, RoomConfigRequest, RoomId,
};
use roomledger_retry::{retry, RetryError};
use tracing::{debug, info, warn};

use crate::{RoomError, RoomManagerConfig, RoomPhase};

/// Everything produced by a successful game creation request.
#[derive(Debug, Clone)]
pub struct GameCreation {
    /// The room snapshot handed to the dealer (output 0).
    pub room_config_request: RecordWithCiphertext<RoomConfigRequest>,
    /// The dealer's request to build a deck for the room (output 1).
    pub deck_request: RecordWithCiphertext<DeckCreationRequest>,
    /// The confirmed transaction the records came from.
    pub transaction: ConfirmedTransaction,
}

/// Issues room operations against a ledger.
///
/// The manager holds no per-room or per-player state: the signing
/// identity is passed to every call and rooms are always read back from
/// the ledger. One manager can therefore be shared across tasks behind
/// an `Arc`.
///
/// Every operation is all-or-nothing. A failure at any step (build,
/// submit, confirm, decode) is returned as-is and nothing is resubmitted.
pub struct RoomManager<L, B, C = PlaintextCodec> {
    ledger: L,
    builder: B,
    codec: C,
    poller: ConfirmationPoller,
    config: RoomManagerConfig,
}

impl<L, B, C> RoomManager<L, B, C>
where
    L: LedgerClient,
    B: TransactionBuilder,
    C: RoomCodec,
{
    pub fn new(ledger: L, builder: B, codec: C, config: RoomManagerConfig) -> Self {
        let poller = ConfirmationPoller::new(config.confirmation_policy.clone());
        Self {
            ledger,
            builder,
            codec,
            poller,
            config,
        }
    }

    pub fn config(&self) -> &RoomManagerConfig {
        &self.config
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Creates a room with `signer` as host and first member.
    ///
    /// Returns the room as written by the program: one member, the host,
    /// with `host_bet`. A room that comes back any other way is a
    /// [`RoomError::MalformedResponse`].
    #[allow(clippy::too_many_arguments)]
    pub async fn create_room(
        &self,
        signer: &Signer,
        big_blind: u64,
        small_blind: u64,
        min_stack: u64,
        seats: u8,
        host_bet: u64,
        fee: Fee,
    ) -> Result<RoomConfig, RoomError> {
        let inputs = [
            Input::U64(big_blind),
            Input::U64(small_blind),
            Input::U64(min_stack),
            Input::U8(seats),
            Input::U64(host_bet),
        ];
        let confirmed = self
            .execute(signer, functions::CREATE_ROOM, &inputs, fee)
            .await?;

        let value = output_value(&confirmed, 0)?;
        let room = self.codec.decode(value)?;
        let hosted_alone = matches!(
            room.joined_users.as_slice(),
            [host] if &host.player_address == signer.address() && host.bet == host_bet
        );
        if !hosted_alone || room.seats != seats {
            return Err(RoomError::MalformedResponse {
                tx_id: confirmed.id().clone(),
                reason: format!(
                    "created room {} does not match the request (seats {}, {} members)",
                    room.room_id, room.seats, room.num_joined_users
                ),
            });
        }
        info!(
            room_id = %room.room_id,
            host = %signer.address(),
            seats = room.seats,
            "room created"
        );
        Ok(room)
    }

    /// Adds `signer` to `room_id` with `bet`.
    ///
    /// When the configured [`BetRule`](crate::BetRule) is not `Any`, the
    /// room is fetched first and a bet that breaks the rule is rejected
    /// without submitting anything.
    pub async fn join_room(
        &self,
        signer: &Signer,
        room_id: RoomId,
        bet: u64,
        fee: Fee,
    ) -> Result<(), RoomError> {
        if self.config.bet_rule.needs_room() {
            let room = self
                .get_room(room_id)
                .await?
                .ok_or(RoomError::NotFound(room_id))?;
            let phase = RoomPhase::of(Some(&room));
            if !phase.is_joinable() {
                return Err(RoomError::InvalidState(format!(
                    "room {room_id} is {phase}"
                )));
            }
            self.config
                .bet_rule
                .check(&room, bet)
                .map_err(|reason| RoomError::BetRejected {
                    room_id,
                    bet,
                    reason,
                })?;
        }

        let inputs = [Input::from(room_id), Input::U64(bet)];
        self.execute(signer, functions::JOIN_ROOM, &inputs, fee)
            .await?;
        info!(%room_id, player = %signer.address(), bet, "joined room");
        Ok(())
    }

    /// Asks `dealer` to start a game for the room described by `snapshot`.
    ///
    /// The program compares `snapshot` with its stored room, so callers
    /// should pass the result of a fresh [`get_room`](Self::get_room).
    /// The two returned records are built from the known inputs; only
    /// their ciphertexts come from the transaction.
    pub async fn request_game_creation(
        &self,
        signer: &Signer,
        room_id: RoomId,
        snapshot: &RoomConfig,
        dealer: &Address,
        fee: Fee,
    ) -> Result<GameCreation, RoomError> {
        if self.config.require_full_room {
            let phase = RoomPhase::of(Some(snapshot));
            if !phase.can_transition_to(RoomPhase::GameRequested) {
                return Err(RoomError::InvalidState(format!(
                    "room {room_id} is {phase}, not full"
                )));
            }
        }

        let encoded = self.codec.encode(snapshot)?;
        let inputs = [
            Input::from(room_id),
            Input::Literal(encoded),
            Input::Address(dealer.clone()),
        ];
        let confirmed = self
            .execute(signer, functions::REQUEST_GAME_CREATION, &inputs, fee)
            .await?;

        let outputs = confirmed.outputs();
        if outputs.len() < 2 {
            return Err(RoomError::MalformedResponse {
                tx_id: confirmed.id().clone(),
                reason: format!("expected at least 2 outputs, got {}", outputs.len()),
            });
        }
        let room_config_ciphertext = output_value(&confirmed, 0)?.to_string();
        let deck_ciphertext = output_value(&confirmed, 1)?.to_string();

        let room_config_request = RecordWithCiphertext {
            data: RoomConfigRequest {
                room_id,
                room_config: snapshot.clone(),
                owner: dealer.clone(),
            },
            ciphertext: room_config_ciphertext,
        };
        let deck_request = RecordWithCiphertext {
            data: DeckCreationRequest {
                owner: dealer.clone(),
                room_id,
                player_addresses: snapshot.player_addresses(),
            },
            ciphertext: deck_ciphertext,
        };
        info!(%room_id, %dealer, tx_id = %confirmed.id(), "game creation requested");

        Ok(GameCreation {
            room_config_request,
            deck_request,
            transaction: confirmed,
        })
    }

    /// Reads a room from the `rooms` mapping.
    ///
    /// Returns `Ok(None)` if no room has this id. Transient read failures
    /// are retried under the lookup policy.
    pub async fn get_room(&self, room_id: RoomId) -> Result<Option<RoomConfig>, RoomError> {
        let key = Input::from(room_id).to_string();
        let value = retry(&self.config.lookup_policy, || {
            self.ledger
                .get_mapping_value(ROOM_MANAGER_PROGRAM, ROOMS_MAPPING, &key)
        })
        .await
        .map_err(|e| {
            if let RetryError::Exhausted { attempts, .. } = &e {
                warn!(%room_id, attempts, "room lookup gave up");
            }
            e.into_inner()
        })?;

        match value {
            Some(value) => {
                let room = self.codec.decode(&value)?;
                if room.room_id != room_id {
                    return Err(RoomError::UnexpectedRoom {
                        room_id,
                        found: room.room_id,
                    });
                }
                debug!(%room_id, joined = room.num_joined_users, "room fetched");
                Ok(Some(room))
            }
            None => {
                debug!(%room_id, "no such room");
                Ok(None)
            }
        }
    }

    /// Build, sign, submit, confirm.
    async fn execute(
        &self,
        signer: &Signer,
        function: &'static str,
        inputs: &[Input],
        fee: Fee,
    ) -> Result<ConfirmedTransaction, RoomError> {
        let request = ExecutionRequest {
            program_id: ROOM_MANAGER_PROGRAM,
            function_name: function,
            inputs: Input::render_all(inputs),
            fee,
            signer,
        };
        let transaction = self.builder.build_execution(request).await?;
        let tx_id = self.ledger.submit_transaction(&transaction).await?;
        info!(%tx_id, function, signer = %signer.address(), "transaction submitted");

        let confirmed = self.poller.await_confirmation(&self.ledger, &tx_id).await?;
        Ok(confirmed)
    }
}

fn output_value(confirmed: &ConfirmedTransaction, index: usize) -> Result<&str, RoomError> {
    let malformed = |reason: String| RoomError::MalformedResponse {
        tx_id: confirmed.id().clone(),
        reason,
    };
    confirmed
        .outputs()
        .get(index)
        .ok_or_else(|| malformed(format!("missing output {index}")))?
        .value
        .as_deref()
        .ok_or_else(|| malformed(format!("output {index} has no value")))
}

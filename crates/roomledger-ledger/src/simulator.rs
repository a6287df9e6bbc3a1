//! An in-memory ledger running the room manager program.
//!
//! [`SimulatedLedger`] implements both [`LedgerClient`] and
//! [`TransactionBuilder`]. It executes `rm_create_room`, `rm_join_room`
//! and `rm_request_game_creation` with the program's rules, stores rooms
//! in a `rooms` mapping, and withholds outputs from `get_transaction`
//! until a configurable number of polls have happened, the way a real
//! node does until the transaction lands in a block.
//!
//! Handles are cheap to clone and share one state, so a test can keep a
//! handle for inspection after passing another to the orchestrator.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::Rng;
use roomledger_protocol::{
    Address, PlaintextCodec, PlayerRoomConfig, RoomCodec, RoomConfig, RoomId,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    functions, ExecutionRequest, Execution, LedgerClient, LedgerError, Output,
    PrivateKey, SignedTransaction, Signer, Transaction, TransactionBuilder,
    TransactionId, Transition, CREDITS_PROGRAM, ROOMS_MAPPING, ROOM_MANAGER_PROGRAM,
};

const BECH32_CHARSET: &[u8] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const BASE58_CHARSET: &[u8] =
    b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Behaviour knobs for the simulated node and program.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// `get_transaction` calls needed before outputs appear. `1` means
    /// the first poll already sees them.
    pub confirm_after_polls: u32,
    /// Largest seat count `rm_create_room` accepts.
    pub max_seats: u8,
    /// Id given to the first created room.
    pub first_room_id: u32,
    /// Written into every room as `game_state_manager_address`.
    pub game_state_manager: Address,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            confirm_after_polls: 1,
            max_seats: 9,
            first_room_id: 1,
            game_state_manager: Address::new(
                "aleo1gamestatemanager0000000000000000000000000000000000000000",
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// The body of a simulated signed transaction.
#[derive(Debug, Serialize, Deserialize)]
struct Call {
    program: String,
    function: String,
    inputs: Vec<String>,
    caller: Address,
}

struct StoredTx {
    tx: Transaction,
    polls: u32,
}

#[derive(Default)]
struct State {
    rooms: BTreeMap<u32, RoomConfig>,
    game_requested: HashSet<u32>,
    next_room_id: u32,
    balances: HashMap<Address, u64>,
    transactions: HashMap<TransactionId, StoredTx>,
    tx_counter: u64,
    mapping_queries: u64,
    failing_queries: u32,
    output_limit: Option<usize>,
    blank_output: Option<usize>,
}

/// An in-memory ledger node with the room manager program deployed.
#[derive(Clone)]
pub struct SimulatedLedger {
    config: SimulatorConfig,
    codec: Arc<dyn RoomCodec>,
    state: Arc<Mutex<State>>,
}

impl Default for SimulatedLedger {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

impl SimulatedLedger {
    /// Creates a ledger that stores rooms as plaintext struct literals.
    pub fn new(config: SimulatorConfig) -> Self {
        Self::with_codec(config, PlaintextCodec)
    }

    /// Creates a ledger that stores rooms with the given codec.
    pub fn with_codec(config: SimulatorConfig, codec: impl RoomCodec) -> Self {
        let state = State {
            next_room_id: config.first_room_id,
            ..State::default()
        };
        Self {
            config,
            codec: Arc::new(codec),
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -- Accounts --

    /// Generates a fresh random identity.
    pub fn generate_signer(&self) -> Signer {
        let mut rng = rand::rng();
        let mut pick = |charset: &[u8], len: usize| -> String {
            (0..len)
                .map(|_| charset[rng.random_range(0..charset.len())] as char)
                .collect()
        };
        let address = format!("aleo1{}", pick(BECH32_CHARSET, 58));
        let key = format!("APrivateKey1zkp{}", pick(BASE58_CHARSET, 44));
        Signer::new(Address::new(address), PrivateKey::new(key))
    }

    /// Credits `amount` to `address`'s public balance.
    pub fn fund(&self, address: &Address, amount: u64) {
        let mut state = self.state();
        let balance = state.balances.entry(address.clone()).or_default();
        *balance = balance.saturating_add(amount);
        info!(%address, amount, "funded account");
    }

    pub fn balance(&self, address: &Address) -> u64 {
        self.state().balances.get(address).copied().unwrap_or(0)
    }

    // -- Inspection --

    /// The current value of `rooms[room_id]`.
    pub fn room(&self, room_id: RoomId) -> Option<RoomConfig> {
        self.state().rooms.get(&room_id.0).cloned()
    }

    /// Returns `true` once a game creation request succeeded for the room.
    pub fn is_game_requested(&self, room_id: RoomId) -> bool {
        self.state().game_requested.contains(&room_id.0)
    }

    /// How many times `get_transaction` was called for `tx_id`.
    pub fn query_count(&self, tx_id: &TransactionId) -> u32 {
        self.state()
            .transactions
            .get(tx_id)
            .map(|t| t.polls)
            .unwrap_or(0)
    }

    /// Number of accepted submissions.
    pub fn submission_count(&self) -> u64 {
        self.state().tx_counter
    }

    /// Number of `get_mapping_value` calls, including failed ones.
    pub fn mapping_query_count(&self) -> u64 {
        self.state().mapping_queries
    }

    // -- Fault injection --

    /// Makes the next `n` read calls fail with a transient error.
    pub fn fail_next_queries(&self, n: u32) {
        self.state().failing_queries = n;
    }

    /// Truncates the outputs of subsequently submitted transactions.
    pub fn limit_outputs(&self, limit: Option<usize>) {
        self.state().output_limit = limit;
    }

    /// Drops the value of output `index` in subsequently submitted
    /// transactions.
    pub fn blank_output(&self, index: Option<usize>) {
        self.state().blank_output = index;
    }

    // -- Program execution --

    fn execute(
        &self,
        state: &mut State,
        call: &Call,
    ) -> Result<Vec<Output>, LedgerError> {
        match call.function.as_str() {
            functions::CREATE_ROOM => self.create_room(state, call),
            functions::JOIN_ROOM => self.join_room(state, call),
            functions::REQUEST_GAME_CREATION => self.request_game_creation(state, call),
            other => Err(LedgerError::Rejected(format!("unknown function {other}"))),
        }
    }

    fn create_room(
        &self,
        state: &mut State,
        call: &Call,
    ) -> Result<Vec<Output>, LedgerError> {
        let [big_blind, small_blind, min_stack, seats, bet] = arity::<5>(call)?;
        let big_blind: u64 = uint(big_blind, "u64")?;
        let small_blind: u64 = uint(small_blind, "u64")?;
        let min_stack: u64 = uint(min_stack, "u64")?;
        let seats: u8 = uint(seats, "u8")?;
        let bet: u64 = uint(bet, "u64")?;

        if seats < 2 || seats > self.config.max_seats {
            return Err(LedgerError::Rejected(format!(
                "seats must be between 2 and {}, got {seats}",
                self.config.max_seats
            )));
        }
        if small_blind > big_blind {
            return Err(LedgerError::Rejected(
                "small blind exceeds big blind".into(),
            ));
        }

        let room_id = state.next_room_id;
        state.next_room_id = state.next_room_id.wrapping_add(1);
        let room = RoomConfig {
            big_blind,
            big_blind_seat: 2 % seats,
            small_blind,
            small_blind_seat: 1,
            dealer_seat: 0,
            min_stack,
            seats,
            room_id: RoomId(room_id),
            joined_users: vec![PlayerRoomConfig {
                player_address: call.caller.clone(),
                bet,
            }],
            num_joined_users: 1,
            game_state_manager_address: self.config.game_state_manager.clone(),
        };
        let encoded = self
            .codec
            .encode(&room)
            .map_err(|e| LedgerError::Rejected(e.to_string()))?;
        state.rooms.insert(room_id, room);
        debug!(room_id, seats, "simulated room created");

        Ok(vec![public_output(encoded), future_output(call)])
    }

    fn join_room(
        &self,
        state: &mut State,
        call: &Call,
    ) -> Result<Vec<Output>, LedgerError> {
        let [room_id, bet] = arity::<2>(call)?;
        let room_id: u32 = uint(room_id, "u32")?;
        let bet: u64 = uint(bet, "u64")?;

        if state.game_requested.contains(&room_id) {
            return Err(LedgerError::Rejected(format!(
                "room {room_id} already has a game"
            )));
        }
        let room = state
            .rooms
            .get_mut(&room_id)
            .ok_or_else(|| LedgerError::Rejected(format!("room {room_id} does not exist")))?;
        if room.is_full() {
            return Err(LedgerError::Rejected(format!("room {room_id} is full")));
        }
        if room.contains(&call.caller) {
            return Err(LedgerError::Rejected(format!(
                "{} already joined room {room_id}",
                call.caller
            )));
        }
        room.joined_users.push(PlayerRoomConfig {
            player_address: call.caller.clone(),
            bet,
        });
        room.num_joined_users += 1;
        debug!(room_id, joined = room.num_joined_users, "simulated join");

        Ok(vec![future_output(call)])
    }

    fn request_game_creation(
        &self,
        state: &mut State,
        call: &Call,
    ) -> Result<Vec<Output>, LedgerError> {
        let [room_id, snapshot, _dealer] = arity::<3>(call)?;
        let room_id: u32 = uint(room_id, "u32")?;

        let room = state
            .rooms
            .get(&room_id)
            .ok_or_else(|| LedgerError::Rejected(format!("room {room_id} does not exist")))?;
        if !room.contains(&call.caller) {
            return Err(LedgerError::Rejected(format!(
                "{} is not a member of room {room_id}",
                call.caller
            )));
        }
        if !room.is_full() {
            return Err(LedgerError::Rejected(format!(
                "room {room_id} is not full"
            )));
        }
        let snapshot = self
            .codec
            .decode(snapshot)
            .map_err(|e| LedgerError::Rejected(format!("bad room config input: {e}")))?;
        if &snapshot != room {
            return Err(LedgerError::Rejected(format!(
                "room config for {room_id} does not match on-chain state"
            )));
        }
        if !state.game_requested.insert(room_id) {
            return Err(LedgerError::Rejected(format!(
                "room {room_id} already has a game"
            )));
        }
        debug!(room_id, "simulated game creation request");

        Ok(vec![record_output(), record_output(), future_output(call)])
    }
}

impl LedgerClient for SimulatedLedger {
    async fn submit_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> Result<TransactionId, LedgerError> {
        let call: Call = serde_json::from_str(transaction.payload())
            .map_err(|e| LedgerError::Rejected(format!("malformed transaction: {e}")))?;

        let mut state = self.state();
        let mut outputs = self.execute(&mut state, &call)?;
        if let Some(limit) = state.output_limit {
            outputs.truncate(limit);
        }
        if let Some(output) = state.blank_output.and_then(|i| outputs.get_mut(i)) {
            output.value = None;
        }

        state.tx_counter += 1;
        let id = TransactionId::new(format!("at1sim{:054}", state.tx_counter));
        let tx = Transaction {
            id: id.clone(),
            kind: Some("execute".into()),
            execution: Some(Execution {
                transitions: vec![Transition {
                    id: format!("au1sim{:054}", state.tx_counter),
                    program: call.program.clone(),
                    function: call.function.clone(),
                    outputs,
                }],
            }),
        };
        state
            .transactions
            .insert(id.clone(), StoredTx { tx, polls: 0 });
        debug!(tx_id = %id, function = %call.function, "simulated submission accepted");
        Ok(id)
    }

    async fn get_transaction(
        &self,
        id: &TransactionId,
    ) -> Result<Option<Transaction>, LedgerError> {
        let mut state = self.state();
        let injected = take_failure(&mut state);
        let confirm_after = self.config.confirm_after_polls;
        let Some(stored) = state.transactions.get_mut(id) else {
            return injected.map(|()| None);
        };
        stored.polls += 1;
        injected?;

        if stored.polls < confirm_after {
            // Known to the node, not yet in a block.
            return Ok(Some(Transaction {
                execution: None,
                ..stored.tx.clone()
            }));
        }
        Ok(Some(stored.tx.clone()))
    }

    async fn get_mapping_value(
        &self,
        program_id: &str,
        mapping: &str,
        key: &str,
    ) -> Result<Option<String>, LedgerError> {
        let mut state = self.state();
        state.mapping_queries += 1;
        take_failure(&mut state)?;

        match (program_id, mapping) {
            (ROOM_MANAGER_PROGRAM, ROOMS_MAPPING) => {
                let room_id: u32 = uint(key, "u32")
                    .map_err(|e| LedgerError::Status { status: 400, body: e.to_string() })?;
                state
                    .rooms
                    .get(&room_id)
                    .map(|room| {
                        self.codec
                            .encode(room)
                            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))
                    })
                    .transpose()
            }
            (CREDITS_PROGRAM, "account") => Ok(state
                .balances
                .get(&Address::new(key))
                .map(|b| format!("{b}u64"))),
            _ => Ok(None),
        }
    }
}

impl TransactionBuilder for SimulatedLedger {
    async fn build_execution(
        &self,
        request: ExecutionRequest<'_>,
    ) -> Result<SignedTransaction, LedgerError> {
        if request.program_id != ROOM_MANAGER_PROGRAM {
            return Err(LedgerError::Build(format!(
                "program {} is not deployed",
                request.program_id
            )));
        }
        if request.signer.private_key().expose_secret().is_empty() {
            return Err(LedgerError::Build("empty private key".into()));
        }
        if !request.fee.credits.is_finite() || request.fee.credits < 0.0 {
            return Err(LedgerError::Build(format!(
                "invalid fee {}",
                request.fee.credits
            )));
        }

        let call = Call {
            program: request.program_id.to_string(),
            function: request.function_name.to_string(),
            inputs: request.inputs,
            caller: request.signer.address().clone(),
        };
        serde_json::to_string(&call)
            .map(SignedTransaction::new)
            .map_err(|e| LedgerError::Build(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn take_failure(state: &mut State) -> Result<(), LedgerError> {
    if state.failing_queries > 0 {
        state.failing_queries -= 1;
        return Err(LedgerError::Unavailable("injected node outage".into()));
    }
    Ok(())
}

fn arity<const N: usize>(call: &Call) -> Result<[&str; N], LedgerError> {
    let inputs: Vec<&str> = call.inputs.iter().map(String::as_str).collect();
    inputs.try_into().map_err(|v: Vec<&str>| {
        LedgerError::Rejected(format!(
            "{} expects {N} inputs, got {}",
            call.function,
            v.len()
        ))
    })
}

fn uint<T: FromStr>(literal: &str, suffix: &str) -> Result<T, LedgerError> {
    literal
        .strip_suffix(suffix)
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| {
            LedgerError::Rejected(format!("expected a {suffix} literal, got `{literal}`"))
        })
}

fn output_id() -> String {
    format!("{}field", rand::rng().random::<u64>())
}

fn public_output(value: String) -> Output {
    Output {
        kind: "public".into(),
        id: output_id(),
        value: Some(value),
    }
}

fn record_output() -> Output {
    Output {
        kind: "record".into(),
        id: output_id(),
        value: Some(format!("record1qyqsp{:032x}", rand::rng().random::<u128>())),
    }
}

fn future_output(call: &Call) -> Output {
    Output {
        kind: "future".into(),
        id: output_id(),
        value: Some(format!(
            "{{ program_id: {}, function_name: {}, arguments: [ {} ] }}",
            call.program,
            call.function,
            call.inputs.join(", ")
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Fee;

    fn request<'a>(signer: &'a Signer, function: &'a str, inputs: &[&str]) -> ExecutionRequest<'a> {
        ExecutionRequest {
            program_id: ROOM_MANAGER_PROGRAM,
            function_name: function,
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            fee: Fee::default(),
            signer,
        }
    }

    async fn run(ledger: &SimulatedLedger, req: ExecutionRequest<'_>) -> Result<TransactionId, LedgerError> {
        let tx = ledger.build_execution(req).await?;
        ledger.submit_transaction(&tx).await
    }

    #[test]
    fn test_generated_signers_look_like_accounts() {
        let ledger = SimulatedLedger::default();
        let a = ledger.generate_signer();
        let b = ledger.generate_signer();
        assert!(a.address().as_str().starts_with("aleo1"));
        assert_eq!(a.address().as_str().len(), 63);
        assert!(a.private_key().expose_secret().starts_with("APrivateKey1zkp"));
        assert_ne!(a.address(), b.address());
    }

    #[test]
    fn test_fund_accumulates_balance() {
        let ledger = SimulatedLedger::default();
        let addr = Address::new("aleo1someone");
        ledger.fund(&addr, 1000);
        ledger.fund(&addr, 500);
        assert_eq!(ledger.balance(&addr), 1500);
    }

    #[tokio::test]
    async fn test_create_room_stores_host() {
        let ledger = SimulatedLedger::default();
        let host = ledger.generate_signer();
        run(&ledger, request(&host, functions::CREATE_ROOM, &["100u64", "50u64", "1000u64", "4u8", "200u64"]))
            .await
            .unwrap();

        let room = ledger.room(RoomId(1)).unwrap();
        assert_eq!(room.num_joined_users, 1);
        assert_eq!(&room.joined_users[0].player_address, host.address());
        assert_eq!(room.joined_users[0].bet, 200);
    }

    #[tokio::test]
    async fn test_program_rules_reject_invalid_calls() {
        let ledger = SimulatedLedger::default();
        let host = ledger.generate_signer();

        let err = run(&ledger, request(&host, functions::CREATE_ROOM, &["100u64", "50u64", "1000u64", "1u8", "200u64"]))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Rejected(_)));

        let err = run(&ledger, request(&host, functions::JOIN_ROOM, &["99u32", "200u64"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));

        let err = run(&ledger, request(&host, functions::JOIN_ROOM, &["1u32"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("expects 2 inputs"));
    }

    #[tokio::test]
    async fn test_outputs_withheld_until_confirm_threshold() {
        let ledger = SimulatedLedger::new(SimulatorConfig {
            confirm_after_polls: 2,
            ..Default::default()
        });
        let host = ledger.generate_signer();
        let id = run(&ledger, request(&host, functions::CREATE_ROOM, &["100u64", "50u64", "1000u64", "4u8", "200u64"]))
            .await
            .unwrap();

        let first = ledger.get_transaction(&id).await.unwrap().unwrap();
        assert!(first.first_outputs().is_none());
        let second = ledger.get_transaction(&id).await.unwrap().unwrap();
        assert_eq!(second.first_outputs().unwrap().len(), 2);
        assert_eq!(ledger.query_count(&id), 2);
    }

    #[tokio::test]
    async fn test_unknown_transaction_is_none() {
        let ledger = SimulatedLedger::default();
        let found = ledger
            .get_transaction(&TransactionId::new("at1nothing"))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_injected_failures_are_transient_and_counted() {
        use roomledger_retry::{Classify, ErrorClass};

        let ledger = SimulatedLedger::default();
        ledger.fail_next_queries(1);
        let err = ledger
            .get_mapping_value(ROOM_MANAGER_PROGRAM, ROOMS_MAPPING, "1u32")
            .await
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Transient);
        let ok = ledger
            .get_mapping_value(ROOM_MANAGER_PROGRAM, ROOMS_MAPPING, "1u32")
            .await
            .unwrap();
        assert!(ok.is_none());
        assert_eq!(ledger.mapping_query_count(), 2);
    }

    #[tokio::test]
    async fn test_credits_mapping_reports_balance() {
        let ledger = SimulatedLedger::default();
        let addr = Address::new("aleo1rich");
        ledger.fund(&addr, 42);
        let value = ledger
            .get_mapping_value(CREDITS_PROGRAM, "account", "aleo1rich")
            .await
            .unwrap();
        assert_eq!(value.as_deref(), Some("42u64"));
    }

    #[tokio::test]
    async fn test_builder_rejects_unknown_program() {
        let ledger = SimulatedLedger::default();
        let signer = ledger.generate_signer();
        let mut req = request(&signer, functions::CREATE_ROOM, &[]);
        req.program_id = "other.aleo";
        assert!(matches!(
            ledger.build_execution(req).await,
            Err(LedgerError::Build(_))
        ));
    }
}

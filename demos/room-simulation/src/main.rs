use clap::Parser;
use roomledger::ledger::{CREDITS_PROGRAM, LedgerClient};
use roomledger::prelude::*;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Create, fill and start a room on a simulated ledger")]
struct Args {
    #[arg(long, default_value_t = 100)]
    big_blind: u64,

    #[arg(long, default_value_t = 50)]
    small_blind: u64,

    #[arg(long, default_value_t = 1000)]
    min_stack: u64,

    #[arg(long, default_value_t = 4)]
    seats: u8,

    #[arg(long, default_value_t = 200)]
    bet: u64,

    /// Credits sent to each generated player before they join.
    #[arg(long, env = "ROOMLEDGER_FUNDING_AMOUNT", default_value_t = 1000)]
    funding_amount: u64,

    #[arg(long, env = "ROOMLEDGER_DEFAULT_FEE", default_value_t = 0.02)]
    fee: f64,

    #[arg(long, env = "ROOMLEDGER_PRIVATE_FEE")]
    private_fee: bool,

    /// Polls before a simulated transaction shows its outputs.
    #[arg(long, default_value_t = 2)]
    confirm_after_polls: u32,

    /// Print the final room as JSON.
    #[arg(long)]
    json: bool,
}

impl Args {
    fn config(&self) -> Config {
        let mut config = Config::default();
        config.game = GameDefaults {
            big_blind: self.big_blind,
            small_blind: self.small_blind,
            min_stack: self.min_stack,
            seats: self.seats,
            bet: self.bet,
            funding_amount: self.funding_amount,
        };
        config.tx = TxConfig {
            fee: self.fee,
            private_fee: self.private_fee,
        };
        config
    }
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

struct Outcome {
    room: RoomConfig,
    game: GameCreation,
}

/// Gives every player `amount` credits, one transfer at a time.
async fn fund_players(
    ledger: &SimulatedLedger,
    players: &[Signer],
    amount: u64,
) -> Result<(), RoomledgerError> {
    for player in players {
        ledger.fund(player.address(), amount);
        let balance = ledger
            .get_mapping_value(CREDITS_PROGRAM, "account", player.address().as_str())
            .await?;
        info!(player = %player.address(), balance = balance.as_deref().unwrap_or("0u64"), "player funded");
    }
    Ok(())
}

async fn run(args: &Args, ledger: SimulatedLedger) -> Result<Outcome, RoomledgerError> {
    let config = args.config();
    let rooms = config.room_manager(ledger.clone(), ledger.clone());
    let game = &config.game;
    let fee = config.tx.fee();

    let host = ledger.generate_signer();
    let dealer = ledger.generate_signer();
    let players: Vec<Signer> = (1..game.seats).map(|_| ledger.generate_signer()).collect();
    fund_players(&ledger, std::slice::from_ref(&host), game.funding_amount).await?;
    fund_players(&ledger, &players, game.funding_amount).await?;

    let room = rooms
        .create_room(&host, game.big_blind, game.small_blind, game.min_stack, game.seats, game.bet, fee)
        .await?;
    info!(room_id = %room.room_id, "room open");

    for player in &players {
        rooms.join_room(player, room.room_id, game.bet, fee).await?;
    }

    let snapshot = rooms
        .get_room(room.room_id)
        .await?
        .ok_or(roomledger::room::RoomError::NotFound(room.room_id))?;
    info!(room_id = %snapshot.room_id, phase = %RoomPhase::of(Some(&snapshot)), "room filled");

    let game = rooms
        .request_game_creation(&host, snapshot.room_id, &snapshot, dealer.address(), fee)
        .await?;
    Ok(Outcome {
        room: snapshot,
        game,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    roomledger::telemetry::init("info");

    let ledger = SimulatedLedger::new(SimulatorConfig {
        confirm_after_polls: args.confirm_after_polls,
        ..Default::default()
    });
    let outcome = run(&args, ledger).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.room)?);
    } else {
        println!("room {} ({} seats)", outcome.room.room_id, outcome.room.seats);
        for (seat, user) in outcome.room.joined_users.iter().enumerate() {
            println!("  seat {seat}: {} bet {}", user.player_address, user.bet);
        }
        println!("game requested in {}", outcome.game.transaction.id());
    }
    Ok(())
}

//! Drives a full room lifecycle through the facade's prelude.

#![cfg(feature = "simulator")]

use roomledger::prelude::*;

#[tokio::test(start_paused = true)]
async fn test_config_built_manager_runs_a_room() {
    roomledger::telemetry::init("warn");

    let config = Config::default();
    let ledger = SimulatedLedger::default();
    let rooms = config.room_manager(ledger.clone(), ledger.clone());
    let game = &config.game;
    let fee = config.tx.fee();

    let host = ledger.generate_signer();
    let room = rooms
        .create_room(&host, game.big_blind, game.small_blind, game.min_stack, game.seats, game.bet, fee)
        .await
        .unwrap();

    for _ in 1..game.seats {
        let player = ledger.generate_signer();
        ledger.fund(player.address(), game.funding_amount);
        rooms.join_room(&player, room.room_id, game.bet, fee).await.unwrap();
    }

    let snapshot = rooms.get_room(room.room_id).await.unwrap().unwrap();
    assert_eq!(RoomPhase::of(Some(&snapshot)), RoomPhase::Full { seats: 4 });

    let dealer = Address::new("aleo1dealer");
    let game: GameCreation = rooms
        .request_game_creation(&host, room.room_id, &snapshot, &dealer, fee)
        .await
        .unwrap();
    assert_eq!(game.deck_request.data.player_addresses.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_errors_convert_into_facade_error() {
    async fn lookup_missing(rooms: &RoomManager<SimulatedLedger, SimulatedLedger>) -> Result<RoomConfig, RoomledgerError> {
        let room = rooms.get_room(RoomId(9)).await?;
        room.ok_or_else(|| roomledger::room::RoomError::NotFound(RoomId(9)).into())
    }

    let ledger = SimulatedLedger::default();
    let rooms = Config::default().room_manager(ledger.clone(), ledger);
    let err = lookup_missing(&rooms).await.unwrap_err();
    assert!(matches!(err, RoomledgerError::Room(_)));
}

//! Integration tests for the game engine against an in-memory store.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use bingohall_protocol::{
    Amount, AuditAction, ClaimOutcome, DrawOutcome, PlayerId, RejectReason, RoomId,
    RoomStatus, SessionStatus, SlotNumber, TransactionKind,
};
use bingohall_room::{HallEngine, RoomConfig, RoomError};
use bingohall_store::{MemoryStore, SessionRow, StoreConfig};

// =========================================================================
// Helpers
// =========================================================================

fn pid(n: u64) -> PlayerId {
    PlayerId(n)
}

fn slot(n: u32) -> SlotNumber {
    SlotNumber(n)
}

fn engine() -> HallEngine {
    engine_with(RoomConfig {
        card_pool_size: 10,
        ..RoomConfig::default()
    })
}

fn engine_with(config: RoomConfig) -> HallEngine {
    HallEngine::new(Arc::new(MemoryStore::new(StoreConfig::default())), config)
}

/// A room with `players` joined, each holding slot `n` for player `n`.
async fn seated_room(engine: &HallEngine, bet: i64, players: u64) -> RoomId {
    let room = engine.create_room(Amount::new(bet), 0).await.unwrap();
    for n in 1..=players {
        engine.join(room.id).await.unwrap();
        assert!(engine.select_slot(room.id, slot(n as u32), pid(n)).await.unwrap());
    }
    room.id
}

/// Drawn and remaining never overlap and together cover 1..=75.
fn assert_draw_partition(session: &SessionRow) {
    let drawn: HashSet<u8> = session.drawn.iter().copied().collect();
    let remaining: HashSet<u8> = session.remaining.iter().copied().collect();
    assert_eq!(drawn.len(), session.drawn.len());
    assert_eq!(remaining.len(), session.remaining.len());
    assert!(drawn.is_disjoint(&remaining));
    let all: HashSet<u8> = drawn.union(&remaining).copied().collect();
    assert_eq!(all, (1..=75).collect::<HashSet<u8>>());
}

/// Draws and marks until `player`'s card has a line. Returns the number of
/// draws it took.
async fn play_until_line(engine: &HallEngine, player: PlayerId, held: SlotNumber, room: RoomId) -> usize {
    let session = engine.start_session(room).await.unwrap();
    let mut draws = 0;
    loop {
        match engine.draw_number(session.id).await.unwrap() {
            DrawOutcome::Drawn { number } => {
                draws += 1;
                engine.mark_number(player, held, number).await.unwrap();
            }
            DrawOutcome::Exhausted => panic!("exhausted before a line formed"),
        }
        let card = engine.owned_card_for_slot(player, held).await.unwrap().unwrap();
        if card.card.has_line() {
            return draws;
        }
    }
}

// =========================================================================
// Room lifecycle
// =========================================================================

#[tokio::test]
async fn test_create_room_non_positive_bet_rejected() {
    let engine = engine();
    let err = engine.create_room(Amount::new(0), 10).await.unwrap_err();
    assert!(matches!(err, RoomError::InvalidBetAmount(_)));
    let err = engine.create_room(Amount::new(-5), 10).await.unwrap_err();
    assert!(matches!(err, RoomError::InvalidBetAmount(_)));
}

#[tokio::test]
async fn test_create_room_zero_max_players_uses_default() {
    let engine = engine();
    let room = engine.create_room(Amount::new(50), 0).await.unwrap();
    assert_eq!(room.max_players, 100);
    assert_eq!(room.status, RoomStatus::Waiting);
    assert_eq!(room.current_players, 0);
    assert!(room.countdown.is_none());
    assert_eq!(engine.available_slots(room.id).await.unwrap().len(), 10);
}

#[tokio::test(start_paused = true)]
async fn test_join_arms_countdown_at_threshold() {
    let engine = engine();
    let room = engine.create_room(Amount::new(50), 10).await.unwrap();

    let after_first = engine.join(room.id).await.unwrap();
    assert_eq!(after_first.current_players, 1);
    assert!(after_first.countdown.is_none());

    let after_second = engine.join(room.id).await.unwrap();
    assert_eq!(after_second.current_players, 2);
    let countdown = after_second.countdown.unwrap();
    assert_eq!(countdown.game_start() - countdown.started_at(), Duration::from_secs(60));

    let info = engine.countdown_info(room.id).await.unwrap();
    assert!(info.is_active);
    assert_eq!(info.time_left_secs, 60);
    assert!(!info.game_started);

    tokio::time::advance(Duration::from_secs(15)).await;
    let info = engine.countdown_info(room.id).await.unwrap();
    assert_eq!(info.time_left_secs, 45);
}

#[tokio::test(start_paused = true)]
async fn test_join_past_threshold_keeps_first_countdown() {
    let engine = engine();
    let room = engine.create_room(Amount::new(50), 10).await.unwrap();
    engine.join(room.id).await.unwrap();
    let armed = engine.join(room.id).await.unwrap().countdown.unwrap();

    tokio::time::advance(Duration::from_secs(10)).await;
    let third = engine.join(room.id).await.unwrap();
    assert_eq!(third.countdown.unwrap(), armed);
}

#[tokio::test]
async fn test_join_full_room_capacity_exceeded() {
    let engine = engine();
    let room = engine.create_room(Amount::new(50), 2).await.unwrap();
    engine.join(room.id).await.unwrap();
    engine.join(room.id).await.unwrap();

    let err = engine.join(room.id).await.unwrap_err();
    assert!(matches!(err, RoomError::CapacityExceeded(id) if id == room.id));
    assert_eq!(engine.room(room.id).await.unwrap().current_players, 2);
}

#[tokio::test]
async fn test_join_active_room_not_joinable() {
    let engine = engine();
    let room = seated_room(&engine, 50, 2).await;
    engine.start_session(room).await.unwrap();

    let err = engine.join(room).await.unwrap_err();
    assert!(matches!(
        err,
        RoomError::NotJoinable { status: RoomStatus::Active, .. }
    ));
}

#[tokio::test]
async fn test_join_unknown_room_not_found() {
    let engine = engine();
    let err = engine.join(RoomId(404)).await.unwrap_err();
    assert!(matches!(err, RoomError::NotFound(RoomId(404))));
}

#[tokio::test]
async fn test_leave_releases_seat_and_clears_countdown_when_empty() {
    let engine = engine();
    let room = seated_room(&engine, 50, 2).await;
    assert!(engine.room(room).await.unwrap().countdown.is_some());

    let after = engine.leave(room, pid(1)).await.unwrap();
    assert_eq!(after.current_players, 1);
    assert!(after.countdown.is_some());
    assert!(engine.slot_for_player(room, pid(1)).await.unwrap().is_none());
    assert!(engine.owned_card_for_slot(pid(1), slot(1)).await.unwrap().is_none());

    let after = engine.leave(room, pid(2)).await.unwrap();
    assert_eq!(after.current_players, 0);
    assert!(after.countdown.is_none());

    let after = engine.leave(room, pid(3)).await.unwrap();
    assert_eq!(after.current_players, 0);

    let log = engine.audit_log(pid(1), 10).await;
    assert_eq!(log[0].action, AuditAction::RoomLeft);
}

#[tokio::test]
async fn test_find_or_create_room_prefers_oldest_open_room() {
    let engine = engine();
    let older = engine.create_room(Amount::new(50), 10).await.unwrap();
    let _newer = engine.create_room(Amount::new(50), 10).await.unwrap();
    let _other_bet = engine.create_room(Amount::new(20), 10).await.unwrap();

    let found = engine.find_or_create_room(Amount::new(50)).await.unwrap();
    assert_eq!(found.id, older.id);

    let created = engine.find_or_create_room(Amount::new(75)).await.unwrap();
    assert_eq!(created.bet_amount, Amount::new(75));
    assert_eq!(created.max_players, 100);
}

#[tokio::test]
async fn test_join_or_create_moves_on_when_room_is_full() {
    let engine = engine();
    let small = engine.create_room(Amount::new(50), 1).await.unwrap();

    let first = engine.join_or_create(Amount::new(50)).await.unwrap();
    assert_eq!(first.id, small.id);

    let second = engine.join_or_create(Amount::new(50)).await.unwrap();
    assert_ne!(second.id, small.id);
    assert_eq!(second.current_players, 1);
}

#[tokio::test(start_paused = true)]
async fn test_force_and_reset_countdown() {
    let engine = engine();
    let room = engine.create_room(Amount::new(50), 10).await.unwrap();

    engine.force_countdown(room.id, 5).await.unwrap();
    let info = engine.countdown_info(room.id).await.unwrap();
    assert!(info.is_active);
    assert_eq!(info.time_left_secs, 5);

    let reset = engine.reset_countdown(room.id).await.unwrap();
    assert!(reset.countdown.is_none());
    assert!(!engine.countdown_info(room.id).await.unwrap().is_active);
}

#[tokio::test]
async fn test_list_rooms_newest_first_without_completed() {
    let engine = engine();
    let first = engine.create_room(Amount::new(10), 10).await.unwrap();
    let second = engine.create_room(Amount::new(10), 10).await.unwrap();

    let ids: Vec<_> = engine.list_rooms().await.unwrap().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    let room = seated_room(&engine, 10, 1).await;
    let session = engine.start_session(room).await.unwrap();
    while engine.draw_number(session.id).await.unwrap() != DrawOutcome::Exhausted {}
    let ids: Vec<_> = engine.list_rooms().await.unwrap().iter().map(|r| r.id).collect();
    assert!(!ids.contains(&room));
}

// =========================================================================
// Card pool
// =========================================================================

#[tokio::test]
async fn test_select_slot_copies_card_once_per_room() {
    let engine = engine();
    let room = engine.create_room(Amount::new(50), 10).await.unwrap();

    assert!(engine.select_slot(room.id, slot(3), pid(1)).await.unwrap());
    let owned = engine.owned_card_for_slot(pid(1), slot(3)).await.unwrap().unwrap();
    let slots = engine.available_slots(room.id).await.unwrap();
    assert!(owned.card.same_grid(&slots[2].card));
    assert_eq!(owned.slot, slot(3));

    assert!(engine.select_slot(room.id, slot(4), pid(1)).await.unwrap());
    let still = engine.owned_card_for_slot(pid(1), slot(4)).await.unwrap().unwrap();
    assert_eq!(still.id, owned.id);

    let log = engine.audit_log(pid(1), 10).await;
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|e| e.action == AuditAction::SlotSelected));
}

#[tokio::test]
async fn test_select_slot_taken_is_silent_noop() {
    let engine = engine();
    let room = engine.create_room(Amount::new(50), 10).await.unwrap();
    assert!(engine.select_slot(room.id, slot(7), pid(1)).await.unwrap());

    assert!(!engine.select_slot(room.id, slot(7), pid(2)).await.unwrap());
    assert!(engine.owned_card_for_slot(pid(2), slot(7)).await.unwrap().is_none());
    assert_eq!(engine.room_players(room.id).await.unwrap(), vec![pid(1)]);
}

#[tokio::test]
async fn test_select_slot_outside_pool_invalid() {
    let engine = engine();
    let room = engine.create_room(Amount::new(50), 10).await.unwrap();
    for bad in [0, 11] {
        let err = engine.select_slot(room.id, slot(bad), pid(1)).await.unwrap_err();
        assert!(matches!(err, RoomError::InvalidSlot { .. }));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_select_slot_concurrent_same_slot_one_owner() {
    let engine = engine();
    let room = engine.create_room(Amount::new(50), 100).await.unwrap();

    let mut handles = Vec::new();
    for n in 1..=16 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.select_slot(room.id, slot(7), pid(n)).await.unwrap()
        }));
    }
    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);

    let players = engine.room_players(room.id).await.unwrap();
    assert_eq!(players.len(), 1);
    let mut owned = 0;
    for n in 1..=16 {
        if engine.owned_card_for_slot(pid(n), slot(7)).await.unwrap().is_some() {
            owned += 1;
        }
    }
    assert_eq!(owned, 1);
}

#[tokio::test]
async fn test_select_slot_after_leave_copies_new_card() {
    let engine = engine();
    let room = engine.create_room(Amount::new(50), 10).await.unwrap();
    engine.join(room.id).await.unwrap();
    assert!(engine.select_slot(room.id, slot(3), pid(1)).await.unwrap());

    engine.leave(room.id, pid(1)).await.unwrap();
    assert!(engine.store().owned_card(pid(1), room.id).await.unwrap().is_none());

    engine.join(room.id).await.unwrap();
    assert!(engine.select_slot(room.id, slot(5), pid(1)).await.unwrap());
    let owned = engine.store().owned_card(pid(1), room.id).await.unwrap().unwrap();
    let slots = engine.available_slots(room.id).await.unwrap();
    assert_eq!(owned.slot, slot(5));
    assert!(owned.card.same_grid(&slots[4].card));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_select_slot_racing_leave_keeps_slot_and_card_together() {
    let engine = engine();
    for _ in 0..40 {
        let room = engine.create_room(Amount::new(50), 10).await.unwrap();
        engine.join(room.id).await.unwrap();

        let selecting = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.select_slot(room.id, slot(3), pid(1)).await })
        };
        let leaving = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.leave(room.id, pid(1)).await })
        };
        selecting.await.unwrap().unwrap();
        leaving.await.unwrap().unwrap();

        let held = engine.slot_for_player(room.id, pid(1)).await.unwrap();
        let owned = engine.store().owned_card(pid(1), room.id).await.unwrap();
        match (held, owned) {
            (Some(held), Some(owned)) => assert_eq!(held.number, owned.slot),
            (None, None) => {}
            (held, owned) => panic!("slot {held:?} and card {owned:?} out of step"),
        }
    }
}

// =========================================================================
// Draw engine
// =========================================================================

#[tokio::test]
async fn test_start_session_is_idempotent() {
    let engine = engine();
    let room = seated_room(&engine, 50, 2).await;

    let first = engine.start_session(room).await.unwrap();
    let second = engine.start_session(room).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(first.remaining.len(), 75);
    assert!(first.drawn.is_empty());
    assert_eq!(engine.room(room).await.unwrap().status, RoomStatus::Active);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_start_session_concurrent_calls_one_session() {
    let engine = engine();
    let room = seated_room(&engine, 50, 2).await;

    let mut handles = Vec::new();
    for _ in 0..12 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.start_session(room).await.unwrap().id
        }));
    }
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(engine.store().session_ids_for_room(room).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_draw_number_75_distinct_then_exhausted() {
    let engine = engine();
    let room = seated_room(&engine, 50, 2).await;
    let session = engine.start_session(room).await.unwrap();

    let mut seen = HashSet::new();
    for _ in 0..75 {
        match engine.draw_number(session.id).await.unwrap() {
            DrawOutcome::Drawn { number } => {
                assert!((1..=75).contains(&number));
                assert!(seen.insert(number));
            }
            DrawOutcome::Exhausted => panic!("exhausted early"),
        }
        assert_draw_partition(&engine.session(session.id).await.unwrap());
    }
    let mid = engine.session(session.id).await.unwrap();
    assert_eq!(mid.status, SessionStatus::Active);
    assert!(mid.remaining.is_empty());
    assert_eq!(mid.drawn.len(), 75);

    assert_eq!(engine.draw_number(session.id).await.unwrap(), DrawOutcome::Exhausted);
    let done = engine.session(session.id).await.unwrap();
    assert_eq!(done.status, SessionStatus::Completed);
    assert!(done.ended_at.is_some());
    assert!(engine.winners(session.id).await.unwrap().is_empty());
    assert_eq!(engine.room(room).await.unwrap().status, RoomStatus::Completed);

    let err = engine.draw_number(session.id).await.unwrap_err();
    assert!(matches!(err, RoomError::SessionNotActive(_)));

    let err = engine.start_session(room).await.unwrap_err();
    assert!(matches!(err, RoomError::RoomClosed(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_draw_number_concurrent_callers_each_number_once() {
    let engine = engine();
    let room = seated_room(&engine, 50, 2).await;
    let session = engine.start_session(room).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..100 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.draw_number(session.id).await
        }));
    }
    let mut numbers = Vec::new();
    let mut exhausted = 0;
    let mut closed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(DrawOutcome::Drawn { number }) => numbers.push(number),
            Ok(DrawOutcome::Exhausted) => exhausted += 1,
            Err(RoomError::SessionNotActive(_)) => closed += 1,
            Err(e) => panic!("unexpected draw error: {e}"),
        }
    }
    let distinct: HashSet<u8> = numbers.iter().copied().collect();
    assert_eq!(numbers.len(), 75);
    assert_eq!(distinct, (1..=75).collect::<HashSet<u8>>());
    assert_eq!(exhausted, 1);
    assert_eq!(closed, 24);

    let done = engine.session(session.id).await.unwrap();
    assert_eq!(done.status, SessionStatus::Completed);
    assert_draw_partition(&done);
}

#[tokio::test]
async fn test_draw_number_unknown_session_not_found() {
    let engine = engine();
    let err = engine
        .draw_number(bingohall_protocol::SessionId(9))
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::SessionNotFound(_)));
}

#[tokio::test]
async fn test_mark_number_without_card_not_found() {
    let engine = engine();
    let _room = seated_room(&engine, 50, 1).await;
    let err = engine.mark_number(pid(2), slot(1), 5).await.unwrap_err();
    assert!(matches!(err, RoomError::CardNotFound { .. }));
}

#[tokio::test]
async fn test_mark_number_absent_from_card_changes_nothing() {
    let engine = engine();
    let _room = seated_room(&engine, 50, 1).await;
    let before = engine.owned_card_for_slot(pid(1), slot(1)).await.unwrap().unwrap();
    let absent = (1..=75u8)
        .find(|n| !before.card.grid().iter().flatten().any(|c| c == n))
        .unwrap();

    assert!(!engine.mark_number(pid(1), slot(1), absent).await.unwrap());
    let after = engine.owned_card_for_slot(pid(1), slot(1)).await.unwrap().unwrap();
    assert_eq!(after.card, before.card);
}

#[tokio::test]
async fn test_latest_session_prefers_active() {
    let engine = engine();
    let room = seated_room(&engine, 50, 2).await;
    assert!(engine.latest_session(room).await.unwrap().is_none());

    let session = engine.start_session(room).await.unwrap();
    let latest = engine.latest_session(room).await.unwrap().unwrap();
    assert_eq!(latest.id, session.id);
}

// =========================================================================
// Claims and payout
// =========================================================================

#[tokio::test]
async fn test_claim_bingo_valid_pays_bet_times_seated_players() {
    let engine = engine();
    let room = seated_room(&engine, 50, 3).await;
    engine.open_wallet(pid(1)).await.unwrap();

    play_until_line(&engine, pid(1), slot(1), room).await;
    let outcome = engine.claim_bingo(pid(1), slot(1)).await.unwrap();

    let ClaimOutcome::Won { session_id, payout } = outcome else {
        panic!("expected a win, got {outcome:?}");
    };
    assert_eq!(payout, Amount::new(150));

    let wallet = engine.wallet(pid(1)).await.unwrap();
    assert_eq!(wallet.balance(), Amount::new(150));
    assert_eq!(wallet.ledger_sum(), wallet.balance());
    let entries = engine.transactions(pid(1)).await.unwrap();
    assert_eq!(entries[0].kind, TransactionKind::Win);

    let winners = engine.winners(session_id).await.unwrap();
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].player_id, pid(1));
    assert_eq!(winners[0].payout, Amount::new(150));

    assert_eq!(engine.session(session_id).await.unwrap().status, SessionStatus::Completed);
    assert_eq!(engine.room(room).await.unwrap().status, RoomStatus::Completed);
    assert_eq!(engine.audit_log(pid(1), 1).await[0].action, AuditAction::Won);
}

#[tokio::test]
async fn test_claim_bingo_opens_missing_wallet() {
    let engine = engine();
    let room = seated_room(&engine, 20, 2).await;

    play_until_line(&engine, pid(2), slot(2), room).await;
    let outcome = engine.claim_bingo(pid(2), slot(2)).await.unwrap();
    assert!(outcome.is_won());
    assert_eq!(engine.wallet(pid(2)).await.unwrap().balance(), Amount::new(40));
}

#[tokio::test]
async fn test_claim_bingo_without_line_revokes_seat() {
    let engine = engine();
    let room = seated_room(&engine, 50, 2).await;
    engine.start_session(room).await.unwrap();

    let outcome = engine.claim_bingo(pid(1), slot(1)).await.unwrap();
    assert_eq!(
        outcome,
        ClaimOutcome::Rejected {
            reason: RejectReason::InvalidClaim
        }
    );
    assert!(engine.slot_for_player(room, pid(1)).await.unwrap().is_none());
    assert!(engine.owned_card_for_slot(pid(1), slot(1)).await.unwrap().is_none());
    assert_eq!(engine.room(room).await.unwrap().current_players, 2);
    assert_eq!(engine.audit_log(pid(1), 1).await[0].action, AuditAction::InvalidClaim);

    let err = engine.claim_bingo(pid(1), slot(1)).await.unwrap_err();
    assert!(matches!(err, RoomError::CardNotFound { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_claim_bingo_invalid_revocation_never_seen_without_audit() {
    let engine = engine();
    let room = seated_room(&engine, 50, 2).await;
    engine.start_session(room).await.unwrap();

    let claim = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.claim_bingo(pid(1), slot(1)).await })
    };
    while engine.slot_for_player(room, pid(1)).await.unwrap().is_some() {
        tokio::task::yield_now().await;
    }
    let log = engine.audit_log(pid(1), 1).await;
    assert_eq!(log[0].action, AuditAction::InvalidClaim);

    assert_eq!(
        claim.await.unwrap().unwrap(),
        ClaimOutcome::Rejected {
            reason: RejectReason::InvalidClaim
        }
    );
}

#[tokio::test]
async fn test_claim_bingo_marks_not_drawn_is_invalid() {
    let engine = engine();
    let room = seated_room(&engine, 50, 2).await;
    engine.start_session(room).await.unwrap();

    let owned = engine.owned_card_for_slot(pid(1), slot(1)).await.unwrap().unwrap();
    for &n in &owned.card.grid()[0] {
        engine.mark_number(pid(1), slot(1), n).await.unwrap();
    }
    let marked = engine.owned_card_for_slot(pid(1), slot(1)).await.unwrap().unwrap();
    assert!(marked.card.has_line());

    let outcome = engine.claim_bingo(pid(1), slot(1)).await.unwrap();
    assert_eq!(
        outcome,
        ClaimOutcome::Rejected {
            reason: RejectReason::InvalidClaim
        }
    );
}

#[tokio::test]
async fn test_claim_bingo_after_win_session_closed_keeps_seat() {
    let engine = engine();
    let room = seated_room(&engine, 50, 2).await;

    play_until_line(&engine, pid(1), slot(1), room).await;
    assert!(engine.claim_bingo(pid(1), slot(1)).await.unwrap().is_won());

    let late = engine.claim_bingo(pid(2), slot(2)).await.unwrap();
    assert_eq!(
        late,
        ClaimOutcome::Rejected {
            reason: RejectReason::SessionClosed
        }
    );
    assert!(engine.slot_for_player(room, pid(2)).await.unwrap().is_some());
}

#[tokio::test]
async fn test_claim_bingo_before_any_session_no_active_session() {
    let engine = engine();
    let room = seated_room(&engine, 50, 2).await;
    let err = engine.claim_bingo(pid(1), slot(1)).await.unwrap_err();
    assert!(matches!(err, RoomError::NoActiveSession(id) if id == room));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_claim_bingo_concurrent_valid_claims_one_winner() {
    let engine = engine();
    let room = seated_room(&engine, 10, 4).await;
    let session = engine.start_session(room).await.unwrap();

    // Draw everything so every card is fully markable, then mark all.
    for _ in 0..75 {
        let DrawOutcome::Drawn { number } = engine.draw_number(session.id).await.unwrap() else {
            panic!("exhausted early");
        };
        for n in 1..=4 {
            engine.mark_number(pid(n), slot(n as u32), number).await.unwrap();
        }
    }

    let mut handles = Vec::new();
    for n in 1..=4u64 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.claim_bingo(pid(n), slot(n as u32)).await.unwrap()
        }));
    }
    let mut won = 0;
    let mut closed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            ClaimOutcome::Won { payout, .. } => {
                assert_eq!(payout, Amount::new(40));
                won += 1;
            }
            ClaimOutcome::Rejected {
                reason: RejectReason::SessionClosed,
            } => closed += 1,
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert_eq!(won, 1);
    assert_eq!(closed, 3);
    assert_eq!(engine.winners(session.id).await.unwrap().len(), 1);
}

// =========================================================================
// Wallet ledger
// =========================================================================

#[tokio::test]
async fn test_wallet_deposit_and_withdraw_track_ledger() {
    let engine = engine();
    engine.open_wallet(pid(1)).await.unwrap();
    engine.open_wallet(pid(1)).await.unwrap();

    assert_eq!(engine.deposit(pid(1), Amount::new(300)).await.unwrap(), Amount::new(300));
    assert_eq!(engine.withdraw(pid(1), Amount::new(100)).await.unwrap(), Amount::new(200));

    let wallet = engine.wallet(pid(1)).await.unwrap();
    assert_eq!(wallet.balance(), Amount::new(200));
    assert_eq!(wallet.ledger_sum(), wallet.balance());

    let kinds: Vec<_> = engine
        .transactions(pid(1))
        .await
        .unwrap()
        .iter()
        .map(|e| e.kind)
        .collect();
    assert_eq!(kinds, vec![TransactionKind::Withdraw, TransactionKind::Deposit]);
}

#[tokio::test]
async fn test_wallet_withdraw_beyond_balance_changes_nothing() {
    let engine = engine();
    engine.open_wallet(pid(1)).await.unwrap();
    engine.deposit(pid(1), Amount::new(50)).await.unwrap();

    let err = engine.withdraw(pid(1), Amount::new(51)).await.unwrap_err();
    assert!(matches!(err, RoomError::InsufficientBalance { .. }));
    let wallet = engine.wallet(pid(1)).await.unwrap();
    assert_eq!(wallet.balance(), Amount::new(50));
    assert_eq!(wallet.entries().len(), 1);
}

#[tokio::test]
async fn test_wallet_non_positive_amounts_rejected() {
    let engine = engine();
    engine.open_wallet(pid(1)).await.unwrap();
    assert!(matches!(
        engine.deposit(pid(1), Amount::new(0)).await.unwrap_err(),
        RoomError::InvalidAmount(_)
    ));
    assert!(matches!(
        engine.withdraw(pid(1), Amount::new(-3)).await.unwrap_err(),
        RoomError::InvalidAmount(_)
    ));
}

#[tokio::test]
async fn test_wallet_unknown_player_not_found() {
    let engine = engine();
    let err = engine.deposit(pid(8), Amount::new(10)).await.unwrap_err();
    assert!(matches!(err, RoomError::WalletNotFound(_)));
}

// =========================================================================
// Recovery
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_start_due_rooms_starts_expired_countdown() {
    let engine = engine();
    let room = seated_room(&engine, 50, 2).await;

    let report = engine.start_due_rooms().await;
    assert!(report.started.is_empty());

    tokio::time::advance(Duration::from_secs(61)).await;
    let report = engine.start_due_rooms().await;
    assert_eq!(report.started.len(), 1);
    assert_eq!(report.started[0].0, room);
    assert_eq!(engine.room(room).await.unwrap().status, RoomStatus::Active);

    let again = engine.start_due_rooms().await;
    assert!(again.started.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_start_due_rooms_skips_locked_room() {
    let engine = engine();
    let room = seated_room(&engine, 50, 2).await;
    tokio::time::advance(Duration::from_secs(61)).await;

    let held = engine.store().lock_room(room).await.unwrap();
    let report = engine.start_due_rooms().await;
    assert_eq!(report.skipped, 1);
    assert!(report.started.is_empty());
    drop(held);

    let report = engine.start_due_rooms().await;
    assert_eq!(report.started.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_start_due_rooms_defers_to_api_started_session() {
    let engine = engine();
    let room = seated_room(&engine, 50, 2).await;
    let session = engine.start_session(room).await.unwrap();
    tokio::time::advance(Duration::from_secs(61)).await;

    let report = engine.start_due_rooms().await;
    assert!(report.started.is_empty());
    assert_eq!(engine.store().session_ids_for_room(room).await.unwrap(), vec![session.id]);
}

// =========================================================================
// Scenario
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_full_room_scenario_with_threshold_two() {
    let engine = engine_with(RoomConfig {
        min_players_to_start: 2,
        countdown: Duration::from_secs(60),
        card_pool_size: 100,
        default_max_players: 100,
    });
    let room = engine.join_or_create(Amount::new(50)).await.unwrap();
    assert!(room.countdown.is_none());
    let room = engine.join_or_create(Amount::new(50)).await.unwrap();
    assert!(room.countdown.is_some());
    assert_eq!(engine.countdown_info(room.id).await.unwrap().time_left_secs, 60);

    assert!(engine.select_slot(room.id, slot(7), pid(1)).await.unwrap());
    assert!(!engine.select_slot(room.id, slot(7), pid(2)).await.unwrap());
    assert!(engine.select_slot(room.id, slot(8), pid(2)).await.unwrap());

    tokio::time::advance(Duration::from_secs(60)).await;
    let report = engine.start_due_rooms().await;
    let (_, session_id) = report.started[0];

    let mut drawn = 0;
    while let DrawOutcome::Drawn { .. } = engine.draw_number(session_id).await.unwrap() {
        drawn += 1;
    }
    assert_eq!(drawn, 75);
    assert_eq!(engine.session(session_id).await.unwrap().status, SessionStatus::Completed);
}

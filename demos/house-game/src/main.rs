use std::time::Duration;

use bingohall::prelude::*;
use bingohall::{RoomConfig, RoomError, SweepConfig};
use tracing::info;

const PLAYERS: u64 = 4;
const BET: i64 = 25;

// ---------------------------------------------------------------------------
// One game
// ---------------------------------------------------------------------------

/// Asks `player` for a stake and seats them on the slot matching their id.
async fn seat(hall: &BingoHall, player: PlayerId) -> Result<RoomId, BingoHallError> {
    let entry = hall.ask_stake(player).await?;
    let room = hall.answer_stake(player, &entry.token, Amount::new(BET)).await?;
    hall.engine()
        .select_slot(room.id, SlotNumber(player.0 as u32), player)
        .await?;
    Ok(room.id)
}

/// Seats `PLAYERS` players in one room, waits for the sweeper to start it,
/// then draws until someone has a line and claims. Returns the claim.
async fn play(hall: &BingoHall) -> Result<(PlayerId, ClaimOutcome), BingoHallError> {
    let engine = hall.engine();
    let room = seat(hall, PlayerId(1)).await?;
    for n in 2..=PLAYERS {
        seat(hall, PlayerId(n)).await?;
    }

    let session = loop {
        if let Some(session) = engine.latest_session(room).await? {
            break session;
        }
        let countdown = engine.countdown_info(room).await?;
        info!(room_id = %room, secs_left = countdown.time_left_secs, "waiting for start");
        tokio::time::sleep(Duration::from_millis(500)).await;
    };
    info!(room_id = %room, session_id = %session.id, "game started");

    loop {
        let number = match engine.draw_number(session.id).await? {
            DrawOutcome::Drawn { number } => number,
            DrawOutcome::Exhausted => {
                return Err(RoomError::SessionNotActive(session.id).into());
            }
        };
        for n in 1..=PLAYERS {
            let (player, slot) = (PlayerId(n), SlotNumber(n as u32));
            if !engine.mark_number(player, slot, number).await? {
                continue;
            }
            let has_line = engine
                .owned_card_for_slot(player, slot)
                .await?
                .is_some_and(|owned| owned.card.has_line());
            if has_line {
                let outcome = engine.claim_bingo(player, slot).await?;
                return Ok((player, outcome));
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    bingohall::init_tracing();

    let mut settings = HallSettings::from_env()?;
    settings.room = RoomConfig {
        countdown: Duration::from_secs(2),
        ..settings.room
    };
    settings.sweep = SweepConfig::with_interval(Duration::from_secs(1));

    let hall = BingoHall::builder().settings(settings).build();
    let (winner, outcome) = play(&hall).await?;
    if let ClaimOutcome::Won { payout, .. } = outcome {
        let balance = hall.engine().wallet(winner).await?.balance();
        info!(player_id = %winner, %payout, %balance, "house game over");
    }

    hall.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_play_pays_whole_pot_to_winner() {
        let mut settings = HallSettings::default();
        settings.room.card_pool_size = 10;
        settings.room.countdown = Duration::from_secs(2);
        settings.sweep = SweepConfig::with_interval(Duration::from_secs(1));
        let hall = BingoHall::builder().settings(settings).build();

        let (winner, outcome) = play(&hall).await.unwrap();
        let ClaimOutcome::Won { payout, .. } = outcome else {
            panic!("claim rejected: {outcome:?}");
        };
        assert_eq!(payout, Amount::new(BET * PLAYERS as i64));
        assert_eq!(hall.engine().wallet(winner).await.unwrap().balance(), payout);
        hall.shutdown().await;
    }
}

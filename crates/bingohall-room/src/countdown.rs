//! Read-only view of a room's countdown.

use bingohall_protocol::RoomStatus;
use bingohall_store::RoomRow;
use tokio::time::Instant;

/// What a client needs to render a room's countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownInfo {
    /// A countdown is running: time is left and the room is still waiting.
    pub is_active: bool,
    /// Whole seconds until the game starts, clamped at zero.
    pub time_left_secs: u64,
    /// The scheduled start is in the past.
    pub game_started: bool,
    pub game_start_time: Option<Instant>,
}

impl CountdownInfo {
    /// Derives the view from a room snapshot at `now`.
    pub fn of(room: &RoomRow, now: Instant) -> Self {
        let Some(countdown) = room.countdown else {
            return Self {
                is_active: false,
                time_left_secs: 0,
                game_started: false,
                game_start_time: None,
            };
        };
        let time_left_secs = countdown.secs_left(now);
        Self {
            is_active: time_left_secs > 0 && room.status == RoomStatus::Waiting,
            time_left_secs,
            game_started: now > countdown.game_start(),
            game_start_time: Some(countdown.game_start()),
        }
    }
}

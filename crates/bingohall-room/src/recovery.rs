//! Recovery scan: starts rooms whose countdown ran out unattended.

use bingohall_protocol::{RoomId, RoomStatus, SessionId};
use bingohall_store::RoomRow;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::HallEngine;

/// What one recovery scan did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Rooms started by this scan, with their new sessions.
    pub started: Vec<(RoomId, SessionId)>,
    /// Rooms whose row was locked by someone else and were left alone.
    pub skipped: usize,
    /// Rooms whose start failed. They are retried by the next scan.
    pub failed: Vec<RoomId>,
}

/// Waiting, past its scheduled start, and not yet playing.
fn is_due(room: &RoomRow, now: Instant) -> bool {
    room.status == RoomStatus::Waiting
        && room.active_session.is_none()
        && room.countdown.is_some_and(|c| c.is_due(now))
}

impl HallEngine {
    /// Starts every room that is due.
    ///
    /// Rows are try-locked: a room another task is working on is skipped
    /// rather than waited for. Starting goes through the same path as
    /// [`HallEngine::start_session`], so a room started concurrently by an
    /// API call still ends up with exactly one session.
    pub async fn start_due_rooms(&self) -> RecoveryReport {
        let now = Instant::now();
        let mut report = RecoveryReport::default();

        for room_id in self.store.room_ids().await {
            let mut room = match self.store.try_lock_room(room_id).await {
                Ok(Some(guard)) => guard,
                Ok(None) => {
                    debug!(room_id = %room_id, "room locked, skipping");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    error!(room_id = %room_id, error = %e, "recovery lookup failed");
                    report.failed.push(room_id);
                    continue;
                }
            };
            if !is_due(&room, now) {
                continue;
            }
            match self.start_session_locked(&mut room).await {
                Ok(session) => {
                    info!(room_id = %room_id, session_id = %session.id, "recovered stuck room");
                    report.started.push((room_id, session.id));
                }
                Err(e) => {
                    error!(room_id = %room_id, error = %e, "recovery start failed");
                    report.failed.push(room_id);
                }
            }
        }
        report
    }
}

//! Draw engine: session start, number calling and card marking.

use bingohall_protocol::{
    CALL_RANGE, DrawOutcome, PlayerId, RoomId, RoomStatus, SessionId, SlotNumber,
};
use bingohall_store::{RoomRow, SessionRow, StoreError, WinnerRecord};
use rand::Rng;
use rand::seq::SliceRandom;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::{HallEngine, RoomError};

/// The full call range in random order.
fn shuffled_call_range() -> Vec<u8> {
    let mut numbers: Vec<u8> = CALL_RANGE.collect();
    numbers.shuffle(&mut rand::rng());
    numbers
}

/// A uniformly random index below `len`. `len` must be non-zero.
fn random_index(len: usize) -> usize {
    rand::rng().random_range(0..len)
}

impl HallEngine {
    /// Starts the room's session, or returns the one already running.
    ///
    /// Runs under the room row lock, so concurrent callers (API handlers
    /// and the sweeper alike) observe exactly one session.
    ///
    /// # Errors
    /// [`RoomError::RoomClosed`] if the room already finished.
    pub async fn start_session(&self, room_id: RoomId) -> Result<SessionRow, RoomError> {
        let mut room = self.store.lock_room(room_id).await?;
        self.start_session_locked(&mut room).await
    }

    /// Session start for a caller that already holds the room lock.
    pub(crate) async fn start_session_locked(
        &self,
        room: &mut RoomRow,
    ) -> Result<SessionRow, RoomError> {
        if let Some(active) = room.active_session {
            debug!(room_id = %room.id, session_id = %active, "session already running");
            return Ok(self.store.session(active).await?);
        }
        if room.status == RoomStatus::Completed {
            return Err(RoomError::RoomClosed(room.id));
        }

        let session = self.store.insert_session(room, shuffled_call_range()).await;
        room.status = RoomStatus::Active;
        info!(
            room_id = %room.id,
            session_id = %session.id,
            players = room.current_players,
            "session started"
        );
        Ok(session)
    }

    /// Calls the next number.
    ///
    /// When nothing is left the session (and its room) completes with no
    /// winner and [`DrawOutcome::Exhausted`] is returned.
    ///
    /// # Errors
    /// [`RoomError::SessionNotActive`] if the session already completed.
    pub async fn draw_number(&self, session_id: SessionId) -> Result<DrawOutcome, RoomError> {
        let room_id = self.store.session_room(session_id).await?;
        let mut room = self.store.lock_room(room_id).await?;
        let mut session = self.store.lock_session(session_id).await?;
        if !session.is_active() {
            return Err(RoomError::SessionNotActive(session_id));
        }

        if session.remaining.is_empty() {
            session.complete(Instant::now());
            room.status = RoomStatus::Completed;
            room.active_session = None;
            info!(room_id = %room_id, session_id = %session_id, "numbers exhausted, no winner");
            return Ok(DrawOutcome::Exhausted);
        }

        let index = random_index(session.remaining.len());
        let number = session.remaining.swap_remove(index);
        session.drawn.push(number);
        debug!(
            session_id = %session_id,
            number,
            drawn = session.drawn.len(),
            "number drawn"
        );
        Ok(DrawOutcome::Drawn { number })
    }

    /// Marks `number` on the card the player owns through `slot`.
    ///
    /// Returns `true` if the number is on the card. A number that isn't
    /// changes nothing.
    ///
    /// # Errors
    /// [`RoomError::CardNotFound`] if the player holds no card through
    /// that slot.
    pub async fn mark_number(
        &self,
        player: PlayerId,
        slot: SlotNumber,
        number: u8,
    ) -> Result<bool, RoomError> {
        let not_found = || RoomError::CardNotFound { player, slot };
        let (room_id, _) = self
            .store
            .find_selected_slot(player, slot)
            .await?
            .ok_or_else(not_found)?;
        let mut owned = match self.store.lock_owned_card(player, room_id).await {
            Ok(guard) => guard,
            Err(StoreError::NotFound(_)) => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };
        let marked = owned.card.mark(number);
        debug!(room_id = %room_id, player_id = %player, number, marked, "mark");
        Ok(marked)
    }

    /// A snapshot of one session.
    pub async fn session(&self, session_id: SessionId) -> Result<SessionRow, RoomError> {
        Ok(self.store.session(session_id).await?)
    }

    /// The room's running session, else its most recent one.
    pub async fn latest_session(&self, room_id: RoomId) -> Result<Option<SessionRow>, RoomError> {
        let room = self.store.room(room_id).await?;
        let id = match room.active_session {
            Some(id) => Some(id),
            None => self.store.session_ids_for_room(room_id).await?.pop(),
        };
        match id {
            Some(id) => Ok(Some(self.store.session(id).await?)),
            None => Ok(None),
        }
    }

    /// Winners recorded for the session.
    pub async fn winners(&self, session_id: SessionId) -> Result<Vec<WinnerRecord>, RoomError> {
        Ok(self.store.session(session_id).await?.winner.into_iter().collect())
    }
}

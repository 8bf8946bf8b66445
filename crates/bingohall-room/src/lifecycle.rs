//! Room lifecycle: creation, joins and leaves, countdown, matchmaking.

use std::time::Duration;

use bingohall_protocol::{Amount, AuditAction, PlayerId, RoomId, RoomStatus};
use bingohall_store::{Countdown, RoomRow};
use serde_json::json;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::engine::audit_entry;
use crate::{CountdownInfo, HallEngine, RoomError};

impl HallEngine {
    /// Creates a `Waiting` room and its card pool.
    ///
    /// A `max_players` of 0 means [`RoomConfig::default_max_players`](crate::RoomConfig).
    pub async fn create_room(
        &self,
        bet_amount: Amount,
        max_players: u32,
    ) -> Result<RoomRow, RoomError> {
        if !bet_amount.is_positive() {
            return Err(RoomError::InvalidBetAmount(bet_amount));
        }
        let max_players = if max_players == 0 {
            self.config.default_max_players
        } else {
            max_players
        };
        let room = self.store.insert_room(bet_amount, max_players).await;
        self.ensure_pool(room.id).await?;
        info!(room_id = %room.id, bet = %bet_amount, max_players, "room created");
        Ok(room)
    }

    /// Adds one player to the room's count.
    ///
    /// The count check, the increment and countdown arming happen under
    /// one row lock: the countdown is armed when the new count reaches
    /// [`RoomConfig::min_players_to_start`](crate::RoomConfig) and no
    /// countdown is running yet.
    ///
    /// # Errors
    /// [`RoomError::NotJoinable`] unless the room is `Waiting`,
    /// [`RoomError::CapacityExceeded`] if it is full.
    pub async fn join(&self, room_id: RoomId) -> Result<RoomRow, RoomError> {
        let mut room = self.store.lock_room(room_id).await?;
        if !room.status.is_joinable() {
            return Err(RoomError::NotJoinable {
                room: room_id,
                status: room.status,
            });
        }
        if !room.has_capacity() {
            return Err(RoomError::CapacityExceeded(room_id));
        }

        room.current_players += 1;
        if room.current_players >= self.config.min_players_to_start && room.countdown.is_none() {
            room.countdown = Some(Countdown::arm(Instant::now(), self.config.countdown));
            info!(
                room_id = %room_id,
                players = room.current_players,
                countdown_secs = self.config.countdown.as_secs(),
                "countdown armed"
            );
        }
        debug!(room_id = %room_id, players = room.current_players, "player joined");
        Ok(room.clone())
    }

    /// Removes `player` from the room: their slots are released, their
    /// owned card deleted and the count decremented (never below zero).
    /// An empty room loses its countdown.
    pub async fn leave(&self, room_id: RoomId, player: PlayerId) -> Result<RoomRow, RoomError> {
        let mut room = self.store.lock_room(room_id).await?;
        let released = self
            .store
            .release_seat(room_id, player, |slots| {
                audit_entry(
                    player,
                    AuditAction::RoomLeft,
                    json!({ "room_id": room_id, "released_slots": slots }),
                )
            })
            .await?;

        room.current_players = room.current_players.saturating_sub(1);
        if room.current_players == 0 {
            room.countdown = None;
        }
        let snapshot = room.clone();
        drop(room);

        info!(
            room_id = %room_id,
            player_id = %player,
            players = snapshot.current_players,
            released = released.len(),
            "player left"
        );
        Ok(snapshot)
    }

    /// The room's countdown as of now. Reads only.
    pub async fn countdown_info(&self, room_id: RoomId) -> Result<CountdownInfo, RoomError> {
        let room = self.store.room(room_id).await?;
        Ok(CountdownInfo::of(&room, Instant::now()))
    }

    /// The oldest `Waiting` room with this bet and a free seat, or a new
    /// room if there is none.
    pub async fn find_or_create_room(&self, bet_amount: Amount) -> Result<RoomRow, RoomError> {
        if !bet_amount.is_positive() {
            return Err(RoomError::InvalidBetAmount(bet_amount));
        }
        let existing = self
            .store
            .rooms()
            .await?
            .into_iter()
            .find(|r| r.bet_amount == bet_amount && r.is_open());
        match existing {
            Some(room) => Ok(room),
            None => self.create_room(bet_amount, 0).await,
        }
    }

    /// Finds or creates a room for this bet and joins it.
    ///
    /// A room can fill up (or start) between the scan and the join; such
    /// rooms are skipped and the scan runs again.
    pub async fn join_or_create(&self, bet_amount: Amount) -> Result<RoomRow, RoomError> {
        loop {
            let candidate = self.find_or_create_room(bet_amount).await?;
            match self.join(candidate.id).await {
                Ok(room) => return Ok(room),
                Err(RoomError::CapacityExceeded(_) | RoomError::NotJoinable { .. }) => {
                    debug!(room_id = %candidate.id, "room filled before join, rescanning");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Arms the countdown to end `secs` from now, replacing any running
    /// countdown.
    pub async fn force_countdown(&self, room_id: RoomId, secs: u64) -> Result<RoomRow, RoomError> {
        let mut room = self.store.lock_room(room_id).await?;
        room.countdown = Some(Countdown::arm(Instant::now(), Duration::from_secs(secs)));
        info!(room_id = %room_id, secs, "countdown forced");
        Ok(room.clone())
    }

    /// Clears the room's countdown.
    pub async fn reset_countdown(&self, room_id: RoomId) -> Result<RoomRow, RoomError> {
        let mut room = self.store.lock_room(room_id).await?;
        room.countdown = None;
        info!(room_id = %room_id, "countdown reset");
        Ok(room.clone())
    }

    /// A snapshot of one room.
    pub async fn room(&self, room_id: RoomId) -> Result<RoomRow, RoomError> {
        Ok(self.store.room(room_id).await?)
    }

    /// Rooms that are waiting or being played, newest first.
    pub async fn list_rooms(&self) -> Result<Vec<RoomRow>, RoomError> {
        let mut rooms: Vec<RoomRow> = self
            .store
            .rooms()
            .await?
            .into_iter()
            .filter(|r| r.status != RoomStatus::Completed)
            .collect();
        rooms.reverse();
        Ok(rooms)
    }
}

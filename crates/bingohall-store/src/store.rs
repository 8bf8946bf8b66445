//! In-process implementation of the transactional store.
//!
//! Every row sits behind its own `Arc<Mutex<_>>`; tables are maps from key
//! to row, guarded by a `RwLock` that is only ever held long enough to
//! clone an `Arc` out or insert a new row. No table lock is held across a
//! row lock wait.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bingohall_protocol::{
    Amount, Card, CardId, PlayerId, RoomId, RoomStatus, SessionId,
    SessionStatus, SlotNumber,
};
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::time::{self, Instant};
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::{RowRef, StoreError};
use crate::model::{
    AuditEntry, OwnedCard, RoomRow, SessionRow, SlotRow, Wallet,
};

/// An exclusive lock on one row. Writes through the guard are visible to
/// everyone once it is dropped.
pub type RowGuard<T> = OwnedMutexGuard<T>;

type Row<T> = Arc<Mutex<T>>;

/// Sets `selected_by` on the numbered slot if it is free.
fn claim_unclaimed(slots: &mut [SlotRow], number: SlotNumber, player: PlayerId) -> Option<SlotRow> {
    let slot = slots.iter_mut().find(|s| s.number == number)?;
    if slot.is_selected() {
        return None;
    }
    slot.selected_by = Some(player);
    Some(slot.clone())
}

/// The in-process store.
///
/// Ids are allocated from per-store counters starting at 1, so two stores
/// never share state.
pub struct MemoryStore {
    config: StoreConfig,
    next_room: AtomicU64,
    next_session: AtomicU64,
    next_card: AtomicU64,
    rooms: RwLock<BTreeMap<RoomId, Row<RoomRow>>>,
    pools: RwLock<HashMap<RoomId, Row<Vec<SlotRow>>>>,
    cards: RwLock<HashMap<(PlayerId, RoomId), Row<OwnedCard>>>,
    sessions: RwLock<BTreeMap<SessionId, Row<SessionRow>>>,
    wallets: RwLock<HashMap<PlayerId, Row<Wallet>>>,
    audit: Mutex<Vec<AuditEntry>>,
}

impl MemoryStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            next_room: AtomicU64::new(1),
            next_session: AtomicU64::new(1),
            next_card: AtomicU64::new(1),
            rooms: RwLock::new(BTreeMap::new()),
            pools: RwLock::new(HashMap::new()),
            cards: RwLock::new(HashMap::new()),
            sessions: RwLock::new(BTreeMap::new()),
            wallets: RwLock::new(HashMap::new()),
            audit: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Waits for `row`, giving up after the configured lock timeout.
    async fn acquire<T>(
        &self,
        row: Row<T>,
        what: RowRef,
    ) -> Result<RowGuard<T>, StoreError> {
        match time::timeout(self.config.lock_timeout, row.lock_owned()).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                warn!(row = %what, "row lock timed out");
                Err(StoreError::LockTimeout(what))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Rooms
    // -----------------------------------------------------------------------

    /// Inserts a fresh `Waiting` room with no players and no countdown.
    pub async fn insert_room(&self, bet_amount: Amount, max_players: u32) -> RoomRow {
        let id = RoomId(self.next_room.fetch_add(1, Ordering::Relaxed));
        let row = RoomRow {
            id,
            bet_amount,
            current_players: 0,
            max_players,
            status: RoomStatus::Waiting,
            countdown: None,
            active_session: None,
            created_at: Instant::now(),
        };
        self.rooms
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(row.clone())));
        debug!(room_id = %id, bet = %bet_amount, max_players, "room inserted");
        row
    }

    async fn room_row(&self, id: RoomId) -> Result<Row<RoomRow>, StoreError> {
        self.rooms
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(RowRef::Room(id)))
    }

    /// Locks a room row.
    pub async fn lock_room(&self, id: RoomId) -> Result<RowGuard<RoomRow>, StoreError> {
        let row = self.room_row(id).await?;
        self.acquire(row, RowRef::Room(id)).await
    }

    /// Locks a room row if nobody else holds it. `Ok(None)` means the row
    /// is busy.
    pub async fn try_lock_room(
        &self,
        id: RoomId,
    ) -> Result<Option<RowGuard<RoomRow>>, StoreError> {
        let row = self.room_row(id).await?;
        Ok(row.try_lock_owned().ok())
    }

    /// A consistent snapshot of one room.
    pub async fn room(&self, id: RoomId) -> Result<RoomRow, StoreError> {
        Ok(self.lock_room(id).await?.clone())
    }

    /// Every room id, oldest first.
    pub async fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.read().await.keys().copied().collect()
    }

    /// Snapshots of every room, oldest first.
    pub async fn rooms(&self) -> Result<Vec<RoomRow>, StoreError> {
        let mut out = Vec::new();
        for id in self.room_ids().await {
            out.push(self.room(id).await?);
        }
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Card pool
    // -----------------------------------------------------------------------

    async fn pool_row(&self, room_id: RoomId) -> Result<Row<Vec<SlotRow>>, StoreError> {
        if !self.rooms.read().await.contains_key(&room_id) {
            return Err(StoreError::NotFound(RowRef::Room(room_id)));
        }
        if let Some(row) = self.pools.read().await.get(&room_id) {
            return Ok(Arc::clone(row));
        }
        let mut pools = self.pools.write().await;
        Ok(Arc::clone(pools.entry(room_id).or_default()))
    }

    /// Fills the room's pool with `build()` if it has no slots yet.
    /// Slots are numbered from 1 in the order `build` returns them.
    ///
    /// Returns `true` if this call created the pool. Concurrent callers
    /// serialize on the pool lock, so `build` runs at most once per room.
    pub async fn insert_pool_if_empty<F>(
        &self,
        room_id: RoomId,
        build: F,
    ) -> Result<bool, StoreError>
    where
        F: FnOnce() -> Vec<Card>,
    {
        let row = self.pool_row(room_id).await?;
        let mut slots = self.acquire(row, RowRef::Pool(room_id)).await?;
        if !slots.is_empty() {
            return Ok(false);
        }
        slots.extend(build().into_iter().zip(1u32..).map(|(card, n)| SlotRow {
            number: SlotNumber(n),
            card,
            selected_by: None,
        }));
        debug!(room_id = %room_id, size = slots.len(), "card pool created");
        Ok(true)
    }

    /// Snapshot of every slot in the room, by slot number. Empty if the
    /// pool hasn't been created.
    pub async fn slots(&self, room_id: RoomId) -> Result<Vec<SlotRow>, StoreError> {
        let row = self.pool_row(room_id).await?;
        Ok(self.acquire(row, RowRef::Pool(room_id)).await?.clone())
    }

    /// Marks the slot as selected by `player` only if it exists and nobody
    /// holds it. Returns the updated slot, or `None` if no row matched.
    pub async fn claim_slot_if_unclaimed(
        &self,
        room_id: RoomId,
        number: SlotNumber,
        player: PlayerId,
    ) -> Result<Option<SlotRow>, StoreError> {
        let row = self.pool_row(room_id).await?;
        let mut slots = self.acquire(row, RowRef::Pool(room_id)).await?;
        Ok(claim_unclaimed(&mut slots, number, player))
    }

    /// Like [`claim_slot_if_unclaimed`](Self::claim_slot_if_unclaimed), and
    /// on success copies the slot's card to the player unless they already
    /// own one in the room. The pool stays locked until the card exists, so
    /// [`release_seat`](Self::release_seat) sees both or neither.
    ///
    /// Returns the slot and the new card id (`None` if the player already
    /// had a card), or `None` if no slot row matched.
    pub async fn claim_slot_with_card(
        &self,
        room_id: RoomId,
        number: SlotNumber,
        player: PlayerId,
    ) -> Result<Option<(SlotRow, Option<CardId>)>, StoreError> {
        let row = self.pool_row(room_id).await?;
        let mut slots = self.acquire(row, RowRef::Pool(room_id)).await?;
        let Some(slot) = claim_unclaimed(&mut slots, number, player) else {
            return Ok(None);
        };
        let card_id = self
            .insert_card_if_absent(player, room_id, slot.number, slot.card.clone())
            .await;
        Ok(Some((slot, card_id)))
    }

    /// Clears every slot `player` holds in the room, deletes their owned
    /// card and appends the audit entry `audit` builds from the released
    /// slot numbers, all under the pool lock. Returns the released slots.
    pub async fn release_seat<F>(
        &self,
        room_id: RoomId,
        player: PlayerId,
        audit: F,
    ) -> Result<Vec<SlotNumber>, StoreError>
    where
        F: FnOnce(&[SlotNumber]) -> AuditEntry,
    {
        let row = self.pool_row(room_id).await?;
        let mut slots = self.acquire(row, RowRef::Pool(room_id)).await?;
        let mut released = Vec::new();
        for slot in slots.iter_mut().filter(|s| s.selected_by == Some(player)) {
            slot.selected_by = None;
            released.push(slot.number);
        }
        self.delete_owned_card(player, room_id).await;
        self.append_audit(audit(&released)).await;
        Ok(released)
    }

    /// The slot `player` holds in the room, if any.
    pub async fn selected_slot(
        &self,
        room_id: RoomId,
        player: PlayerId,
    ) -> Result<Option<SlotRow>, StoreError> {
        let row = self.pool_row(room_id).await?;
        let slots = self.acquire(row, RowRef::Pool(room_id)).await?;
        Ok(slots.iter().find(|s| s.selected_by == Some(player)).cloned())
    }

    /// Finds the slot numbered `number` that `player` holds, searching the
    /// newest room first.
    pub async fn find_selected_slot(
        &self,
        player: PlayerId,
        number: SlotNumber,
    ) -> Result<Option<(RoomId, SlotRow)>, StoreError> {
        let mut pools: Vec<(RoomId, Row<Vec<SlotRow>>)> = self
            .pools
            .read()
            .await
            .iter()
            .map(|(id, row)| (*id, Arc::clone(row)))
            .collect();
        pools.sort_by(|a, b| b.0.cmp(&a.0));

        for (room_id, row) in pools {
            let slots = self.acquire(row, RowRef::Pool(room_id)).await?;
            if let Some(slot) = slots
                .iter()
                .find(|s| s.number == number && s.selected_by == Some(player))
            {
                return Ok(Some((room_id, slot.clone())));
            }
        }
        Ok(None)
    }

    /// Distinct players holding a slot in the room, ascending.
    pub async fn selecting_players(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<PlayerId>, StoreError> {
        let row = self.pool_row(room_id).await?;
        let slots = self.acquire(row, RowRef::Pool(room_id)).await?;
        let mut players: Vec<PlayerId> = slots.iter().filter_map(|s| s.selected_by).collect();
        players.sort();
        players.dedup();
        Ok(players)
    }

    // -----------------------------------------------------------------------
    // Owned cards
    // -----------------------------------------------------------------------

    /// Inserts the player's card for the room unless one already exists.
    /// Returns the new card id, or `None` if the player already had a card.
    pub async fn insert_card_if_absent(
        &self,
        player: PlayerId,
        room_id: RoomId,
        slot: SlotNumber,
        card: Card,
    ) -> Option<CardId> {
        let mut cards = self.cards.write().await;
        if cards.contains_key(&(player, room_id)) {
            return None;
        }
        let id = CardId(self.next_card.fetch_add(1, Ordering::Relaxed));
        let row = OwnedCard {
            id,
            player_id: player,
            room_id,
            slot,
            card,
            created_at: Utc::now(),
        };
        cards.insert((player, room_id), Arc::new(Mutex::new(row)));
        Some(id)
    }

    /// Locks the player's card for the room.
    pub async fn lock_owned_card(
        &self,
        player: PlayerId,
        room_id: RoomId,
    ) -> Result<RowGuard<OwnedCard>, StoreError> {
        let what = RowRef::Card(player, room_id);
        let row = self
            .cards
            .read()
            .await
            .get(&(player, room_id))
            .cloned()
            .ok_or(StoreError::NotFound(what))?;
        self.acquire(row, what).await
    }

    /// Snapshot of the player's card for the room, if any.
    pub async fn owned_card(
        &self,
        player: PlayerId,
        room_id: RoomId,
    ) -> Result<Option<OwnedCard>, StoreError> {
        match self.lock_owned_card(player, room_id).await {
            Ok(guard) => Ok(Some(guard.clone())),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Deletes the player's card for the room. Returns `true` if a card
    /// was removed.
    pub async fn delete_owned_card(&self, player: PlayerId, room_id: RoomId) -> bool {
        self.cards.write().await.remove(&(player, room_id)).is_some()
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    /// Inserts a new `Active` session for `room` with `remaining` as the
    /// numbers still to call.
    ///
    /// Takes the room row by mutable reference so that only a caller
    /// holding the room lock can start a session; the room's
    /// `active_session` is pointed at the new session.
    pub async fn insert_session(&self, room: &mut RoomRow, remaining: Vec<u8>) -> SessionRow {
        let id = SessionId(self.next_session.fetch_add(1, Ordering::Relaxed));
        let row = SessionRow {
            id,
            room_id: room.id,
            status: SessionStatus::Active,
            remaining,
            drawn: Vec::new(),
            started_at: Instant::now(),
            ended_at: None,
            winner: None,
        };
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(row.clone())));
        room.active_session = Some(id);
        row
    }

    async fn session_row(&self, id: SessionId) -> Result<Row<SessionRow>, StoreError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(RowRef::Session(id)))
    }

    /// Locks a session row.
    pub async fn lock_session(&self, id: SessionId) -> Result<RowGuard<SessionRow>, StoreError> {
        let row = self.session_row(id).await?;
        self.acquire(row, RowRef::Session(id)).await
    }

    /// A consistent snapshot of one session.
    pub async fn session(&self, id: SessionId) -> Result<SessionRow, StoreError> {
        Ok(self.lock_session(id).await?.clone())
    }

    /// The room a session belongs to. Never changes, so no lock is taken
    /// beyond the one needed to read it.
    pub async fn session_room(&self, id: SessionId) -> Result<RoomId, StoreError> {
        Ok(self.session(id).await?.room_id)
    }

    /// Ids of every session played in the room, oldest first.
    pub async fn session_ids_for_room(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<SessionId>, StoreError> {
        let rows: Vec<(SessionId, Row<SessionRow>)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, row)| (*id, Arc::clone(row)))
            .collect();
        let mut out = Vec::new();
        for (id, row) in rows {
            if self.acquire(row, RowRef::Session(id)).await?.room_id == room_id {
                out.push(id);
            }
        }
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Wallets
    // -----------------------------------------------------------------------

    /// Creates an empty wallet for the player if none exists. Returns a
    /// snapshot either way.
    pub async fn open_wallet(&self, player: PlayerId) -> Result<Wallet, StoreError> {
        let row = {
            let mut wallets = self.wallets.write().await;
            Arc::clone(
                wallets
                    .entry(player)
                    .or_insert_with(|| Arc::new(Mutex::new(Wallet::new(player)))),
            )
        };
        Ok(self.acquire(row, RowRef::Wallet(player)).await?.clone())
    }

    /// Locks a wallet row.
    pub async fn lock_wallet(&self, player: PlayerId) -> Result<RowGuard<Wallet>, StoreError> {
        let what = RowRef::Wallet(player);
        let row = self
            .wallets
            .read()
            .await
            .get(&player)
            .cloned()
            .ok_or(StoreError::NotFound(what))?;
        self.acquire(row, what).await
    }

    /// A consistent snapshot of one wallet.
    pub async fn wallet(&self, player: PlayerId) -> Result<Wallet, StoreError> {
        Ok(self.lock_wallet(player).await?.clone())
    }

    // -----------------------------------------------------------------------
    // Audit
    // -----------------------------------------------------------------------

    pub async fn append_audit(&self, entry: AuditEntry) {
        self.audit.lock().await.push(entry);
    }

    /// The player's audit entries, newest first, at most `limit`.
    pub async fn audit_for(&self, player: PlayerId, limit: usize) -> Vec<AuditEntry> {
        self.audit
            .lock()
            .await
            .iter()
            .rev()
            .filter(|e| e.player_id == player)
            .take(limit)
            .cloned()
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

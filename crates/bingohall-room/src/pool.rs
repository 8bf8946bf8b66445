//! Card pool: per-room numbered card offers.

use bingohall_protocol::{
    AuditAction, COLUMN_BANDS, Card, FREE_SPACE, GRID_SIZE, PlayerId,
    ProtocolError, RoomId, SlotNumber,
};
use bingohall_store::{OwnedCard, SlotRow};
use rand::Rng;
use rand::seq::SliceRandom;
use serde_json::json;
use tracing::{debug, info};

use crate::{HallEngine, RoomError};

/// Generates one card: five distinct numbers per column band, center set
/// to the free space.
fn generate_card<R: Rng + ?Sized>(rng: &mut R) -> Result<Card, ProtocolError> {
    let mut grid = [[0u8; GRID_SIZE]; GRID_SIZE];
    for (col, band) in COLUMN_BANDS.iter().enumerate() {
        let mut numbers: Vec<u8> = band.clone().collect();
        numbers.shuffle(rng);
        for (row, &n) in numbers.iter().take(GRID_SIZE).enumerate() {
            grid[row][col] = n;
        }
    }
    let center = GRID_SIZE / 2;
    grid[center][center] = FREE_SPACE;
    Card::from_grid(grid)
}

/// Generates `size` cards, no two with the same grid.
fn generate_pool(size: usize) -> Result<Vec<Card>, ProtocolError> {
    let mut rng = rand::rng();
    let mut cards: Vec<Card> = Vec::with_capacity(size);
    while cards.len() < size {
        let card = generate_card(&mut rng)?;
        if !cards.iter().any(|c| c.same_grid(&card)) {
            cards.push(card);
        }
    }
    Ok(cards)
}

impl HallEngine {
    /// Creates the room's card pool if it has none. Idempotent, and safe
    /// to call whenever a read finds the pool empty.
    ///
    /// Returns `true` if this call created the pool.
    pub async fn ensure_pool(&self, room_id: RoomId) -> Result<bool, RoomError> {
        if !self.store.slots(room_id).await?.is_empty() {
            return Ok(false);
        }
        let cards = generate_pool(self.config.card_pool_size)?;
        let created = self.store.insert_pool_if_empty(room_id, move || cards).await?;
        if created {
            info!(room_id = %room_id, size = self.config.card_pool_size, "card pool ready");
        }
        Ok(created)
    }

    /// Every slot in the room with its selection state, creating the pool
    /// first if needed.
    pub async fn available_slots(&self, room_id: RoomId) -> Result<Vec<SlotRow>, RoomError> {
        self.ensure_pool(room_id).await?;
        Ok(self.store.slots(room_id).await?)
    }

    /// Takes `slot` for `player` if nobody holds it.
    ///
    /// Returns `Ok(false)` without changing anything when the slot is
    /// already taken. On success the player gets an owned copy of the
    /// card, unless they already own one in this room.
    ///
    /// # Errors
    /// [`RoomError::InvalidSlot`] for a number outside the pool,
    /// [`RoomError::NotFound`] for an unknown room.
    pub async fn select_slot(
        &self,
        room_id: RoomId,
        slot: SlotNumber,
        player: PlayerId,
    ) -> Result<bool, RoomError> {
        if slot.0 == 0 || slot.0 as usize > self.config.card_pool_size {
            return Err(RoomError::InvalidSlot { room: room_id, slot });
        }
        self.ensure_pool(room_id).await?;

        let Some((_, card_id)) = self
            .store
            .claim_slot_with_card(room_id, slot, player)
            .await?
        else {
            debug!(room_id = %room_id, %slot, player_id = %player, "slot already taken");
            return Ok(false);
        };

        self.audit(
            player,
            AuditAction::SlotSelected,
            json!({ "room_id": room_id, "slot": slot, "card_id": card_id }),
        )
        .await;
        info!(room_id = %room_id, %slot, player_id = %player, "slot selected");
        Ok(true)
    }

    /// The owned card behind `slot`, in the newest room where `player`
    /// holds that slot number.
    pub async fn owned_card_for_slot(
        &self,
        player: PlayerId,
        slot: SlotNumber,
    ) -> Result<Option<OwnedCard>, RoomError> {
        let Some((room_id, _)) = self.store.find_selected_slot(player, slot).await? else {
            return Ok(None);
        };
        Ok(self.store.owned_card(player, room_id).await?)
    }

    /// The slot `player` holds in the room, if any.
    pub async fn slot_for_player(
        &self,
        room_id: RoomId,
        player: PlayerId,
    ) -> Result<Option<SlotRow>, RoomError> {
        Ok(self.store.selected_slot(room_id, player).await?)
    }

    /// Distinct players holding a slot in the room.
    pub async fn room_players(&self, room_id: RoomId) -> Result<Vec<PlayerId>, RoomError> {
        Ok(self.store.selecting_players(room_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_card_respects_bands_and_free_space() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let card = generate_card(&mut rng).unwrap();
            assert_eq!(card.number_at(2, 2), FREE_SPACE);
            assert!(card.is_marked(2, 2));
            for col in 0..GRID_SIZE {
                for row in 0..GRID_SIZE {
                    if (row, col) != (2, 2) {
                        assert!(COLUMN_BANDS[col].contains(&card.number_at(row, col)));
                    }
                }
            }
        }
    }

    #[test]
    fn test_generate_pool_has_no_duplicate_grids() {
        let pool = generate_pool(100).unwrap();
        assert_eq!(pool.len(), 100);
        let distinct: HashSet<_> = pool.iter().map(|c| *c.grid()).collect();
        assert_eq!(distinct.len(), 100);
    }
}

//! Claim validation and payout.

use std::collections::HashSet;

use bingohall_protocol::{
    AuditAction, ClaimOutcome, PlayerId, RejectReason, RoomStatus, SlotNumber,
};
use bingohall_store::{StoreError, WinnerRecord};
use chrono::Utc;
use serde_json::json;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::engine::audit_entry;
use crate::{HallEngine, RoomError};

impl HallEngine {
    /// Claims bingo on the card the player owns through `slot`.
    ///
    /// One transaction, holding room → session → owned card → wallet:
    ///
    /// - An invalid card (a marked number that was never drawn, or no
    ///   complete line) costs the player their seat: slots released, owned
    ///   card deleted. Returns `Rejected(InvalidClaim)`.
    /// - A valid card wins `bet × distinct seated players`. The winner
    ///   record, wallet credit, session completion and room completion are
    ///   all written together.
    /// - If the session is already closed, returns `Rejected(SessionClosed)`
    ///   and changes nothing.
    ///
    /// Concurrent valid claims are ordered by who gets the session lock
    /// first; only that one wins.
    ///
    /// # Errors
    /// [`RoomError::CardNotFound`] if the player holds no card through
    /// `slot`, [`RoomError::NoActiveSession`] if the room never started.
    pub async fn claim_bingo(
        &self,
        player: PlayerId,
        slot: SlotNumber,
    ) -> Result<ClaimOutcome, RoomError> {
        let not_found = || RoomError::CardNotFound { player, slot };
        let (room_id, _) = self
            .store
            .find_selected_slot(player, slot)
            .await?
            .ok_or_else(not_found)?;

        let mut room = self.store.lock_room(room_id).await?;
        let Some(session_id) = room.active_session else {
            if self.store.session_ids_for_room(room_id).await?.is_empty() {
                return Err(RoomError::NoActiveSession(room_id));
            }
            info!(room_id = %room_id, player_id = %player, "claim after session closed");
            return Ok(ClaimOutcome::Rejected {
                reason: RejectReason::SessionClosed,
            });
        };
        let mut session = self.store.lock_session(session_id).await?;
        if !session.is_active() {
            return Ok(ClaimOutcome::Rejected {
                reason: RejectReason::SessionClosed,
            });
        }

        let seated = self.store.selecting_players(room_id).await?.len() as u64;

        let owned = match self.store.lock_owned_card(player, room_id).await {
            Ok(guard) => guard,
            Err(StoreError::NotFound(_)) => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };
        let drawn: HashSet<u8> = session.drawn.iter().copied().collect();

        if !owned.card.is_winning(&drawn) {
            let card_id = owned.id;
            drop(owned);
            self.store
                .release_seat(room_id, player, |slots| {
                    audit_entry(
                        player,
                        AuditAction::InvalidClaim,
                        json!({
                            "room_id": room_id,
                            "session_id": session_id,
                            "card_id": card_id,
                            "released_slots": slots,
                        }),
                    )
                })
                .await?;
            drop(session);
            drop(room);

            warn!(room_id = %room_id, player_id = %player, %slot, "invalid claim, seat revoked");
            return Ok(ClaimOutcome::Rejected {
                reason: RejectReason::InvalidClaim,
            });
        }

        let payout = room
            .bet_amount
            .checked_mul(seated)
            .ok_or(RoomError::PotOverflow(room_id))?;
        self.store.open_wallet(player).await?;
        let mut wallet = self.store.lock_wallet(player).await?;
        let now = Utc::now();
        // First write. Everything after it is infallible.
        self.credit_win(&mut wallet, payout, now)?;

        session.winner = Some(WinnerRecord {
            session_id,
            player_id: player,
            card_id: owned.id,
            payout,
            won_at: now,
        });
        session.complete(Instant::now());
        room.status = RoomStatus::Completed;
        room.active_session = None;
        let card_id = owned.id;
        drop(wallet);
        drop(owned);

        self.audit(
            player,
            AuditAction::Won,
            json!({
                "room_id": room_id,
                "session_id": session_id,
                "card_id": card_id,
                "payout": payout,
                "seated_players": seated,
            }),
        )
        .await;
        drop(session);
        drop(room);

        info!(
            room_id = %room_id,
            session_id = %session_id,
            player_id = %player,
            payout = %payout,
            "bingo"
        );
        Ok(ClaimOutcome::Won { session_id, payout })
    }
}

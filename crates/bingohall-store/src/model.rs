//! Row types held by the store.
//!
//! Rows are plain data. Invariants that span a single row are kept by the
//! row's own methods (a countdown always has both ends set, a wallet's
//! balance always equals its ledger sum). Invariants that span rows are the
//! engine's job.

use bingohall_protocol::{
    Amount, AuditAction, Card, CardId, PlayerId, RoomId, RoomStatus,
    SessionId, SessionStatus, SlotNumber, TransactionKind,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

/// An armed countdown. Both ends are set together, and
/// `started_at <= game_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    started_at: Instant,
    game_start: Instant,
}

impl Countdown {
    /// Arms a countdown at `now` that ends after `duration`.
    pub fn arm(now: Instant, duration: Duration) -> Self {
        Self {
            started_at: now,
            game_start: now + duration,
        }
    }

    /// When the countdown was armed.
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// When the game is due to start.
    pub fn game_start(&self) -> Instant {
        self.game_start
    }

    /// Whole seconds until the game starts, never negative.
    pub fn secs_left(&self, now: Instant) -> u64 {
        self.game_start.saturating_duration_since(now).as_secs()
    }

    /// Returns `true` once `now` has reached the game start.
    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.game_start
    }
}

/// A bingo room.
#[derive(Debug, Clone)]
pub struct RoomRow {
    pub id: RoomId,
    pub bet_amount: Amount,
    pub current_players: u32,
    pub max_players: u32,
    pub status: RoomStatus,
    pub countdown: Option<Countdown>,
    /// The session currently being played, if any. Set and cleared only
    /// while the room row is locked, so a room has at most one.
    pub active_session: Option<SessionId>,
    pub created_at: Instant,
}

impl RoomRow {
    /// Returns `true` if another player fits.
    pub fn has_capacity(&self) -> bool {
        self.current_players < self.max_players
    }

    /// Returns `true` if the room accepts a join right now.
    pub fn is_open(&self) -> bool {
        self.status.is_joinable() && self.has_capacity()
    }
}

// ---------------------------------------------------------------------------
// Card pool
// ---------------------------------------------------------------------------

/// One pre-generated card in a room's pool.
#[derive(Debug, Clone)]
pub struct SlotRow {
    pub number: SlotNumber,
    pub card: Card,
    pub selected_by: Option<PlayerId>,
}

impl SlotRow {
    /// A slot is selected exactly when it has an owner.
    pub fn is_selected(&self) -> bool {
        self.selected_by.is_some()
    }
}

/// A player's personal copy of the card in the slot they hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnedCard {
    pub id: CardId,
    pub player_id: PlayerId,
    pub room_id: RoomId,
    pub slot: SlotNumber,
    pub card: Card,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// The winner of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerRecord {
    pub session_id: SessionId,
    pub player_id: PlayerId,
    pub card_id: CardId,
    pub payout: Amount,
    pub won_at: DateTime<Utc>,
}

/// One play-through of a room.
#[derive(Debug, Clone)]
pub struct SessionRow {
    pub id: SessionId,
    pub room_id: RoomId,
    pub status: SessionStatus,
    /// Numbers not yet called. Disjoint from `drawn`, and together they
    /// are exactly the call range.
    pub remaining: Vec<u8>,
    /// Numbers already called, in draw order.
    pub drawn: Vec<u8>,
    pub started_at: Instant,
    pub ended_at: Option<Instant>,
    pub winner: Option<WinnerRecord>,
}

impl SessionRow {
    /// Returns `true` while numbers can still be drawn and claims made.
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Moves the session to `Completed` and stamps its end time.
    pub fn complete(&mut self, now: Instant) {
        self.status = SessionStatus::Completed;
        self.ended_at = Some(now);
    }
}

// ---------------------------------------------------------------------------
// Wallets
// ---------------------------------------------------------------------------

/// One ledger entry. Amounts are stored unsigned; the kind supplies the
/// sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub kind: TransactionKind,
    pub amount: Amount,
    pub created_at: DateTime<Utc>,
}

/// A player's wallet and its full ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub player_id: PlayerId,
    balance: Amount,
    entries: Vec<LedgerEntry>,
}

impl Wallet {
    /// An empty wallet.
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            balance: Amount::ZERO,
            entries: Vec::new(),
        }
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Ledger entries, oldest first.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Applies `amount` of `kind` to the balance and appends the matching
    /// entry. Returns the new balance, or `None` (and changes nothing) if
    /// the balance would overflow.
    ///
    /// Sufficiency checks are the caller's: a withdrawal is applied as
    /// asked.
    pub fn apply(
        &mut self,
        kind: TransactionKind,
        amount: Amount,
        at: DateTime<Utc>,
    ) -> Option<Amount> {
        let balance = self.balance.checked_add(kind.signed(amount))?;
        self.balance = balance;
        self.entries.push(LedgerEntry {
            kind,
            amount,
            created_at: at,
        });
        Some(balance)
    }

    /// Signed sum of every ledger entry.
    pub fn ledger_sum(&self) -> Amount {
        self.entries.iter().map(|e| e.kind.signed(e.amount)).sum()
    }
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

/// One append-only audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub player_id: PlayerId,
    pub action: AuditAction,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

//! Expected game results.
//!
//! Running out of numbers and losing a claim happen every game. They are
//! values the caller matches on, not errors that bubble up to an operator.

use serde::{Deserialize, Serialize};

use crate::{Amount, SessionId};

/// The result of one draw request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DrawOutcome {
    /// A fresh number was called.
    Drawn { number: u8 },
    /// Nothing was left to draw. The session is now completed with no
    /// winner.
    Exhausted,
}

/// Why a bingo claim was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The card has no complete line, or marks a number that was never
    /// drawn. The claimant loses their slot.
    InvalidClaim,
    /// Another claim already closed the session. The claimant keeps
    /// their slot.
    SessionClosed,
}

/// The result of a bingo claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClaimOutcome {
    /// The claim won the whole pot.
    Won { session_id: SessionId, payout: Amount },
    /// The claim was refused.
    Rejected { reason: RejectReason },
}

impl ClaimOutcome {
    /// Returns `true` for a winning claim.
    pub fn is_won(&self) -> bool {
        matches!(self, Self::Won { .. })
    }
}

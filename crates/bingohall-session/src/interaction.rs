//! Interaction types.

use std::time::Duration;

use bingohall_protocol::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for interaction storage.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a pending interaction survives without an answer.
    ///
    /// Default: 300 seconds.
    pub interaction_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            interaction_ttl: Duration::from_secs(300),
        }
    }
}

// ---------------------------------------------------------------------------
// Interaction
// ---------------------------------------------------------------------------

/// The question a player has been asked and not yet answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Interaction {
    /// Picking a bet amount before matchmaking.
    ChoosingStake,
    /// Typing an amount to deposit.
    AwaitingDeposit,
    /// Typing an amount to withdraw; `available` is the balance shown when
    /// the question was asked.
    AwaitingWithdraw { available: Amount },
}

/// A stored interaction, stamped with the token that must accompany its
/// answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionEntry {
    pub interaction: Interaction,
    /// 32 hex characters, 128 bits of randomness.
    pub token: String,
    pub started_at: DateTime<Utc>,
}

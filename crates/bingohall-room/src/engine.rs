//! The engine handle shared by every caller.

use std::sync::Arc;

use bingohall_protocol::{AuditAction, PlayerId};
use bingohall_store::{AuditEntry, MemoryStore};
use chrono::Utc;

use crate::RoomConfig;

/// Entry point for every game operation.
///
/// Cheap to clone: clones share the same store. Operations are spread over
/// several modules by concern (`pool`, `lifecycle`, `draw`, `claim`,
/// `ledger`, `recovery`); each adds an `impl HallEngine` block.
#[derive(Clone)]
pub struct HallEngine {
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) config: Arc<RoomConfig>,
}

impl HallEngine {
    pub fn new(store: Arc<MemoryStore>, config: RoomConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// The player's audit entries, newest first, at most `limit`.
    pub async fn audit_log(&self, player: PlayerId, limit: usize) -> Vec<AuditEntry> {
        self.store.audit_for(player, limit).await
    }

    pub(crate) async fn audit(
        &self,
        player: PlayerId,
        action: AuditAction,
        details: serde_json::Value,
    ) {
        self.store
            .append_audit(audit_entry(player, action, details))
            .await;
    }
}

/// A timestamped audit row.
pub(crate) fn audit_entry(
    player: PlayerId,
    action: AuditAction,
    details: serde_json::Value,
) -> AuditEntry {
    AuditEntry {
        player_id: player,
        action,
        details,
        created_at: Utc::now(),
    }
}

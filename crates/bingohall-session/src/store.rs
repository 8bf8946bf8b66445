//! The interaction store: typed, token-stamped entries over a KV backend.

use bingohall_protocol::{Codec, JsonCodec, PlayerId};
use chrono::Utc;
use rand::Rng;
use tracing::{debug, info};

use crate::{Interaction, InteractionEntry, KvBackend, SessionConfig, SessionError};

/// Keeps one pending [`Interaction`] per player.
///
/// ## Lifecycle
///
/// ```text
/// begin() ──→ [pending] ──complete(token)──→ answered (entry removed)
///                │
///                ├──begin() again──→ replaced, old token dead
///                └──ttl elapsed────→ gone
/// ```
pub struct InteractionStore<B, C = JsonCodec> {
    backend: B,
    codec: C,
    config: SessionConfig,
}

impl<B: KvBackend> InteractionStore<B> {
    /// A store that encodes entries as JSON.
    pub fn new(backend: B, config: SessionConfig) -> Self {
        Self::with_codec(backend, JsonCodec, config)
    }
}

impl<B: KvBackend, C: Codec> InteractionStore<B, C> {
    pub fn with_codec(backend: B, codec: C, config: SessionConfig) -> Self {
        Self {
            backend,
            codec,
            config,
        }
    }

    fn key(player: PlayerId) -> String {
        format!("interaction:{}", player.0)
    }

    /// Records that `player` was asked `interaction`, replacing whatever
    /// they were asked before. Returns the entry, whose token the answer
    /// must carry.
    pub async fn begin(
        &self,
        player: PlayerId,
        interaction: Interaction,
    ) -> Result<InteractionEntry, SessionError> {
        let entry = InteractionEntry {
            interaction,
            token: generate_token(),
            started_at: Utc::now(),
        };
        let bytes = self.codec.encode(&entry)?;
        self.backend
            .put(&Self::key(player), bytes, self.config.interaction_ttl)
            .await?;
        debug!(player_id = %player, interaction = ?entry.interaction, "interaction started");
        Ok(entry)
    }

    /// The player's pending interaction, if it hasn't expired.
    pub async fn current(&self, player: PlayerId) -> Result<Option<InteractionEntry>, SessionError> {
        match self.backend.get(&Self::key(player)).await? {
            Some(bytes) => Ok(Some(self.codec.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Consumes the pending interaction if `token` matches it. Of several
    /// concurrent answers carrying the same token, exactly one succeeds.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`] — nothing pending, it expired, or
    ///   another answer consumed it first
    /// - [`SessionError::InvalidToken`] — a different interaction is
    ///   pending; it is left in place
    pub async fn complete(
        &self,
        player: PlayerId,
        token: &str,
    ) -> Result<Interaction, SessionError> {
        let key = Self::key(player);
        let bytes = self
            .backend
            .get(&key)
            .await?
            .ok_or(SessionError::NotFound(player))?;
        let entry: InteractionEntry = self.codec.decode(&bytes)?;
        if entry.token != token {
            return Err(SessionError::InvalidToken);
        }
        if !self.backend.compare_and_remove(&key, &bytes).await? {
            debug!(player_id = %player, "interaction already answered");
            return Err(SessionError::NotFound(player));
        }
        info!(player_id = %player, interaction = ?entry.interaction, "interaction completed");
        Ok(entry.interaction)
    }

    /// Drops the player's pending interaction. Returns `true` if one was
    /// pending.
    pub async fn clear(&self, player: PlayerId) -> Result<bool, SessionError> {
        self.backend.remove(&Self::key(player)).await
    }

    /// Drops every expired entry in the backend.
    pub async fn purge_expired(&self) -> usize {
        self.backend.purge_expired().await
    }
}

/// Generates a random 32-character hex string (128 bits of entropy).
fn generate_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================

//! `BingoHall` builder and front-end flows.
//!
//! A hall is one engine, one interaction store and (optionally) one
//! running recovery sweeper, all sharing the same store.

use std::sync::Arc;

use bingohall_protocol::{Amount, PlayerId};
use bingohall_room::HallEngine;
use bingohall_session::{Interaction, InteractionEntry, InteractionStore, MemoryKv};
use bingohall_store::{MemoryStore, RoomRow};
use bingohall_sweep::{RecoverySweeper, SweepMetrics, SweeperHandle};
use tracing::info;

use crate::{BingoHallError, HallSettings};

/// Builder for a [`BingoHall`].
///
/// # Example
///
/// ```rust,ignore
/// let hall = BingoHall::builder()
///     .settings(HallSettings::from_env()?)
///     .with_sweeper(true)
///     .build();
/// ```
pub struct BingoHallBuilder {
    settings: HallSettings,
    sweeper: bool,
}

impl BingoHallBuilder {
    /// Default settings, sweeper enabled.
    pub fn new() -> Self {
        Self {
            settings: HallSettings::default(),
            sweeper: true,
        }
    }

    pub fn settings(mut self, settings: HallSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Whether to spawn the recovery sweeper on build.
    pub fn with_sweeper(mut self, enabled: bool) -> Self {
        self.sweeper = enabled;
        self
    }

    /// Builds the hall. Must be called inside a Tokio runtime when the
    /// sweeper is enabled, since it is spawned here.
    pub fn build(self) -> BingoHall {
        let HallSettings {
            store,
            room,
            sweep,
            session,
        } = self.settings;

        let engine = HallEngine::new(Arc::new(MemoryStore::new(store)), room);
        let sweeper = self
            .sweeper
            .then(|| RecoverySweeper::new(engine.clone(), sweep).spawn());
        let interactions = Arc::new(InteractionStore::new(MemoryKv::new(), session));

        info!(sweeper = sweeper.is_some(), "bingo hall ready");
        BingoHall {
            engine,
            interactions,
            sweeper,
        }
    }
}

impl Default for BingoHallBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running hall.
pub struct BingoHall {
    engine: HallEngine,
    interactions: Arc<InteractionStore<MemoryKv>>,
    sweeper: Option<SweeperHandle>,
}

impl BingoHall {
    pub fn builder() -> BingoHallBuilder {
        BingoHallBuilder::new()
    }

    /// The game engine.
    pub fn engine(&self) -> &HallEngine {
        &self.engine
    }

    /// Pending player interactions.
    pub fn interactions(&self) -> &InteractionStore<MemoryKv> {
        &self.interactions
    }

    /// Sweeper metrics as of its last sweep, if the sweeper runs.
    pub fn sweeper_metrics(&self) -> Option<SweepMetrics> {
        self.sweeper.as_ref().map(SweeperHandle::metrics)
    }

    /// Stops the sweeper and returns its final metrics.
    pub async fn shutdown(self) -> Option<SweepMetrics> {
        let metrics = match self.sweeper {
            Some(handle) => Some(handle.shutdown().await),
            None => None,
        };
        info!("bingo hall stopped");
        metrics
    }

    // -----------------------------------------------------------------------
    // Front-end flows
    // -----------------------------------------------------------------------

    /// Asks the player which stake they want to play.
    pub async fn ask_stake(&self, player: PlayerId) -> Result<InteractionEntry, BingoHallError> {
        Ok(self
            .interactions
            .begin(player, Interaction::ChoosingStake)
            .await?)
    }

    /// Answers a stake question: joins a room with that bet.
    pub async fn answer_stake(
        &self,
        player: PlayerId,
        token: &str,
        bet: Amount,
    ) -> Result<RoomRow, BingoHallError> {
        match self.interactions.complete(player, token).await? {
            Interaction::ChoosingStake => Ok(self.engine.join_or_create(bet).await?),
            other => Err(BingoHallError::UnexpectedAnswer(other)),
        }
    }

    /// Asks the player how much to deposit, opening their wallet if needed.
    pub async fn ask_deposit(&self, player: PlayerId) -> Result<InteractionEntry, BingoHallError> {
        self.engine.open_wallet(player).await?;
        Ok(self
            .interactions
            .begin(player, Interaction::AwaitingDeposit)
            .await?)
    }

    /// Answers a deposit question. Returns the new balance.
    pub async fn answer_deposit(
        &self,
        player: PlayerId,
        token: &str,
        amount: Amount,
    ) -> Result<Amount, BingoHallError> {
        match self.interactions.complete(player, token).await? {
            Interaction::AwaitingDeposit => Ok(self.engine.deposit(player, amount).await?),
            other => Err(BingoHallError::UnexpectedAnswer(other)),
        }
    }

    /// Asks the player how much to withdraw, quoting their balance.
    pub async fn ask_withdraw(&self, player: PlayerId) -> Result<InteractionEntry, BingoHallError> {
        let available = self.engine.wallet(player).await?.balance();
        Ok(self
            .interactions
            .begin(player, Interaction::AwaitingWithdraw { available })
            .await?)
    }

    /// Answers a withdrawal question. Returns the new balance.
    pub async fn answer_withdraw(
        &self,
        player: PlayerId,
        token: &str,
        amount: Amount,
    ) -> Result<Amount, BingoHallError> {
        match self.interactions.complete(player, token).await? {
            Interaction::AwaitingWithdraw { .. } => Ok(self.engine.withdraw(player, amount).await?),
            other => Err(BingoHallError::UnexpectedAnswer(other)),
        }
    }
}

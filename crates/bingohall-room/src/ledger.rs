//! Wallet ledger.
//!
//! Every balance change goes through [`Wallet::apply`], which appends the
//! matching entry, so a wallet's balance always equals the signed sum of
//! its entries.

use bingohall_protocol::{Amount, PlayerId, TransactionKind};
use bingohall_store::{LedgerEntry, Wallet};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::{HallEngine, RoomError};

impl HallEngine {
    /// Opens an empty wallet for the player. Opening twice is harmless.
    pub async fn open_wallet(&self, player: PlayerId) -> Result<Wallet, RoomError> {
        Ok(self.store.open_wallet(player).await?)
    }

    /// Adds `amount` to the balance. Returns the new balance.
    pub async fn deposit(&self, player: PlayerId, amount: Amount) -> Result<Amount, RoomError> {
        if !amount.is_positive() {
            return Err(RoomError::InvalidAmount(amount));
        }
        let mut wallet = self.store.lock_wallet(player).await?;
        let balance = wallet
            .apply(TransactionKind::Deposit, amount, Utc::now())
            .ok_or(RoomError::BalanceOverflow(player))?;
        info!(player_id = %player, amount = %amount, balance = %balance, "deposit");
        Ok(balance)
    }

    /// Takes `amount` out of the balance. Returns the new balance.
    ///
    /// # Errors
    /// [`RoomError::InsufficientBalance`] if the balance is short; the
    /// wallet is left as it was.
    pub async fn withdraw(&self, player: PlayerId, amount: Amount) -> Result<Amount, RoomError> {
        if !amount.is_positive() {
            return Err(RoomError::InvalidAmount(amount));
        }
        let mut wallet = self.store.lock_wallet(player).await?;
        if wallet.balance() < amount {
            return Err(RoomError::InsufficientBalance {
                player,
                balance: wallet.balance(),
                requested: amount,
            });
        }
        let balance = wallet
            .apply(TransactionKind::Withdraw, amount, Utc::now())
            .ok_or(RoomError::BalanceOverflow(player))?;
        info!(player_id = %player, amount = %amount, balance = %balance, "withdraw");
        Ok(balance)
    }

    /// Credits a payout to a wallet the caller already holds locked.
    pub(crate) fn credit_win(
        &self,
        wallet: &mut Wallet,
        amount: Amount,
        at: DateTime<Utc>,
    ) -> Result<Amount, RoomError> {
        wallet
            .apply(TransactionKind::Win, amount, at)
            .ok_or(RoomError::BalanceOverflow(wallet.player_id))
    }

    /// A snapshot of the player's wallet.
    pub async fn wallet(&self, player: PlayerId) -> Result<Wallet, RoomError> {
        Ok(self.store.wallet(player).await?)
    }

    /// The player's ledger entries, newest first.
    pub async fn transactions(&self, player: PlayerId) -> Result<Vec<LedgerEntry>, RoomError> {
        let wallet = self.store.wallet(player).await?;
        Ok(wallet.entries().iter().rev().cloned().collect())
    }
}

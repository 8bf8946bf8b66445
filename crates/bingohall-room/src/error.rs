//! Error types for the engine.

use bingohall_protocol::{
    Amount, PlayerId, ProtocolError, RoomId, RoomStatus, SessionId, SlotNumber,
};
use bingohall_store::{RowRef, StoreError};

/// Errors that can occur during engine operations.
///
/// Contention losses (a slot someone else took, a session that already
/// started) and game results (exhausted numbers, rejected claims) are not
/// errors. Every variant here means the operation changed nothing.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room is full.
    #[error("room {0} is full")]
    CapacityExceeded(RoomId),

    /// The room no longer takes joins.
    #[error("room {room} is {status} and cannot be joined")]
    NotJoinable { room: RoomId, status: RoomStatus },

    /// The room has finished and cannot host another session.
    #[error("room {0} is completed")]
    RoomClosed(RoomId),

    /// Bets must be strictly positive.
    #[error("invalid bet amount {0}")]
    InvalidBetAmount(Amount),

    /// Wallet movements must be strictly positive.
    #[error("invalid amount {0}")]
    InvalidAmount(Amount),

    /// The slot number is outside the room's pool.
    #[error("slot {slot} does not exist in room {room}")]
    InvalidSlot { room: RoomId, slot: SlotNumber },

    /// The session does not exist.
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    /// The session is already completed.
    #[error("session {0} is not active")]
    SessionNotActive(SessionId),

    /// A claim was made in a room that has never started a session.
    #[error("room {0} has no session")]
    NoActiveSession(RoomId),

    /// The player holds no card through this slot.
    #[error("player {player} has no card for slot {slot}")]
    CardNotFound { player: PlayerId, slot: SlotNumber },

    /// The player has no wallet.
    #[error("player {0} has no wallet")]
    WalletNotFound(PlayerId),

    /// A withdrawal asked for more than the balance.
    #[error("player {player} has {balance}, cannot withdraw {requested}")]
    InsufficientBalance {
        player: PlayerId,
        balance: Amount,
        requested: Amount,
    },

    /// The pot for a room does not fit in an [`Amount`].
    #[error("pot for room {0} overflows")]
    PotOverflow(RoomId),

    /// Crediting the player would overflow their balance.
    #[error("balance of player {0} would overflow")]
    BalanceOverflow(PlayerId),

    /// A generated card failed validation.
    #[error(transparent)]
    Card(#[from] ProtocolError),

    /// The store failed, typically a lock timeout.
    #[error(transparent)]
    Storage(StoreError),
}

impl From<StoreError> for RoomError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(RowRef::Room(id)) => Self::NotFound(id),
            StoreError::NotFound(RowRef::Session(id)) => Self::SessionNotFound(id),
            StoreError::NotFound(RowRef::Wallet(player)) => Self::WalletNotFound(player),
            other => Self::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_store_error_maps_missing_rows_to_domain_errors() {
        let err: RoomError = StoreError::NotFound(RowRef::Room(RoomId(4))).into();
        assert!(matches!(err, RoomError::NotFound(RoomId(4))));

        let err: RoomError = StoreError::NotFound(RowRef::Session(SessionId(2))).into();
        assert!(matches!(err, RoomError::SessionNotFound(SessionId(2))));

        let err: RoomError = StoreError::NotFound(RowRef::Wallet(PlayerId(9))).into();
        assert!(matches!(err, RoomError::WalletNotFound(PlayerId(9))));
    }

    #[test]
    fn test_from_store_error_keeps_lock_timeouts() {
        let err: RoomError = StoreError::LockTimeout(RowRef::Room(RoomId(1))).into();
        assert!(matches!(err, RoomError::Storage(StoreError::LockTimeout(_))));
        assert_eq!(err.to_string(), "timed out waiting for lock on room R-1");
    }
}

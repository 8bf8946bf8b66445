//! Error types for the store layer.

use std::fmt;

use bingohall_protocol::{PlayerId, RoomId, SessionId, SlotNumber};

/// Names one row (or one room's slot table) for error messages and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRef {
    Room(RoomId),
    Pool(RoomId),
    Slot(RoomId, SlotNumber),
    Card(PlayerId, RoomId),
    Session(SessionId),
    Wallet(PlayerId),
}

impl fmt::Display for RowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Room(id) => write!(f, "room {id}"),
            Self::Pool(id) => write!(f, "card pool of room {id}"),
            Self::Slot(room, slot) => write!(f, "slot {slot} in room {room}"),
            Self::Card(player, room) => {
                write!(f, "card of player {player} in room {room}")
            }
            Self::Session(id) => write!(f, "session {id}"),
            Self::Wallet(player) => write!(f, "wallet of player {player}"),
        }
    }
}

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The row does not exist.
    #[error("{0} not found")]
    NotFound(RowRef),

    /// The row lock could not be acquired within the configured timeout.
    /// Nothing was written.
    #[error("timed out waiting for lock on {0}")]
    LockTimeout(RowRef),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_messages_name_the_row() {
        let err = StoreError::NotFound(RowRef::Room(RoomId(3)));
        assert_eq!(err.to_string(), "room R-3 not found");

        let err = StoreError::LockTimeout(RowRef::Slot(RoomId(1), SlotNumber(7)));
        assert_eq!(err.to_string(), "timed out waiting for lock on slot #7 in room R-1");
    }
}

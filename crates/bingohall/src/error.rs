//! Unified error type for Bingohall.

use bingohall_protocol::ProtocolError;
use bingohall_room::RoomError;
use bingohall_session::{Interaction, SessionError};
use bingohall_store::StoreError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum BingoHallError {
    /// Encoding or card validation failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The store failed outside an engine operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A game or wallet operation was refused.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Interaction state could not be read or written.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// An answer arrived for a different question than the one pending.
    #[error("answer does not fit pending interaction {0:?}")]
    UnexpectedAnswer(Interaction),

    /// An environment variable held a value that doesn't parse.
    #[error("invalid value {value:?} for {var}")]
    Config { var: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use bingohall_protocol::{PlayerId, RoomId};
    use bingohall_store::RowRef;

    #[test]
    fn test_from_protocol_error() {
        let err: BingoHallError = ProtocolError::InvalidCard("bad".into()).into();
        assert!(matches!(err, BingoHallError::Protocol(_)));
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_from_store_error() {
        let err: BingoHallError = StoreError::LockTimeout(RowRef::Room(RoomId(1))).into();
        assert!(matches!(err, BingoHallError::Store(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err: BingoHallError = RoomError::NotFound(RoomId(1)).into();
        assert!(matches!(err, BingoHallError::Room(_)));
        assert_eq!(err.to_string(), "room R-1 not found");
    }

    #[test]
    fn test_from_session_error() {
        let err: BingoHallError = SessionError::NotFound(PlayerId(3)).into();
        assert!(matches!(err, BingoHallError::Session(_)));
    }

    #[test]
    fn test_config_error_names_variable() {
        let err = BingoHallError::Config {
            var: "COUNTDOWN_SECS",
            value: "soon".into(),
        };
        assert_eq!(err.to_string(), r#"invalid value "soon" for COUNTDOWN_SECS"#);
    }
}

//! Error types for the interaction layer.

use bingohall_protocol::{PlayerId, ProtocolError};

/// Errors that can occur while reading or writing interaction state.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The player has no pending interaction, or it expired.
    #[error("no pending interaction for player {0}")]
    NotFound(PlayerId),

    /// The token doesn't match the pending interaction. Usually an answer
    /// to a question that has since been replaced.
    #[error("interaction token does not match")]
    InvalidToken,

    /// An entry could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] ProtocolError),

    /// The key/value backend failed.
    #[error("interaction backend failed: {0}")]
    Backend(String),
}

//! Error types for the protocol layer.
//!
//! Each crate in Bingohall defines its own error enum. A `ProtocolError`
//! always means a value could not be turned into bytes (or back), or a
//! raw value fails a structural check before it reaches the engine.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing fields, or bytes written by
    /// a different version of the type.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A card grid violates its structural rules (wrong band, duplicate
    /// number, or a non-sentinel center).
    #[error("invalid card: {0}")]
    InvalidCard(String),
}

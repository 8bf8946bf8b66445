//! Codec trait and implementations for serializing values to bytes.
//!
//! Anything that leaves the process — an interaction entry written to a
//! shared key/value service, audit details, a snapshot handed to the HTTP
//! layer — goes through a [`Codec`]. Callers hold the trait, not the
//! format, so a compact binary codec can replace JSON later without
//! touching them.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// - `Send + Sync` → one codec instance is shared by every task.
/// - `'static` → it owns everything it needs, so it can live inside
///   long-running background tasks such as the recovery sweeper.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use bingohall_protocol::{Amount, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&Amount::new(50)).unwrap();
/// assert_eq!(bytes, b"50");
///
/// let decoded: Amount = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, Amount::new(50));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

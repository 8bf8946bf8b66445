//! Per-player interaction state for Bingohall front ends.
//!
//! A chat front end asks a player something ("which stake?", "how much to
//! deposit?") and waits for the answer in a later message, possibly
//! handled by a different process. This crate keeps that pending question
//! somewhere every process can see it:
//!
//! 1. **Storage** — a key/value backend with per-entry TTL ([`KvBackend`]),
//!    with an in-memory implementation ([`MemoryKv`]).
//! 2. **Interactions** — typed, token-stamped entries keyed by player
//!    ([`InteractionStore`]).
//!
//! ```text
//! Front end (bot, HTTP)  ← begin / complete interactions
//!     ↕
//! InteractionStore (this crate)  ← encodes entries through a Codec
//!     ↕
//! KvBackend  ← opaque bytes with a TTL
//! ```

#![allow(async_fn_in_trait)]

mod error;
mod interaction;
mod kv;
mod store;

pub use error::SessionError;
pub use interaction::{Interaction, InteractionEntry, SessionConfig};
pub use kv::{KvBackend, MemoryKv};
pub use store::InteractionStore;

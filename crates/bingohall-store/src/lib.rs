//! Transactional row store for Bingohall.
//!
//! The engine assumes one consistent store reachable by every request
//! handler. This crate provides it in-process, with the three primitives
//! the engine relies on:
//!
//! - **Row locks** — [`MemoryStore::lock_room`] and friends hand out an
//!   exclusive [`RowGuard`], bounded by [`StoreConfig::lock_timeout`].
//!   Dropping the guard commits.
//! - **Skip-locked reads** — [`MemoryStore::try_lock_room`] returns
//!   `None` instead of waiting, for background scans.
//! - **Conditional updates** — single statements such as
//!   [`MemoryStore::claim_slot_if_unclaimed`] that change a row only when
//!   a predicate holds, without a lock held across calls.
//!
//! # Lock order
//!
//! Callers that hold more than one guard take them in this order:
//!
//! ```text
//! room → session → card pool → owned card → wallet
//! ```

mod config;
mod error;
mod model;
mod store;

pub use config::StoreConfig;
pub use error::{RowRef, StoreError};
pub use model::{
    AuditEntry, Countdown, LedgerEntry, OwnedCard, RoomRow, SessionRow,
    SlotRow, Wallet, WinnerRecord,
};
pub use store::{MemoryStore, RowGuard};

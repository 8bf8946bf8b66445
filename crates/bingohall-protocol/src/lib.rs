//! Shared vocabulary for Bingohall.
//!
//! This crate defines the types every other layer speaks in:
//!
//! - **Identity** ([`PlayerId`], [`RoomId`], [`SessionId`], [`CardId`],
//!   [`SlotNumber`]) — newtype wrappers so ids can't be mixed up.
//! - **Money** ([`Amount`]) — integer minor units, never floats.
//! - **Cards** ([`Card`]) — the 5×5 grid, its marks and the win pattern.
//! - **Outcomes** ([`DrawOutcome`], [`ClaimOutcome`]) —
//!   expected game results modeled as values, not errors.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how values become bytes
//!   when they leave the process.
//!
//! ```text
//! Store (rows) → Room engine (operations) → callers (HTTP, bot, sweeper)
//!        ↑ all of them share the types in this crate ↑
//! ```

mod card;
mod codec;
mod error;
mod outcome;
mod types;

pub use card::{CALL_RANGE, COLUMN_BANDS, Card, FREE_SPACE, GRID_SIZE};
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use outcome::{ClaimOutcome, DrawOutcome, RejectReason};
pub use types::{
    Amount, AuditAction, CardId, PlayerId, RoomId, RoomStatus, SessionId,
    SessionStatus, SlotNumber, TransactionKind,
};

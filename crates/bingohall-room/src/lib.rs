//! The Bingohall game engine.
//!
//! [`HallEngine`] owns no state of its own. Every operation is a short
//! transaction against the shared [`MemoryStore`](bingohall_store::MemoryStore),
//! so any number of request handlers (and the recovery sweeper) can call
//! into the same engine concurrently.
//!
//! # Components
//!
//! - **Card pool** — per-room numbered card offers, claimed first come
//!   first served ([`HallEngine::select_slot`]).
//! - **Lifecycle** — join/leave, countdown arming, matchmaking
//!   ([`HallEngine::join`], [`HallEngine::join_or_create`]).
//! - **Draw** — exactly-once session start and number calling
//!   ([`HallEngine::start_session`], [`HallEngine::draw_number`]).
//! - **Claims** — validation and pot payout in one transaction
//!   ([`HallEngine::claim_bingo`]).
//! - **Ledger** — wallets whose balance always matches their entries.
//! - **Recovery** — starting rooms whose countdown ran out with nobody
//!   around to start them ([`HallEngine::start_due_rooms`]).
//!
//! ```text
//! Waiting ──(threshold met: countdown armed)──→ Waiting + deadline
//!    │                                              │
//!    └──────────────(start_session)─────────────────┘
//!                          ↓
//!                       Active ──(claim won / numbers exhausted)──→ Completed
//! ```

mod claim;
mod config;
mod countdown;
mod draw;
mod engine;
mod error;
mod ledger;
mod lifecycle;
mod pool;
mod recovery;

pub use config::RoomConfig;
pub use countdown::CountdownInfo;
pub use engine::HallEngine;
pub use error::RoomError;
pub use recovery::RecoveryReport;

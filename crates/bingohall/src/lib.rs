//! # Bingohall
//!
//! A concurrent engine for multi-room bingo: card pools, room lifecycle,
//! number draws, claims and payouts, safe under any number of concurrent
//! callers.
//!
//! This crate wires the layers together:
//!
//! - [`HallEngine`] — every game and wallet operation
//! - [`RecoverySweeper`] — starts rooms whose countdown ran out
//! - [`InteractionStore`] — pending questions for chat-style front ends
//! - [`HallSettings`] — configuration, from defaults or the environment
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bingohall::prelude::*;
//!
//! # async fn run() -> Result<(), BingoHallError> {
//! bingohall::init_tracing();
//! let hall = BingoHall::builder()
//!     .settings(HallSettings::from_env()?)
//!     .build();
//!
//! let room = hall.engine().join_or_create(Amount::new(50)).await?;
//! hall.engine().select_slot(room.id, SlotNumber(7), PlayerId(1)).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod hall;
mod settings;
mod telemetry;

pub use error::BingoHallError;
pub use hall::{BingoHall, BingoHallBuilder};
pub use settings::HallSettings;
pub use telemetry::init_tracing;

pub use bingohall_room::{CountdownInfo, HallEngine, RoomConfig, RoomError};
pub use bingohall_session::{
    Interaction, InteractionEntry, InteractionStore, MemoryKv, SessionConfig,
};
pub use bingohall_store::StoreConfig;
pub use bingohall_sweep::{RecoverySweeper, SweepConfig, SweepMetrics, SweepPolicy};

/// Everything needed to drive a hall.
pub mod prelude {
    pub use crate::{BingoHall, BingoHallError, HallEngine, HallSettings};
    pub use bingohall_protocol::{
        Amount, ClaimOutcome, DrawOutcome, PlayerId, RejectReason, RoomId, RoomStatus,
        SessionId, SlotNumber,
    };
    pub use bingohall_session::Interaction;
}

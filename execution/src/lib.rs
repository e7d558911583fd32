//! Wheelhouse execution layer.
//!
//! This crate contains the wagering engine: the group catalog, the per-category progression
//! state machines, the spin resolution calculator, and the card/session lifecycle. [`Table`]
//! ties them together behind one entrypoint.
//!
//! ## Determinism requirements
//! - Do not use wall-clock time inside execution; timestamps arrive on the [`SpinEvent`].
//! - Do not use randomness; outcomes are supplied by the caller.
//! - Avoid iteration order of hash-based collections influencing outputs.
//!
//! ## Exactly-once invariants
//! A spin is resolved at most once. `Table::resolve_spin` rejects spin ids at or below the last
//! resolved id, and moves the pending wagers out of the caller's map before pricing them, so
//! replaying either the spin or the wager map is a no-op.
//!
//! ## Minimal resolution pipeline (example)
//! ```rust
//! use wheelhouse_execution::Table;
//! use wheelhouse_types::wager::{CategoryId, PendingWagers, ProgressionStrategy, SpinEvent};
//! use wheelhouse_types::EngineConfig;
//!
//! # fn main() -> Result<(), wheelhouse_execution::TableError> {
//! let config = EngineConfig::new(10, ProgressionStrategy::martingale()).with_cards(3, 100, 15);
//! let mut table = Table::new(config, 0)?;
//!
//! let mut pending = PendingWagers::new();
//! pending.place("red", 10);
//! // 2 is black: the red wager loses and the red/black stake doubles.
//! let report = table.resolve_spin(SpinEvent::new(1, 2), &mut pending)?;
//! assert_eq!(report.map(|report| report.total_pnl), Some(-10));
//! assert!(pending.is_empty());
//! assert_eq!(table.chip_value(&CategoryId::new("red_black")), 20);
//! # Ok(())
//! # }
//! ```

pub mod lifecycle;
pub mod logging;
pub mod progression;
pub mod registry;
pub mod resolution;
pub mod table;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;


pub use lifecycle::{
    apply_resolution, apply_to_session, start_session, CardTransition, SessionUpdate,
};
pub use progression::{sequence_for, Progression, ProgressionBook, Step};
pub use registry::{GroupRegistry, RegistryError};
pub use resolution::{resolve, Resolution};
pub use table::{ResolutionSink, SpinReport, Table, TableError, TableSnapshot};

#[doc(no_inline)]
pub use wheelhouse_types::wager::SpinEvent;

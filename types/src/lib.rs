pub mod config;
pub use config::{ConfigError, EngineConfig};
pub mod wager;
pub use wager::{
    CategoryId, GroupKey, NumberGroup, Outcome, PendingWagers, ProgressionStrategy,
    ProgressionTracker, ResolutionEntry, SpinEvent, SpinId, SpinOutcome,
};

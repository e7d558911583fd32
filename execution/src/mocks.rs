//! Shared fixtures for tests and benches.

use crate::table::Table;
use rand::{rngs::StdRng, Rng, SeedableRng};
use wheelhouse_types::wager::{PendingWagers, ProgressionStrategy, SpinEvent, MAX_NUMBER};
use wheelhouse_types::EngineConfig;

/// Martingale on a 10-chip base unit with the default 1000-chip bankroll.
pub fn config() -> EngineConfig {
    EngineConfig::new(10, ProgressionStrategy::martingale())
}

/// Creates a pending-wager map from `(key, stake)` pairs
pub fn wagers(items: &[(&str, u64)]) -> PendingWagers {
    items.iter().map(|(key, stake)| (*key, *stake)).collect()
}

/// Creates a table from `config`, panicking on invalid fixtures
pub fn create_table(config: EngineConfig) -> Table {
    Table::new(config, 0).expect("fixture config must be valid")
}

/// Creates `len` spins with ids `1..=len`, outcomes drawn from a seeded rng
pub fn create_spin_log(seed: u64, len: u64) -> Vec<SpinEvent> {
    let mut rng = StdRng::seed_from_u64(seed);
    (1..=len)
        .map(|id| SpinEvent::new(id, rng.gen_range(0..=u32::from(MAX_NUMBER))).at(id * 30_000))
        .collect()
}

/// A spread of wagers touching pairs, dozens, sectors and a straight
pub fn create_spread(stake: u64) -> PendingWagers {
    wagers(&[
        ("red", stake),
        ("odd", stake),
        ("dozen_2", stake),
        ("column_3", stake),
        ("voisins", stake),
        ("straight_17", stake),
    ])
}

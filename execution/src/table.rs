//! The table: one player's registry, progression book and session behind a single entrypoint.
//!
//! [`Table::resolve_spin`] is the only path that mutates trackers and cards. It resolves each
//! spin exactly once:
//! - the outcome is validated before anything else, so a bad number changes nothing;
//! - spin ids must strictly increase, so a replayed spin is ignored;
//! - the caller's pending wagers are moved out, so a second pass over the same map sees nothing.
//!
//! Sinks are notified with the finished report after every mutation has completed.

use crate::lifecycle::{apply_to_session, start_session, CardTransition};
use crate::logging::summarize_entries;
use crate::progression::ProgressionBook;
use crate::registry::{GroupRegistry, RegistryError};
use crate::resolution::resolve;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};
use wheelhouse_types::wager::{
    CategoryId, CustomGroupDef, GroupKey, IntegrityWarning, NumberGroup, Outcome, PendingWagers,
    ProgressionStrategy, ProgressionTracker, ResolutionEntry, Session, SpinError, SpinEvent,
    SpinId, SpinOutcome, StopSignals,
};
use wheelhouse_types::{ConfigError, EngineConfig};

#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    InvalidSpin(#[from] SpinError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Everything a collaborator needs after one resolved spin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SpinReport {
    pub spin: SpinId,
    pub at_ms: u64,
    pub outcome: SpinOutcome,
    pub entries: BTreeMap<GroupKey, ResolutionEntry>,
    pub category_outcomes: BTreeMap<CategoryId, Outcome>,
    pub total_wagered: u64,
    pub total_pnl: i64,
    pub total_returned: u64,
    pub warnings: Vec<IntegrityWarning>,
    pub card: Option<CardTransition>,
    pub bankroll: i64,
    pub net_result: i64,
    pub session_wagered: u64,
    pub session_returned: u64,
    pub stop: StopSignals,
    /// Categories paused by this spin; they hold their stake until resumed.
    pub paused: Vec<CategoryId>,
    /// Chip value of the next wager for every tracked category.
    pub next_stakes: BTreeMap<CategoryId, u64>,
}

/// Receives each report once resolution has finished mutating state.
pub trait ResolutionSink {
    fn on_resolution(&mut self, report: &SpinReport);
}

impl<F> ResolutionSink for F
where
    F: FnMut(&SpinReport),
{
    fn on_resolution(&mut self, report: &SpinReport) {
        self(report)
    }
}

/// Persistable engine state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub session: Session,
    pub trackers: BTreeMap<CategoryId, ProgressionTracker>,
    pub last_spin: Option<SpinId>,
}

pub struct Table {
    registry: GroupRegistry,
    book: ProgressionBook,
    config: EngineConfig,
    session: Session,
    last_spin: Option<SpinId>,
    sinks: Vec<Box<dyn ResolutionSink>>,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("strategy", self.book.progression().strategy())
            .field("base_unit", &self.book.base_unit())
            .field("session", &self.session)
            .field("last_spin", &self.last_spin)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl Table {
    /// Validate `config` and open a session starting at `at_ms`.
    pub fn new(config: EngineConfig, at_ms: u64) -> Result<Self, TableError> {
        config.validate()?;
        let registry = GroupRegistry::with_custom_groups(&config.custom_groups)?;
        let book = ProgressionBook::new(config.strategy.clone(), config.base_unit);
        let session = start_session(&config.cards, &config.session, at_ms);
        info!(
            strategy = config.strategy.name(),
            base_unit = config.base_unit,
            cards = config.cards.total_cards,
            bankroll = config.session.bankroll,
            custom_groups = config.custom_groups.len(),
            "table opened"
        );
        Ok(Self {
            registry,
            book,
            config,
            session,
            last_spin: None,
            sinks: Vec::new(),
        })
    }

    /// Rebuild a table from a snapshot taken under the same configuration.
    pub fn restore(config: EngineConfig, snapshot: TableSnapshot) -> Result<Self, TableError> {
        let mut table = Self::new(config, 0)?;
        table.book.restore(snapshot.trackers);
        table.session = snapshot.session;
        table.last_spin = snapshot.last_spin;
        Ok(table)
    }

    pub fn add_sink(&mut self, sink: impl ResolutionSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    /// Resolve the wagers pending when `spin` landed.
    ///
    /// Returns `Ok(None)` without side effects when the spin was already resolved or nothing
    /// was staked. On `InvalidSpin` (bad outcome or oversized stakes) the pending wagers are
    /// left in place.
    pub fn resolve_spin(
        &mut self,
        spin: SpinEvent,
        wagers: &mut PendingWagers,
    ) -> Result<Option<SpinReport>, TableError> {
        let outcome = SpinOutcome::new(spin.outcome)?;
        wagers.checked_total()?;
        if let Some(last) = self.last_spin.filter(|last| spin.id <= *last) {
            warn!(spin = spin.id, last_spin = last, "spin already resolved");
            return Ok(None);
        }
        let batch = wagers.take();
        if batch.is_empty() {
            debug!(spin = spin.id, %outcome, "spin with no stakes");
            return Ok(None);
        }

        let resolution = resolve(&self.registry, &mut self.book, batch, spin.outcome, spin.id)?;
        self.last_spin = Some(spin.id);
        let update = apply_to_session(
            &mut self.session,
            resolution.total_wagered,
            resolution.total_returned,
            resolution.total_pnl,
            spin.at_ms,
        );

        let paused = resolution.newly_paused();
        for category in &paused {
            warn!(
                spin = spin.id,
                category = %category,
                chip_value = self.book.chip_value(category),
                "progression paused"
            );
        }
        if update.stop.any() {
            warn!(
                spin = spin.id,
                net_result = update.net_result,
                stop_loss = update.stop.stop_loss,
                stop_profit = update.stop.stop_profit,
                "stop threshold reached"
            );
        }
        info!(
            spin = spin.id,
            %outcome,
            total_wagered = resolution.total_wagered,
            total_pnl = resolution.total_pnl,
            bankroll = update.bankroll,
            entries = %summarize_entries(resolution.entries.values()),
            "spin resolved"
        );

        let report = SpinReport {
            spin: spin.id,
            at_ms: spin.at_ms,
            outcome,
            entries: resolution.entries,
            category_outcomes: resolution.category_outcomes,
            total_wagered: resolution.total_wagered,
            total_pnl: resolution.total_pnl,
            total_returned: resolution.total_returned,
            warnings: resolution.warnings,
            card: update.card,
            bankroll: update.bankroll,
            net_result: update.net_result,
            session_wagered: self.session.total_wagered,
            session_returned: self.session.total_returned,
            stop: update.stop,
            paused,
            next_stakes: self.book.next_stakes(),
        };
        for sink in &mut self.sinks {
            sink.on_resolution(&report);
        }
        Ok(Some(report))
    }

    /// Clear the Paused flag on `category`.
    pub fn resume(&mut self, category: &CategoryId) -> bool {
        let resumed = self.book.resume(category);
        if resumed {
            info!(category = %category, "progression resumed");
        }
        resumed
    }

    /// Switch strategy; every tracker restarts at the base stake.
    pub fn set_strategy(&mut self, strategy: ProgressionStrategy) -> Result<(), TableError> {
        let config = EngineConfig {
            strategy,
            ..self.config.clone()
        };
        config.validate()?;
        info!(strategy = config.strategy.name(), "strategy changed");
        self.book.set_strategy(config.strategy.clone());
        self.config = config;
        Ok(())
    }

    /// Start a fresh session: new cards, full bankroll, trackers back at the base stake.
    ///
    /// Spin ids keep increasing across sessions.
    pub fn new_session(&mut self, at_ms: u64) {
        self.session = start_session(&self.config.cards, &self.config.session, at_ms);
        self.book.reset();
        info!(cards = self.config.cards.total_cards, "session restarted");
    }

    pub fn register_custom_group(
        &mut self,
        def: &CustomGroupDef,
    ) -> Result<&NumberGroup, TableError> {
        let group = self.registry.register_custom(def)?;
        info!(key = %group.key, ratio = %group.payout, "custom group registered");
        Ok(group)
    }

    pub fn remove_custom_group(&mut self, id: &str) -> Option<NumberGroup> {
        self.registry.remove_custom(id)
    }

    pub fn registry(&self) -> &GroupRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn chip_value(&self, category: &CategoryId) -> u64 {
        self.book.chip_value(category)
    }

    /// Chip value of the next wager on group `key`, via its category.
    pub fn chip_value_for(&self, key: &str) -> Result<u64, TableError> {
        let group = self.registry.number_group_of(key)?;
        Ok(self.book.chip_value(&group.category))
    }

    pub fn next_stakes(&self) -> BTreeMap<CategoryId, u64> {
        self.book.next_stakes()
    }

    pub fn trackers(&self) -> &BTreeMap<CategoryId, ProgressionTracker> {
        self.book.trackers()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn last_spin(&self) -> Option<SpinId> {
        self.last_spin
    }

    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            session: self.session.clone(),
            trackers: self.book.trackers().clone(),
            last_spin: self.last_spin,
        }
    }
}

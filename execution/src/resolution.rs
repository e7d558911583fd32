//! Resolution calculator.
//!
//! Compares one drawn number against a batch of pending wagers, prices every wager, and advances
//! each touched progression category exactly once.

use crate::logging::clamp_i64;
use crate::progression::{ProgressionBook, Step};
use crate::registry::GroupRegistry;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};
use wheelhouse_types::wager::{
    CategoryId, GroupKey, IntegrityWarning, Outcome, PendingWagers, ResolutionEntry, SpinError,
    SpinId, SpinOutcome, MAX_SPIN_STAKE,
};

/// Everything one spin produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub outcome: SpinOutcome,
    pub entries: BTreeMap<GroupKey, ResolutionEntry>,
    /// Outcome fed to each category's tracker.
    pub category_outcomes: BTreeMap<CategoryId, Outcome>,
    /// Tracker transitions actually applied.
    pub steps: Vec<Step>,
    pub total_wagered: u64,
    pub total_pnl: i64,
    pub total_returned: u64,
    pub warnings: Vec<IntegrityWarning>,
}

impl Resolution {
    fn empty(outcome: SpinOutcome) -> Self {
        Self {
            outcome,
            entries: BTreeMap::new(),
            category_outcomes: BTreeMap::new(),
            steps: Vec::new(),
            total_wagered: 0,
            total_pnl: 0,
            total_returned: 0,
            warnings: Vec::new(),
        }
    }

    /// No positive stake was resolved.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Categories whose transition on this spin raised the Paused flag.
    pub fn newly_paused(&self) -> Vec<CategoryId> {
        self.steps
            .iter()
            .filter(|step| step.paused)
            .map(|step| step.category.clone())
            .collect()
    }
}

/// Price a single stake against a group membership result.
pub fn price(stake: u64, won: bool, gross_return: impl FnOnce(u64) -> u64) -> i64 {
    if won {
        clamp_i64(i128::from(gross_return(stake)) - i128::from(stake))
    } else {
        clamp_i64(-i128::from(stake))
    }
}

/// Resolve `wagers` against `outcome` for spin `spin`.
///
/// The wagers are consumed. An outcome outside `0..=36`, or a batch staking more than
/// [`MAX_SPIN_STAKE`] in total, fails before anything is mutated. Zero stakes are skipped; a
/// batch with no positive stake is a no-op.
pub fn resolve(
    registry: &GroupRegistry,
    book: &mut ProgressionBook,
    wagers: PendingWagers,
    outcome: u32,
    spin: SpinId,
) -> Result<Resolution, SpinError> {
    let outcome = SpinOutcome::new(outcome)?;
    wagers.checked_total()?;
    let mut resolution = Resolution::empty(outcome);
    if wagers.is_empty() {
        debug!(spin, %outcome, "no pending wagers");
        return Ok(resolution);
    }

    let mut wagered: u128 = 0;
    let mut returned: u128 = 0;
    let mut pnl: i128 = 0;
    for (key, stake) in wagers {
        if stake == 0 {
            continue;
        }
        wagered += u128::from(stake);
        let entry = match registry.number_group_of(key.as_str()) {
            Ok(group) => {
                let won = group.is_member(outcome);
                let entry_pnl = price(stake, won, |stake| group.payout.gross_return(stake));
                // Paired sides share a category; at most one of them can win.
                let category_outcome = resolution
                    .category_outcomes
                    .entry(group.category.clone())
                    .or_insert(Outcome::Loss);
                if won {
                    *category_outcome = Outcome::Win;
                }
                ResolutionEntry {
                    key: key.clone(),
                    category: Some(group.category.clone()),
                    stake,
                    won,
                    pnl: entry_pnl,
                }
            }
            Err(_) => {
                warn!(spin, key = %key, stake, "wager on unknown group forfeited");
                resolution.warnings.push(IntegrityWarning::UnknownGroup {
                    key: key.clone(),
                    stake,
                });
                ResolutionEntry {
                    key: key.clone(),
                    category: None,
                    stake,
                    won: false,
                    pnl: price(stake, false, |_| 0),
                }
            }
        };
        returned += u128::from(entry.returned());
        pnl += i128::from(entry.pnl);
        resolution.entries.insert(key, entry);
    }

    for (category, category_outcome) in &resolution.category_outcomes {
        if let Some(step) = book.advance(category, *category_outcome, spin) {
            resolution.steps.push(step);
        }
    }

    resolution.total_wagered = u64::try_from(wagered).unwrap_or(u64::MAX);
    resolution.total_returned = u64::try_from(returned).unwrap_or(u64::MAX);
    resolution.total_pnl = clamp_i64(pnl);
    debug_assert_eq!(
        i128::from(resolution.total_returned),
        i128::from(resolution.total_wagered) + i128::from(resolution.total_pnl),
        "returned must equal wagered plus pnl"
    );
    Ok(resolution)
}

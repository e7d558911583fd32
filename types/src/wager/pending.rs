use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{CategoryId, GroupKey, SpinError, MAX_SPIN_STAKE};

/// Stakes placed since the last spin, keyed by group.
///
/// Owned by the surrounding UI; resolution takes the contents out, leaving the
/// map empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingWagers(BTreeMap<GroupKey, u64>);

impl PendingWagers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `stake` to whatever is already on `key`.
    pub fn place(&mut self, key: impl Into<GroupKey>, stake: u64) {
        let entry = self.0.entry(key.into()).or_insert(0);
        *entry = entry.saturating_add(stake);
    }

    pub fn remove(&mut self, key: &str) -> Option<u64> {
        self.0.remove(key)
    }

    pub fn stake(&self, key: &str) -> u64 {
        self.0.get(key).copied().unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no positive stake is pending.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|stake| *stake == 0)
    }

    pub fn total(&self) -> u64 {
        self.0
            .values()
            .fold(0u64, |total, stake| total.saturating_add(*stake))
    }

    /// Total stake, or `StakeTooLarge` when it exceeds [`MAX_SPIN_STAKE`].
    pub fn checked_total(&self) -> Result<u64, SpinError> {
        let total = self.total();
        if total > MAX_SPIN_STAKE {
            return Err(SpinError::StakeTooLarge {
                total,
                max: MAX_SPIN_STAKE,
            });
        }
        Ok(total)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, u64)> {
        self.0.iter().map(|(key, stake)| (key, *stake))
    }

    /// Move every pending stake out, leaving this map empty.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

impl<K: Into<GroupKey>> FromIterator<(K, u64)> for PendingWagers {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        let mut wagers = Self::new();
        for (key, stake) in iter {
            wagers.place(key, stake);
        }
        wagers
    }
}

impl IntoIterator for PendingWagers {
    type Item = (GroupKey, u64);
    type IntoIter = std::collections::btree_map::IntoIter<GroupKey, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Result of one wager on one spin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionEntry {
    pub key: GroupKey,
    /// `None` when the key did not resolve to a known group.
    pub category: Option<CategoryId>,
    pub stake: u64,
    pub won: bool,
    pub pnl: i64,
}

impl ResolutionEntry {
    /// Chips handed back to the player (stake plus winnings, or nothing).
    pub fn returned(&self) -> u64 {
        if self.won {
            self.stake.saturating_add_signed(self.pnl)
        } else {
            0
        }
    }
}

/// Configuration defect detected during resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityWarning {
    /// Wager placed on a key the registry does not know; stake forfeited.
    UnknownGroup { key: GroupKey, stake: u64 },
}

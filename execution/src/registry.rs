//! Group registry: the catalog of wagerable number groups.
//!
//! The registry provides:
//! - The fixed table and wheel groups with their closed payout table
//! - Player-authored custom groups, whose ratio is derived from coverage
//! - Category lookup so paired sides share one progression tracker
//!
//! # Example
//! ```rust
//! use wheelhouse_execution::GroupRegistry;
//! use wheelhouse_types::wager::{PayoutRatio, SpinOutcome};
//!
//! let registry = GroupRegistry::default();
//! let red = registry.number_group_of("red").unwrap();
//! assert!(red.is_member(SpinOutcome::new(32).unwrap()));
//! assert_eq!(red.payout_ratio(), PayoutRatio::EVEN_MONEY);
//! assert_eq!(red.category, registry.number_group_of("black").unwrap().category);
//! ```

use std::collections::BTreeMap;
use thiserror::Error;
use wheelhouse_types::wager::{
    CategoryId, CustomGroupDef, GroupError, GroupKey, GroupKind, NumberGroup, NumberSet,
    PayoutRatio, Side, EUROPEAN_WHEEL, JEU_ZERO, MAX_NUMBER, ORPHELINS, RED_NUMBERS, TIERS,
    VOISINS,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown group: {key}")]
    NotFound { key: String },
    #[error("group {key} is already registered")]
    DuplicateGroup { key: GroupKey },
    #[error("custom group id must not be empty")]
    EmptyCustomGroupId,
    #[error("custom group {id} is invalid")]
    InvalidCustomGroup {
        id: String,
        #[source]
        source: GroupError,
    },
}

/// Catalog of every group a wager can reference, keyed by group key.
#[derive(Clone, Debug)]
pub struct GroupRegistry {
    groups: BTreeMap<GroupKey, NumberGroup>,
}

impl Default for GroupRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl GroupRegistry {
    /// Create a registry holding only the fixed table and wheel groups.
    pub fn standard() -> Self {
        let groups = fixed_groups()
            .into_iter()
            .map(|group| (group.key.clone(), group))
            .collect();
        Self { groups }
    }

    /// Create the standard registry plus the given custom groups.
    pub fn with_custom_groups(defs: &[CustomGroupDef]) -> Result<Self, RegistryError> {
        let mut registry = Self::standard();
        for def in defs {
            registry.register_custom(def)?;
        }
        Ok(registry)
    }

    /// Add a player-authored group. Its key and category are both `custom:<id>`.
    pub fn register_custom(&mut self, def: &CustomGroupDef) -> Result<&NumberGroup, RegistryError> {
        if def.id.trim().is_empty() {
            return Err(RegistryError::EmptyCustomGroupId);
        }
        let group = def
            .to_group()
            .map_err(|source| RegistryError::InvalidCustomGroup {
                id: def.id.clone(),
                source,
            })?;
        if self.groups.contains_key(&group.key) {
            return Err(RegistryError::DuplicateGroup { key: group.key });
        }
        let key = group.key.clone();
        Ok(self.groups.entry(key).or_insert(group))
    }

    /// Remove a custom group. Fixed groups cannot be removed.
    pub fn remove_custom(&mut self, id: &str) -> Option<NumberGroup> {
        let key = GroupKey::custom(id);
        let is_custom = self
            .groups
            .get(&key)
            .is_some_and(|group| group.kind == GroupKind::Custom);
        if !is_custom {
            return None;
        }
        self.groups.remove(&key)
    }

    pub fn number_group_of(&self, key: &str) -> Result<&NumberGroup, RegistryError> {
        self.groups.get(key).ok_or_else(|| RegistryError::NotFound {
            key: key.to_string(),
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.groups.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn groups(&self) -> impl Iterator<Item = &NumberGroup> {
        self.groups.values()
    }

    pub fn custom_groups(&self) -> impl Iterator<Item = &NumberGroup> {
        self.groups
            .values()
            .filter(|group| group.kind == GroupKind::Custom)
    }

    /// All groups sharing `category` (two for a pair, one otherwise).
    pub fn groups_in_category<'a>(
        &'a self,
        category: &'a CategoryId,
    ) -> impl Iterator<Item = &'a NumberGroup> + 'a {
        self.groups
            .values()
            .filter(move |group| &group.category == category)
    }
}

fn set_where(predicate: impl Fn(u8) -> bool) -> NumberSet {
    NumberSet::from_fn(predicate)
}

fn set_of(numbers: &[u8]) -> NumberSet {
    numbers
        .iter()
        .copied()
        .fold(NumberSet::EMPTY, |mut set, number| {
            // Catalog constants are all within 0..=36.
            let _ = set.insert(number);
            set
        })
}

fn single(key: &str, members: NumberSet, payout: PayoutRatio, kind: GroupKind) -> NumberGroup {
    NumberGroup {
        key: GroupKey::new(key),
        category: CategoryId::new(key),
        side: None,
        members,
        payout,
        kind,
    }
}

fn pair(
    category: &str,
    (first_key, first): (&str, NumberSet),
    (second_key, second): (&str, NumberSet),
    kind: GroupKind,
) -> [NumberGroup; 2] {
    debug_assert!(first.is_disjoint(&second), "paired sides must not overlap");
    [(first_key, first, Side::First), (second_key, second, Side::Second)].map(
        |(key, members, side)| NumberGroup {
            key: GroupKey::new(key),
            category: CategoryId::new(category),
            side: Some(side),
            members,
            payout: PayoutRatio::EVEN_MONEY,
            kind,
        },
    )
}

fn fixed_groups() -> Vec<NumberGroup> {
    let red = set_of(&RED_NUMBERS);
    let mut groups = Vec::new();

    // Even-money pairs.
    groups.extend(pair(
        "red_black",
        ("red", red),
        ("black", set_where(|n| n != 0 && !red.contains(n))),
        GroupKind::Table,
    ));
    groups.extend(pair(
        "even_odd",
        ("even", set_where(|n| n != 0 && n % 2 == 0)),
        ("odd", set_where(|n| n % 2 == 1)),
        GroupKind::Table,
    ));
    groups.extend(pair(
        "low_high",
        ("low", set_where(|n| (1..=18).contains(&n))),
        ("high", set_where(|n| (19..=MAX_NUMBER).contains(&n))),
        GroupKind::Table,
    ));
    groups.extend(pair(
        "streets_ab",
        ("streets_a", set_where(|n| n != 0 && ((n - 1) / 3) % 2 == 0)),
        ("streets_b", set_where(|n| n != 0 && ((n - 1) / 3) % 2 == 1)),
        GroupKind::Table,
    ));
    groups.extend(pair(
        "six_lines_ab",
        ("six_lines_a", set_where(|n| n != 0 && ((n - 1) / 6) % 2 == 0)),
        ("six_lines_b", set_where(|n| n != 0 && ((n - 1) / 6) % 2 == 1)),
        GroupKind::Table,
    ));
    groups.extend(pair(
        "wheel_halves",
        ("wheel_right", set_of(&EUROPEAN_WHEEL[1..=18])),
        ("wheel_left", set_of(&EUROPEAN_WHEEL[19..])),
        GroupKind::Wheel,
    ));

    // Dozens and columns.
    for index in 1..=3u8 {
        let dozen = set_where(|n| n != 0 && (n - 1) / 12 == index - 1);
        groups.push(single(
            &format!("dozen_{index}"),
            dozen,
            PayoutRatio::DOZEN,
            GroupKind::Table,
        ));
        let column = set_where(|n| n != 0 && n % 3 == index % 3);
        groups.push(single(
            &format!("column_{index}"),
            column,
            PayoutRatio::DOZEN,
            GroupKind::Table,
        ));
    }

    // Six-lines: 1-6, 4-9, ..., 31-36.
    for index in 1..=11u8 {
        let start = 3 * index - 2;
        let line = set_where(|n| (start..start + 6).contains(&n));
        groups.push(single(
            &format!("six_line_{index}"),
            line,
            PayoutRatio::SIX_LINE,
            GroupKind::Table,
        ));
    }

    for number in 0..=MAX_NUMBER {
        groups.push(single(
            &format!("straight_{number}"),
            set_of(&[number]),
            PayoutRatio::STRAIGHT,
            GroupKind::Table,
        ));
    }

    // Wheel sectors pay by coverage.
    for (key, numbers) in [
        ("voisins", &VOISINS[..]),
        ("tiers", &TIERS[..]),
        ("orphelins", &ORPHELINS[..]),
        ("jeu_zero", &JEU_ZERO[..]),
    ] {
        let members = set_of(numbers);
        groups.push(single(
            key,
            members,
            PayoutRatio::for_coverage(members.len()),
            GroupKind::Wheel,
        ));
    }

    groups
}

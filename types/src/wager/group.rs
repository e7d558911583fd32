use serde::{Deserialize, Serialize};
use std::{borrow::Borrow, fmt};
use thiserror::Error as ThisError;

use super::{SpinOutcome, CUSTOM_GROUP_PREFIX, FULL_COVERAGE, MAX_NUMBER};

#[derive(Debug, Clone, ThisError, PartialEq, Eq)]
pub enum GroupError {
    #[error("number out of range (got={got}, max={max})")]
    NumberOutOfRange { got: u32, max: u8 },
    #[error("group has no numbers")]
    Empty,
}

/// A subset of the 37 pockets, stored as a bitmask.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u8>")]
pub struct NumberSet(u64);

impl NumberSet {
    pub const EMPTY: Self = Self(0);

    pub fn from_numbers(numbers: &[u8]) -> Result<Self, GroupError> {
        let mut set = Self::EMPTY;
        for &number in numbers {
            set.insert(number)?;
        }
        Ok(set)
    }

    /// Build from a predicate over `0..=36`.
    pub fn from_fn(predicate: impl Fn(u8) -> bool) -> Self {
        let mut bits = 0u64;
        for number in 0..=MAX_NUMBER {
            if predicate(number) {
                bits |= 1 << number;
            }
        }
        Self(bits)
    }

    pub fn insert(&mut self, number: u8) -> Result<(), GroupError> {
        if number > MAX_NUMBER {
            return Err(GroupError::NumberOutOfRange {
                got: u32::from(number),
                max: MAX_NUMBER,
            });
        }
        self.0 |= 1 << number;
        Ok(())
    }

    pub fn contains(&self, number: u8) -> bool {
        number <= MAX_NUMBER && self.0 & (1 << number) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.0 & other.0 == 0
    }

    pub fn numbers(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=MAX_NUMBER).filter(move |n| self.contains(*n))
    }
}

impl fmt::Debug for NumberSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.numbers()).finish()
    }
}

impl TryFrom<Vec<u32>> for NumberSet {
    type Error = GroupError;

    fn try_from(value: Vec<u32>) -> Result<Self, Self::Error> {
        let mut set = Self::EMPTY;
        for number in value {
            let number = u8::try_from(number).map_err(|_| GroupError::NumberOutOfRange {
                got: number,
                max: MAX_NUMBER,
            })?;
            set.insert(number)?;
        }
        Ok(set)
    }
}

impl From<NumberSet> for Vec<u8> {
    fn from(value: NumberSet) -> Self {
        value.numbers().collect()
    }
}

/// Gross return per unit staked, as an exact fraction that is never below 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayoutRatio {
    numerator: u32,
    denominator: u32,
}

impl PayoutRatio {
    pub const EVEN_MONEY: Self = Self::whole(2);
    pub const DOZEN: Self = Self::whole(3);
    pub const SIX_LINE: Self = Self::whole(6);
    pub const STRAIGHT: Self = Self::whole(36);

    pub const fn whole(value: u32) -> Self {
        Self {
            numerator: value,
            denominator: 1,
        }
    }

    /// Ratio for a group covering `count` pockets: `36 / count`, never below 1.
    pub fn for_coverage(count: usize) -> Self {
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        if count == 0 || count >= FULL_COVERAGE {
            return Self::whole(1);
        }
        let divisor = gcd(FULL_COVERAGE, count);
        Self {
            numerator: FULL_COVERAGE / divisor,
            denominator: count / divisor,
        }
    }

    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    pub fn is_whole(&self) -> bool {
        self.denominator == 1
    }

    /// Stake plus winnings for a winning stake, rounded down to whole chips.
    pub fn gross_return(&self, stake: u64) -> u64 {
        let gross = u128::from(stake) * u128::from(self.numerator) / u128::from(self.denominator);
        u64::try_from(gross).unwrap_or(u64::MAX)
    }
}

impl fmt::Display for PayoutRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_whole() {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Lookup key of a wagerable group (`red`, `dozen_2`, `custom:lucky`, ...).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(String);

impl GroupKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn custom(id: &str) -> Self {
        Self(format!("{CUSTOM_GROUP_PREFIX}{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for GroupKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GroupKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Progression-sharing unit. Both sides of a paired group map to one category.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(String);

impl CategoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CategoryId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CategoryId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<&GroupKey> for CategoryId {
    fn from(value: &GroupKey) -> Self {
        Self(value.0.clone())
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which half of a paired group a key names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    First,
    Second,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// Layout-based group (colours, dozens, six-lines, ...).
    Table,
    /// Wheel-sector group (Voisins, wheel halves, ...).
    Wheel,
    /// Player-authored group.
    Custom,
}

/// A named subset of the pockets with its payout ratio.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberGroup {
    pub key: GroupKey,
    pub category: CategoryId,
    pub side: Option<Side>,
    pub members: NumberSet,
    pub payout: PayoutRatio,
    pub kind: GroupKind,
}

impl NumberGroup {
    pub fn is_member(&self, outcome: SpinOutcome) -> bool {
        self.members.contains(outcome.number())
    }

    pub fn payout_ratio(&self) -> PayoutRatio {
        self.payout
    }
}

/// A player-authored group as supplied by configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomGroupDef {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub numbers: Vec<u32>,
}

impl CustomGroupDef {
    pub fn new(id: impl Into<String>, numbers: impl IntoIterator<Item = u8>) -> Self {
        Self {
            id: id.into(),
            name: None,
            numbers: numbers.into_iter().map(u32::from).collect(),
        }
    }

    /// Validate and convert into a group keyed (and categorised) by its id.
    pub fn to_group(&self) -> Result<NumberGroup, GroupError> {
        let members = NumberSet::try_from(self.numbers.clone())?;
        if members.is_empty() {
            return Err(GroupError::Empty);
        }
        let key = GroupKey::custom(&self.id);
        Ok(NumberGroup {
            category: CategoryId::from(&key),
            key,
            side: None,
            members,
            payout: PayoutRatio::for_coverage(members.len()),
            kind: GroupKind::Custom,
        })
    }
}

/// Highest number on a single-zero wheel.
pub const MAX_NUMBER: u8 = 36;

/// Number of pockets on a single-zero wheel.
pub const POCKET_COUNT: usize = 37;

/// Coverage numerator used to derive payout ratios (a straight-up pays 36 for 1).
pub const FULL_COVERAGE: u32 = 36;

/// Largest total stake accepted on one spin. Every payout on such a batch fits an `i64`.
pub const MAX_SPIN_STAKE: u64 = i64::MAX as u64 / FULL_COVERAGE as u64;

/// Red numbers on a roulette wheel.
pub const RED_NUMBERS: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

/// Pocket order of the European wheel, clockwise from zero.
pub const EUROPEAN_WHEEL: [u8; POCKET_COUNT] = [
    0, 32, 15, 19, 4, 21, 2, 25, 17, 34, 6, 27, 13, 36, 11, 30, 8, 23, 10, 5, 24, 16, 33, 1, 20,
    14, 31, 9, 22, 18, 29, 7, 28, 12, 35, 3, 26,
];

/// Voisins du Zero: the 17 pockets from 22 to 25 around zero.
pub const VOISINS: [u8; 17] = [22, 18, 29, 7, 28, 12, 35, 3, 26, 0, 32, 15, 19, 4, 21, 2, 25];

/// Tiers du Cylindre: the 12 pockets opposite zero.
pub const TIERS: [u8; 12] = [27, 13, 36, 11, 30, 8, 23, 10, 5, 24, 16, 33];

/// Orphelins: the 8 pockets covered by neither Voisins nor Tiers.
pub const ORPHELINS: [u8; 8] = [1, 20, 14, 31, 9, 17, 34, 6];

/// Jeu Zero: the 7 pockets closest to zero.
pub const JEU_ZERO: [u8; 7] = [12, 35, 3, 26, 0, 32, 15];

/// Default length of generated stake sequences.
pub const DEFAULT_PROGRESSION_STEPS: usize = 10;

/// Upper bound on generated sequence lengths (2^31 is the last doubling that fits u32 math).
pub const MAX_PROGRESSION_STEPS: usize = 32;

/// Paroli stake multipliers.
pub const PAROLI_SEQUENCE: [u64; 3] = [1, 2, 4];

/// Prefix used for the keys and categories of player-authored groups.
pub const CUSTOM_GROUP_PREFIX: &str = "custom:";

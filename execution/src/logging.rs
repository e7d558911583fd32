//! Helpers for compact log fields.

use serde::Serialize;
use std::fmt::Write;
use wheelhouse_types::wager::{NumberSet, ResolutionEntry};

pub fn clamp_i64(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// `1,2,3` style rendering of a member set.
pub fn format_number_list(numbers: &NumberSet) -> String {
    let mut out = String::with_capacity(numbers.len().saturating_mul(3));
    for (idx, number) in numbers.numbers().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        let _ = write!(out, "{}", number);
    }
    out
}

#[derive(Serialize)]
struct EntrySummary<'a> {
    key: &'a str,
    stake: u64,
    pnl: i64,
}

/// JSON array of `{key, stake, pnl}` for every entry, for `info!` fields.
pub fn summarize_entries<'a>(entries: impl IntoIterator<Item = &'a ResolutionEntry>) -> String {
    let summary: Vec<EntrySummary<'a>> = entries
        .into_iter()
        .map(|entry| EntrySummary {
            key: entry.key.as_str(),
            stake: entry.stake,
            pnl: entry.pnl,
        })
        .collect();
    serde_json::to_string(&summary).unwrap_or_default()
}

//! JSON-lines spin log replay.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::{BufRead, Write};
use tracing::{info, warn};
use wheelhouse_execution::{Table, TableError};
use wheelhouse_types::wager::{CategoryId, PendingWagers, SpinEvent, SpinId};

/// One line of a spin log.
#[derive(Debug, Deserialize)]
pub struct SpinLine {
    /// Defaults to the 1-based line number.
    #[serde(default)]
    pub spin: Option<SpinId>,
    pub outcome: u32,
    #[serde(default)]
    pub at_ms: u64,
    #[serde(default)]
    pub wagers: PendingWagers,
    /// Paused categories the player resumes before this spin.
    #[serde(default)]
    pub resume: Vec<CategoryId>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub lines: u64,
    pub resolved: u64,
    pub skipped: u64,
    pub rejected: u64,
}

/// Feed every line of `input` through `table`, writing one JSON report per resolved spin.
pub fn replay<R: BufRead, W: Write>(
    table: &mut Table,
    input: R,
    mut output: W,
) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();
    for (index, line) in input.lines().enumerate() {
        let number = index as u64 + 1;
        let line = line.with_context(|| format!("Could not read spin log line {number}"))?;
        if line.trim().is_empty() {
            continue;
        }
        summary.lines += 1;
        let parsed: SpinLine = serde_json::from_str(&line)
            .with_context(|| format!("Could not parse spin log line {number}"))?;

        for category in &parsed.resume {
            if !table.resume(category) {
                warn!(
                    line = number,
                    category = %category,
                    "resume requested for unpaused category"
                );
            }
        }

        let spin = SpinEvent::new(parsed.spin.unwrap_or(number), parsed.outcome).at(parsed.at_ms);
        let mut wagers = parsed.wagers;
        match table.resolve_spin(spin, &mut wagers) {
            Ok(Some(report)) => {
                summary.resolved += 1;
                serde_json::to_writer(&mut output, &report).context("Could not encode report")?;
                writeln!(output).context("Could not write report")?;
            }
            Ok(None) => summary.skipped += 1,
            Err(TableError::InvalidSpin(err)) => {
                summary.rejected += 1;
                warn!(line = number, spin = spin.id, error = %err, "spin rejected");
            }
            Err(err) => return Err(err).with_context(|| format!("Could not resolve line {number}")),
        }
    }
    output.flush().context("Could not flush output")?;

    let session = table.session();
    info!(
        lines = summary.lines,
        resolved = summary.resolved,
        skipped = summary.skipped,
        rejected = summary.rejected,
        bankroll = session.bankroll,
        net_result = session.net_result(),
        completed_cards = session.completed_cards(),
        "replay finished"
    );
    Ok(summary)
}

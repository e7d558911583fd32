use serde::{Deserialize, Serialize};

/// Lifecycle of a card: `Locked -> Active -> {Completed, Failed}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    Locked,
    Active,
    Completed,
    Failed,
}

impl CardStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A bounded sub-session with a profit target and a wager-count limit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: u32,
    pub target: i64,
    pub max_wagers: u32,
    pub cumulative_total: i64,
    pub wagers_used: u32,
    pub status: CardStatus,
    pub started_at: Option<u64>,
}

impl Card {
    pub fn new(id: u32, target: i64, max_wagers: u32) -> Self {
        Self {
            id,
            target,
            max_wagers,
            cumulative_total: 0,
            wagers_used: 0,
            status: CardStatus::Locked,
            started_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn wagers_remaining(&self) -> u32 {
        self.max_wagers.saturating_sub(self.wagers_used)
    }

    /// Profit still needed to reach the target (zero once reached).
    pub fn remaining_to_target(&self) -> i64 {
        self.target.saturating_sub(self.cumulative_total).max(0)
    }
}

/// Card layout for a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPlan {
    pub total_cards: u32,
    pub target: u64,
    pub max_wagers: u32,
}

impl Default for CardPlan {
    fn default() -> Self {
        Self {
            total_cards: 0,
            target: 100,
            max_wagers: 15,
        }
    }
}

use serde::{Deserialize, Serialize};

use super::Card;

/// Bankroll and advisory stop thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLimits {
    pub bankroll: u64,
    #[serde(default)]
    pub stop_loss: Option<u64>,
    #[serde(default)]
    pub stop_profit: Option<u64>,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            bankroll: 1_000,
            stop_loss: None,
            stop_profit: None,
        }
    }
}

/// Advisory stop signals. The engine reports them; callers decide what to do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopSignals {
    pub stop_loss: bool,
    pub stop_profit: bool,
}

impl StopSignals {
    pub fn any(&self) -> bool {
        self.stop_loss || self.stop_profit
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub cards: Vec<Card>,
    /// Index of the active card; `None` once every card is terminal.
    pub current_card_index: Option<usize>,
    pub initial_bankroll: u64,
    pub bankroll: i64,
    pub total_wagered: u64,
    pub total_returned: u64,
    pub stop_loss: Option<u64>,
    pub stop_profit: Option<u64>,
}

impl Session {
    pub fn current_card(&self) -> Option<&Card> {
        self.current_card_index.and_then(|index| self.cards.get(index))
    }

    /// Bankroll movement since the session started.
    pub fn net_result(&self) -> i64 {
        let initial = i64::try_from(self.initial_bankroll).unwrap_or(i64::MAX);
        self.bankroll.saturating_sub(initial)
    }

    pub fn stop_signals(&self) -> StopSignals {
        let net = i128::from(self.net_result());
        StopSignals {
            stop_loss: self
                .stop_loss
                .is_some_and(|limit| net <= -i128::from(limit)),
            stop_profit: self
                .stop_profit
                .is_some_and(|limit| net >= i128::from(limit)),
        }
    }

    /// Whether every card has reached a terminal state.
    pub fn cards_finished(&self) -> bool {
        self.cards.iter().all(Card::is_terminal)
    }

    pub fn completed_cards(&self) -> usize {
        self.cards
            .iter()
            .filter(|card| card.status == super::CardStatus::Completed)
            .count()
    }
}

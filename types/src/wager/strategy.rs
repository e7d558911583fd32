use serde::{Deserialize, Serialize};

use super::{CategoryId, SpinId, DEFAULT_PROGRESSION_STEPS};

fn default_steps() -> usize {
    DEFAULT_PROGRESSION_STEPS
}

/// Result of a category on one spin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    pub fn from_won(won: bool) -> Self {
        if won {
            Self::Win
        } else {
            Self::Loss
        }
    }
}

/// Reaction of an outcome-rules strategy to a win or a loss at a given depth.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeAction {
    /// Keep the current stake.
    #[default]
    Same,
    /// Move one step up the doubling sequence.
    Double,
    /// Return to the base stake.
    Reset,
    /// Keep the current stake and ask the player to stop.
    Pause,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRules {
    #[serde(default = "OutcomeRules::default_on_win")]
    pub on_win: OutcomeAction,
    #[serde(default = "OutcomeRules::default_on_loss")]
    pub on_first_loss: OutcomeAction,
    #[serde(default = "OutcomeRules::default_on_loss")]
    pub on_second_loss: OutcomeAction,
    #[serde(default = "OutcomeRules::default_on_loss")]
    pub on_third_loss_plus: OutcomeAction,
    #[serde(default = "default_steps")]
    pub steps: usize,
}

impl OutcomeRules {
    fn default_on_win() -> OutcomeAction {
        OutcomeAction::Reset
    }

    fn default_on_loss() -> OutcomeAction {
        OutcomeAction::Double
    }

    /// Action for the `depth`-th consecutive loss (1-based).
    pub fn on_loss(&self, depth: u32) -> OutcomeAction {
        match depth {
            0 | 1 => self.on_first_loss,
            2 => self.on_second_loss,
            _ => self.on_third_loss_plus,
        }
    }
}

impl Default for OutcomeRules {
    fn default() -> Self {
        Self {
            on_win: Self::default_on_win(),
            on_first_loss: Self::default_on_loss(),
            on_second_loss: Self::default_on_loss(),
            on_third_loss_plus: Self::default_on_loss(),
            steps: DEFAULT_PROGRESSION_STEPS,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinStep {
    #[default]
    Reset,
    MoveBack1,
    MoveBack2,
    Stay,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossStep {
    #[default]
    MoveForward1,
    MoveForward2,
    Stay,
}

/// Behaviour when a forward move would run past the last sequence entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceEnd {
    #[default]
    Stay,
    Reset,
    Pause,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequentialRules {
    /// Stake multipliers, in order.
    pub sequence: Vec<u64>,
    #[serde(default)]
    pub on_win: WinStep,
    #[serde(default)]
    pub on_loss: LossStep,
    /// Return to the first entry after this many consecutive wins.
    #[serde(default)]
    pub reset_after_wins: Option<u32>,
    #[serde(default)]
    pub at_sequence_end: SequenceEnd,
}

impl SequentialRules {
    pub fn new(sequence: Vec<u64>) -> Self {
        Self {
            sequence,
            on_win: WinStep::default(),
            on_loss: LossStep::default(),
            reset_after_wins: None,
            at_sequence_end: SequenceEnd::default(),
        }
    }
}

/// Betting progression applied to every category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressionStrategy {
    Flat,
    Martingale {
        #[serde(default = "default_steps")]
        steps: usize,
    },
    Fibonacci {
        #[serde(default = "default_steps")]
        steps: usize,
    },
    DAlembert {
        #[serde(default = "default_steps")]
        steps: usize,
    },
    ReverseDAlembert {
        #[serde(default = "default_steps")]
        steps: usize,
    },
    Paroli,
    OutcomeRules(OutcomeRules),
    Sequential(SequentialRules),
}

impl Default for ProgressionStrategy {
    fn default() -> Self {
        Self::Flat
    }
}

impl ProgressionStrategy {
    pub fn martingale() -> Self {
        Self::Martingale {
            steps: DEFAULT_PROGRESSION_STEPS,
        }
    }

    pub fn fibonacci() -> Self {
        Self::Fibonacci {
            steps: DEFAULT_PROGRESSION_STEPS,
        }
    }

    pub fn d_alembert() -> Self {
        Self::DAlembert {
            steps: DEFAULT_PROGRESSION_STEPS,
        }
    }

    pub fn reverse_d_alembert() -> Self {
        Self::ReverseDAlembert {
            steps: DEFAULT_PROGRESSION_STEPS,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Martingale { .. } => "martingale",
            Self::Fibonacci { .. } => "fibonacci",
            Self::DAlembert { .. } => "d_alembert",
            Self::ReverseDAlembert { .. } => "reverse_d_alembert",
            Self::Paroli => "paroli",
            Self::OutcomeRules(_) => "outcome_rules",
            Self::Sequential(_) => "sequential",
        }
    }
}

/// Per-category progression state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionTracker {
    pub category: CategoryId,
    pub position: usize,
    pub consecutive_wins: u32,
    pub consecutive_losses: u32,
    pub last_outcome: Option<Outcome>,
    /// Raised by a pause rule; cleared only by an explicit resume.
    pub paused: bool,
    /// Last spin applied to this tracker.
    pub last_spin: Option<SpinId>,
}

impl ProgressionTracker {
    pub fn new(category: CategoryId) -> Self {
        Self {
            category,
            position: 0,
            consecutive_wins: 0,
            consecutive_losses: 0,
            last_outcome: None,
            paused: false,
            last_spin: None,
        }
    }

    /// Whether `spin` has not been applied yet.
    pub fn accepts(&self, spin: SpinId) -> bool {
        self.last_spin.map_or(true, |last| spin > last)
    }
}

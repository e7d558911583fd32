//! Progression strategy engine.
//!
//! Each category owns one [`ProgressionTracker`]. A tracker's `position` indexes the active
//! strategy's stake sequence; the chip value for the next wager on that category is
//! `base_unit * sequence[position]`. Transitions are pure functions of the previous tracker and
//! the spin's outcome, and always produce a position inside the sequence.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};
use wheelhouse_types::wager::{
    CategoryId, LossStep, Outcome, OutcomeAction, ProgressionStrategy, ProgressionTracker,
    SequenceEnd, SpinId, WinStep, MAX_PROGRESSION_STEPS, PAROLI_SEQUENCE,
};

/// Stake multipliers for `strategy`. Never empty.
pub fn sequence_for(strategy: &ProgressionStrategy) -> Vec<u64> {
    let sequence = match strategy {
        ProgressionStrategy::Flat => vec![1],
        ProgressionStrategy::Martingale { steps } => doubling(*steps),
        ProgressionStrategy::Fibonacci { steps } => {
            let mut sequence = Vec::with_capacity(clamp_steps(*steps));
            let (mut a, mut b) = (1u64, 1u64);
            for _ in 0..clamp_steps(*steps) {
                sequence.push(a);
                (a, b) = (b, a.saturating_add(b));
            }
            sequence
        }
        ProgressionStrategy::DAlembert { steps }
        | ProgressionStrategy::ReverseDAlembert { steps } => {
            (1..=clamp_steps(*steps) as u64).collect()
        }
        ProgressionStrategy::Paroli => PAROLI_SEQUENCE.to_vec(),
        ProgressionStrategy::OutcomeRules(rules) => doubling(rules.steps),
        ProgressionStrategy::Sequential(rules) => rules.sequence.clone(),
    };
    if sequence.is_empty() {
        // Rejected by config validation; keep the function total regardless.
        return vec![1];
    }
    sequence
}

fn clamp_steps(steps: usize) -> usize {
    steps.clamp(1, MAX_PROGRESSION_STEPS)
}

fn doubling(steps: usize) -> Vec<u64> {
    (0..clamp_steps(steps) as u32).map(|exp| 1u64 << exp).collect()
}

/// A strategy together with its materialised stake sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Progression {
    strategy: ProgressionStrategy,
    sequence: Vec<u64>,
}

impl Progression {
    pub fn new(strategy: ProgressionStrategy) -> Self {
        let sequence = sequence_for(&strategy);
        Self { strategy, sequence }
    }

    pub fn strategy(&self) -> &ProgressionStrategy {
        &self.strategy
    }

    pub fn sequence(&self) -> &[u64] {
        &self.sequence
    }

    fn last_index(&self) -> usize {
        self.sequence.len() - 1
    }

    /// Multiplier at the tracker's position.
    ///
    /// An out-of-range position means a transition produced an invalid state; this panics in
    /// debug builds and falls back to the last entry in release builds.
    pub fn multiplier(&self, tracker: &ProgressionTracker) -> u64 {
        debug_assert!(
            tracker.position <= self.last_index(),
            "tracker position {} outside sequence of length {}",
            tracker.position,
            self.sequence.len()
        );
        let index = tracker.position.min(self.last_index());
        self.sequence[index]
    }

    /// Apply one outcome to `tracker`, returning the next state.
    pub fn transition(&self, tracker: &ProgressionTracker, outcome: Outcome) -> ProgressionTracker {
        let mut next = tracker.clone();
        match outcome {
            Outcome::Win => {
                next.consecutive_wins = next.consecutive_wins.saturating_add(1);
                next.consecutive_losses = 0;
            }
            Outcome::Loss => {
                next.consecutive_losses = next.consecutive_losses.saturating_add(1);
                next.consecutive_wins = 0;
            }
        }
        next.last_outcome = Some(outcome);

        // A paused tracker holds its stake until the player resumes.
        if tracker.paused {
            return next;
        }

        let last = self.last_index();
        let position = tracker.position.min(last);
        let forward = |step: usize| position.saturating_add(step).min(last);

        let (position, pause) = match (&self.strategy, outcome) {
            (ProgressionStrategy::Flat, _) => (0, false),
            (ProgressionStrategy::Martingale { .. }, Outcome::Win) => (0, false),
            (ProgressionStrategy::Martingale { .. }, Outcome::Loss) => (forward(1), false),
            (ProgressionStrategy::Fibonacci { .. }, Outcome::Win) => {
                (position.saturating_sub(2), false)
            }
            (ProgressionStrategy::Fibonacci { .. }, Outcome::Loss) => (forward(1), false),
            (ProgressionStrategy::DAlembert { .. }, Outcome::Win) => {
                (position.saturating_sub(1), false)
            }
            (ProgressionStrategy::DAlembert { .. }, Outcome::Loss) => (forward(1), false),
            (ProgressionStrategy::ReverseDAlembert { .. }, Outcome::Win) => (forward(1), false),
            (ProgressionStrategy::ReverseDAlembert { .. }, Outcome::Loss) => {
                (position.saturating_sub(1), false)
            }
            // The third consecutive win lands on the last entry; the next win cashes out.
            (ProgressionStrategy::Paroli, Outcome::Win) if position >= last => (0, false),
            (ProgressionStrategy::Paroli, Outcome::Win) => (forward(1), false),
            (ProgressionStrategy::Paroli, Outcome::Loss) => (0, false),
            (ProgressionStrategy::OutcomeRules(rules), outcome) => {
                let action = match outcome {
                    Outcome::Win => rules.on_win,
                    Outcome::Loss => rules.on_loss(next.consecutive_losses),
                };
                match action {
                    OutcomeAction::Same => (position, false),
                    OutcomeAction::Double => (forward(1), false),
                    OutcomeAction::Reset => (0, false),
                    OutcomeAction::Pause => (position, true),
                }
            }
            (ProgressionStrategy::Sequential(rules), Outcome::Win) => {
                let auto_reset = rules
                    .reset_after_wins
                    .is_some_and(|wins| wins > 0 && next.consecutive_wins % wins == 0);
                if auto_reset {
                    (0, false)
                } else {
                    match rules.on_win {
                        WinStep::Reset => (0, false),
                        WinStep::MoveBack1 => (position.saturating_sub(1), false),
                        WinStep::MoveBack2 => (position.saturating_sub(2), false),
                        WinStep::Stay => (position, false),
                    }
                }
            }
            (ProgressionStrategy::Sequential(rules), Outcome::Loss) => {
                let step = match rules.on_loss {
                    LossStep::MoveForward1 => 1,
                    LossStep::MoveForward2 => 2,
                    LossStep::Stay => 0,
                };
                let target = position.saturating_add(step);
                if target <= last {
                    (target, false)
                } else {
                    match rules.at_sequence_end {
                        SequenceEnd::Stay => (last, false),
                        SequenceEnd::Reset => (0, false),
                        SequenceEnd::Pause => (last, true),
                    }
                }
            }
        };

        debug_assert!(position <= last, "transition produced position {position} > {last}");
        next.position = position.min(last);
        next.paused = pause;
        next
    }
}

/// One applied tracker transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Step {
    pub category: CategoryId,
    pub outcome: Outcome,
    pub from: usize,
    pub to: usize,
    /// The transition raised the Paused flag.
    pub paused: bool,
}

/// Every category's tracker under one strategy and base unit.
#[derive(Clone, Debug)]
pub struct ProgressionBook {
    progression: Progression,
    base_unit: u64,
    trackers: BTreeMap<CategoryId, ProgressionTracker>,
}

impl ProgressionBook {
    pub fn new(strategy: ProgressionStrategy, base_unit: u64) -> Self {
        Self {
            progression: Progression::new(strategy),
            base_unit,
            trackers: BTreeMap::new(),
        }
    }

    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    pub fn base_unit(&self) -> u64 {
        self.base_unit
    }

    /// Swap the strategy. Positions are meaningless under a new sequence, so trackers restart.
    pub fn set_strategy(&mut self, strategy: ProgressionStrategy) {
        self.progression = Progression::new(strategy);
        self.trackers.clear();
    }

    pub fn tracker(&self, category: &CategoryId) -> Option<&ProgressionTracker> {
        self.trackers.get(category)
    }

    pub fn trackers(&self) -> &BTreeMap<CategoryId, ProgressionTracker> {
        &self.trackers
    }

    /// Stake for the next wager on `category`. Untracked categories start at position 0.
    pub fn chip_value(&self, category: &CategoryId) -> u64 {
        let multiplier = match self.trackers.get(category) {
            Some(tracker) => self.progression.multiplier(tracker),
            None => self.progression.sequence()[0],
        };
        self.base_unit.saturating_mul(multiplier)
    }

    pub fn is_paused(&self, category: &CategoryId) -> bool {
        self.trackers
            .get(category)
            .is_some_and(|tracker| tracker.paused)
    }

    /// Next chip value for every tracked category.
    pub fn next_stakes(&self) -> BTreeMap<CategoryId, u64> {
        self.trackers
            .keys()
            .map(|category| (category.clone(), self.chip_value(category)))
            .collect()
    }

    /// Apply `outcome` for `spin` to `category`, creating the tracker on first use.
    ///
    /// Returns `None` when the tracker has already seen this spin (or a later one).
    pub fn advance(
        &mut self,
        category: &CategoryId,
        outcome: Outcome,
        spin: SpinId,
    ) -> Option<Step> {
        let tracker = self
            .trackers
            .entry(category.clone())
            .or_insert_with(|| ProgressionTracker::new(category.clone()));
        if !tracker.accepts(spin) {
            warn!(
                category = %category,
                spin,
                last_spin = ?tracker.last_spin,
                "progression replay ignored"
            );
            return None;
        }

        let was_paused = tracker.paused;
        let mut next = self.progression.transition(tracker, outcome);
        next.last_spin = Some(spin);
        let step = Step {
            category: category.clone(),
            outcome,
            from: tracker.position,
            to: next.position,
            paused: next.paused && !was_paused,
        };
        debug!(
            category = %category,
            spin,
            ?outcome,
            from = step.from,
            to = step.to,
            paused = next.paused,
            "progression advanced"
        );
        *tracker = next;
        Some(step)
    }

    /// Clear the Paused flag on `category`. Returns whether it was paused.
    pub fn resume(&mut self, category: &CategoryId) -> bool {
        match self.trackers.get_mut(category) {
            Some(tracker) if tracker.paused => {
                tracker.paused = false;
                true
            }
            _ => false,
        }
    }

    /// Replace the trackers with previously persisted ones, clamped to this sequence.
    pub fn restore(&mut self, trackers: BTreeMap<CategoryId, ProgressionTracker>) {
        let last = self.progression.last_index();
        self.trackers = trackers
            .into_iter()
            .map(|(category, mut tracker)| {
                tracker.position = tracker.position.min(last);
                tracker.category = category.clone();
                (category, tracker)
            })
            .collect();
    }

    /// Drop every tracker, returning all categories to the base stake.
    pub fn reset(&mut self) {
        self.trackers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use wheelhouse_types::wager::{OutcomeRules, SequentialRules};

    fn category() -> CategoryId {
        CategoryId::new("red_black")
    }

    /// Feed `outcomes` through a fresh book and return the final tracker.
    fn run(strategy: ProgressionStrategy, outcomes: &[Outcome]) -> ProgressionTracker {
        let mut book = ProgressionBook::new(strategy, 10);
        for (spin, outcome) in outcomes.iter().enumerate() {
            book.advance(&category(), *outcome, spin as SpinId)
                .expect("fresh spin");
        }
        book.tracker(&category()).cloned().expect("tracked")
    }

    use Outcome::{Loss, Win};

    #[test]
    fn test_sequences() {
        assert_eq!(sequence_for(&ProgressionStrategy::Flat), vec![1]);
        assert_eq!(
            sequence_for(&ProgressionStrategy::Martingale { steps: 5 }),
            vec![1, 2, 4, 8, 16]
        );
        assert_eq!(
            sequence_for(&ProgressionStrategy::Fibonacci { steps: 7 }),
            vec![1, 1, 2, 3, 5, 8, 13]
        );
        assert_eq!(
            sequence_for(&ProgressionStrategy::DAlembert { steps: 4 }),
            vec![1, 2, 3, 4]
        );
        assert_eq!(sequence_for(&ProgressionStrategy::Paroli), vec![1, 2, 4]);
        assert_eq!(
            sequence_for(&ProgressionStrategy::Martingale { steps: 0 }),
            vec![1]
        );
        assert_eq!(
            sequence_for(&ProgressionStrategy::Martingale { steps: 1_000 }).len(),
            MAX_PROGRESSION_STEPS
        );
        assert_eq!(
            sequence_for(&ProgressionStrategy::Sequential(SequentialRules::new(vec![]))),
            vec![1]
        );
    }

    #[test]
    fn test_flat_chip_value_constant() {
        let mut book = ProgressionBook::new(ProgressionStrategy::Flat, 25);
        assert_eq!(book.chip_value(&category()), 25);
        for (spin, outcome) in [Loss, Loss, Win, Loss, Win, Win].into_iter().enumerate() {
            book.advance(&category(), outcome, spin as SpinId);
            assert_eq!(book.chip_value(&category()), 25);
        }
    }

    #[test]
    fn test_martingale_scenario() {
        // $10 base: loss, loss, then the $40 stake wins.
        let mut book = ProgressionBook::new(ProgressionStrategy::martingale(), 10);
        assert_eq!(book.chip_value(&category()), 10);
        book.advance(&category(), Loss, 1);
        assert_eq!(book.chip_value(&category()), 20);
        book.advance(&category(), Loss, 2);
        assert_eq!(book.chip_value(&category()), 40);
        let step = book.advance(&category(), Win, 3).expect("applied");
        assert_eq!((step.from, step.to), (2, 0));
        assert_eq!(book.chip_value(&category()), 10);
    }

    #[test]
    fn test_martingale_clamps_at_end() {
        let tracker = run(ProgressionStrategy::Martingale { steps: 3 }, &[Loss; 6]);
        assert_eq!(tracker.position, 2);
        assert_eq!(tracker.consecutive_losses, 6);
    }

    #[test]
    fn test_fibonacci_scenario() {
        let strategy = ProgressionStrategy::Fibonacci { steps: 6 };
        assert_eq!(run(strategy.clone(), &[Loss, Loss]).position, 2);
        assert_eq!(run(strategy.clone(), &[Loss, Loss, Win]).position, 0);
        assert_eq!(run(strategy, &[Loss, Loss, Loss, Loss, Win]).position, 2);
    }

    #[test]
    fn test_d_alembert() {
        let strategy = ProgressionStrategy::d_alembert();
        assert_eq!(run(strategy.clone(), &[Loss, Loss, Loss]).position, 3);
        assert_eq!(run(strategy.clone(), &[Loss, Loss, Loss, Win]).position, 2);
        assert_eq!(run(strategy, &[Win, Win]).position, 0);
    }

    #[test]
    fn test_reverse_d_alembert() {
        let strategy = ProgressionStrategy::reverse_d_alembert();
        assert_eq!(run(strategy.clone(), &[Win, Win, Win]).position, 3);
        assert_eq!(run(strategy.clone(), &[Win, Win, Loss]).position, 1);
        assert_eq!(run(strategy, &[Loss]).position, 0);
    }

    #[test]
    fn test_paroli_cycles_after_three_wins() {
        assert_eq!(run(ProgressionStrategy::Paroli, &[Win]).position, 1);
        assert_eq!(run(ProgressionStrategy::Paroli, &[Win, Win]).position, 2);
        assert_eq!(run(ProgressionStrategy::Paroli, &[Win, Win, Win]).position, 0);
        assert_eq!(
            run(ProgressionStrategy::Paroli, &[Win, Win, Win, Win]).position,
            1
        );
        assert_eq!(run(ProgressionStrategy::Paroli, &[Win, Loss]).position, 0);
    }

    #[test]
    fn test_outcome_rules_pause() {
        let rules = OutcomeRules {
            on_win: OutcomeAction::Reset,
            on_first_loss: OutcomeAction::Double,
            on_second_loss: OutcomeAction::Same,
            on_third_loss_plus: OutcomeAction::Pause,
            steps: 4,
        };
        let strategy = ProgressionStrategy::OutcomeRules(rules);
        assert_eq!(run(strategy.clone(), &[Loss]).position, 1);
        assert_eq!(run(strategy.clone(), &[Loss, Loss]).position, 1);

        let paused = run(strategy.clone(), &[Loss, Loss, Loss]);
        assert_eq!(paused.position, 1);
        assert!(paused.paused);

        // Paused trackers hold position but keep counting.
        let held = run(strategy, &[Loss, Loss, Loss, Win]);
        assert_eq!(held.position, 1);
        assert!(held.paused);
        assert_eq!(held.consecutive_wins, 1);
        assert_eq!(held.last_outcome, Some(Win));
    }

    #[test]
    fn test_resume_clears_pause() {
        let rules = OutcomeRules {
            on_first_loss: OutcomeAction::Pause,
            ..OutcomeRules::default()
        };
        let mut book = ProgressionBook::new(ProgressionStrategy::OutcomeRules(rules), 5);
        let step = book.advance(&category(), Loss, 1).expect("applied");
        assert!(step.paused);
        assert!(book.is_paused(&category()));

        assert!(book.resume(&category()));
        assert!(!book.is_paused(&category()));
        assert!(!book.resume(&category()));

        let step = book.advance(&category(), Win, 2).expect("applied");
        assert!(!step.paused);
        assert_eq!(step.to, 0);
    }

    #[test]
    fn test_sequential_moves_and_end_behaviour() {
        let mut rules = SequentialRules::new(vec![1, 2, 3, 5]);
        rules.on_loss = LossStep::MoveForward2;
        rules.on_win = WinStep::MoveBack1;

        let strategy = ProgressionStrategy::Sequential(rules.clone());
        assert_eq!(run(strategy.clone(), &[Loss]).position, 2);
        assert_eq!(run(strategy.clone(), &[Loss, Win]).position, 1);
        // 2 + 2 runs past index 3: default end behaviour stays on the last entry.
        assert_eq!(run(strategy, &[Loss, Loss]).position, 3);

        rules.at_sequence_end = SequenceEnd::Reset;
        let strategy = ProgressionStrategy::Sequential(rules.clone());
        assert_eq!(run(strategy, &[Loss, Loss]).position, 0);

        rules.at_sequence_end = SequenceEnd::Pause;
        let paused = run(ProgressionStrategy::Sequential(rules), &[Loss, Loss]);
        assert_eq!(paused.position, 3);
        assert!(paused.paused);
    }

    #[test]
    fn test_sequential_auto_reset_after_wins() {
        let mut rules = SequentialRules::new(vec![1, 2, 3, 4, 5]);
        rules.on_win = WinStep::Stay;
        rules.reset_after_wins = Some(2);
        let strategy = ProgressionStrategy::Sequential(rules);
        assert_eq!(run(strategy.clone(), &[Loss, Loss, Loss, Win]).position, 3);
        assert_eq!(run(strategy, &[Loss, Loss, Loss, Win, Win]).position, 0);
    }

    #[test]
    fn test_replayed_spin_is_ignored() {
        let mut book = ProgressionBook::new(ProgressionStrategy::martingale(), 10);
        assert!(book.advance(&category(), Loss, 7).is_some());
        let before = book.tracker(&category()).cloned();
        assert!(book.advance(&category(), Loss, 7).is_none());
        assert!(book.advance(&category(), Loss, 3).is_none());
        assert_eq!(book.tracker(&category()).cloned(), before);
    }

    #[test]
    fn test_set_strategy_resets_trackers() {
        let mut book = ProgressionBook::new(ProgressionStrategy::martingale(), 10);
        book.advance(&category(), Loss, 1);
        book.advance(&category(), Loss, 2);
        book.set_strategy(ProgressionStrategy::Paroli);
        assert!(book.trackers().is_empty());
        assert_eq!(book.chip_value(&category()), 10);
    }

    fn strategy_strategy() -> impl Strategy<Value = ProgressionStrategy> {
        let steps = 1usize..12;
        prop_oneof![
            Just(ProgressionStrategy::Flat),
            steps.clone().prop_map(|steps| ProgressionStrategy::Martingale { steps }),
            steps.clone().prop_map(|steps| ProgressionStrategy::Fibonacci { steps }),
            steps.clone().prop_map(|steps| ProgressionStrategy::DAlembert { steps }),
            steps.clone().prop_map(|steps| ProgressionStrategy::ReverseDAlembert { steps }),
            Just(ProgressionStrategy::Paroli),
            steps.clone().prop_map(|steps| ProgressionStrategy::OutcomeRules(OutcomeRules {
                on_win: OutcomeAction::Double,
                on_first_loss: OutcomeAction::Double,
                on_second_loss: OutcomeAction::Same,
                on_third_loss_plus: OutcomeAction::Reset,
                steps,
            })),
            (proptest::collection::vec(1u64..50, 1..8), 0usize..3, 0usize..3).prop_map(
                |(sequence, win, end)| {
                    let mut rules = SequentialRules::new(sequence);
                    rules.on_win = [WinStep::Reset, WinStep::MoveBack2, WinStep::Stay][win];
                    rules.on_loss = LossStep::MoveForward2;
                    rules.at_sequence_end =
                        [SequenceEnd::Stay, SequenceEnd::Reset, SequenceEnd::Pause][end];
                    ProgressionStrategy::Sequential(rules)
                }
            ),
        ]
    }

    proptest! {
        #[test]
        fn prop_position_stays_in_sequence(
            strategy in strategy_strategy(),
            outcomes in proptest::collection::vec(any::<bool>(), 0..64),
        ) {
            let mut book = ProgressionBook::new(strategy, 1);
            let len = book.progression().sequence().len();
            for (spin, won) in outcomes.into_iter().enumerate() {
                book.advance(&category(), Outcome::from_won(won), spin as SpinId);
                let tracker = book.tracker(&category()).expect("tracked");
                prop_assert!(tracker.position < len);
            }
        }

        #[test]
        fn prop_martingale_losses_track_position(losses in 0usize..20) {
            let steps = 10;
            let tracker = {
                let mut book = ProgressionBook::new(ProgressionStrategy::Martingale { steps }, 1);
                for spin in 0..losses {
                    book.advance(&category(), Outcome::Loss, spin as SpinId);
                }
                book.tracker(&category()).cloned()
                    .unwrap_or_else(|| ProgressionTracker::new(category()))
            };
            prop_assert_eq!(tracker.position, losses.min(steps - 1));
        }
    }
}

//! Card and session lifecycle.
//!
//! A session holds a row of cards. Exactly one card is `Active` at a time; once it completes or
//! fails, the next `Locked` card becomes `Active`. Every function here is total over its inputs.

use crate::logging::clamp_i64;
use serde::Serialize;
use tracing::info;
use wheelhouse_types::wager::{Card, CardPlan, CardStatus, Session, SessionLimits, StopSignals};

/// Lay out the cards for a new session. The first card starts `Active` at `at_ms`.
pub fn start_session(plan: &CardPlan, limits: &SessionLimits, at_ms: u64) -> Session {
    let target = clamp_i64(i128::from(plan.target));
    let mut cards: Vec<Card> = (1..=plan.total_cards)
        .map(|id| Card::new(id, target, plan.max_wagers))
        .collect();
    let current_card_index = cards.first_mut().map(|card| {
        card.status = CardStatus::Active;
        card.started_at = Some(at_ms);
        0
    });
    Session {
        cards,
        current_card_index,
        initial_bankroll: limits.bankroll,
        bankroll: clamp_i64(i128::from(limits.bankroll)),
        total_wagered: 0,
        total_returned: 0,
        stop_loss: limits.stop_loss,
        stop_profit: limits.stop_profit,
    }
}

/// Fold one resolution's PnL into `card`.
///
/// Reaching the target wins over running out of wagers. Cards that are not `Active` come back
/// unchanged.
pub fn apply_resolution(card: &Card, total_pnl: i64) -> Card {
    let mut next = card.clone();
    if card.status != CardStatus::Active {
        return next;
    }
    next.cumulative_total = card.cumulative_total.saturating_add(total_pnl);
    next.wagers_used = card.wagers_used.saturating_add(1);
    next.status = if next.cumulative_total >= next.target {
        CardStatus::Completed
    } else if next.wagers_used >= next.max_wagers {
        CardStatus::Failed
    } else {
        CardStatus::Active
    };
    next
}

/// A card left the `Active` state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CardTransition {
    pub card_id: u32,
    pub status: CardStatus,
    pub cumulative_total: i64,
    pub wagers_used: u32,
    /// Card unlocked in its place; `None` when the session has no cards left.
    pub next_card_id: Option<u32>,
}

/// Session-level effect of one resolved spin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionUpdate {
    pub card: Option<CardTransition>,
    pub bankroll: i64,
    pub net_result: i64,
    pub stop: StopSignals,
}

/// Apply one spin's totals to the session: bankroll, running totals, and the active card.
pub fn apply_to_session(
    session: &mut Session,
    total_wagered: u64,
    total_returned: u64,
    total_pnl: i64,
    at_ms: u64,
) -> SessionUpdate {
    session.bankroll = session.bankroll.saturating_add(total_pnl);
    session.total_wagered = session.total_wagered.saturating_add(total_wagered);
    session.total_returned = session.total_returned.saturating_add(total_returned);

    let card = match session.current_card_index {
        Some(index) => advance_card(session, index, total_pnl, at_ms),
        None => None,
    };

    SessionUpdate {
        card,
        bankroll: session.bankroll,
        net_result: session.net_result(),
        stop: session.stop_signals(),
    }
}

fn advance_card(
    session: &mut Session,
    index: usize,
    total_pnl: i64,
    at_ms: u64,
) -> Option<CardTransition> {
    let current = session.cards.get(index)?;
    let next = apply_resolution(current, total_pnl);
    let finished = next.is_terminal();
    session.cards[index] = next;
    if !finished {
        return None;
    }

    let unlocked = session
        .cards
        .iter()
        .enumerate()
        .skip(index + 1)
        .find(|(_, card)| card.status == CardStatus::Locked)
        .map(|(position, _)| position);
    session.current_card_index = unlocked;
    if let Some(position) = unlocked {
        let card = &mut session.cards[position];
        card.status = CardStatus::Active;
        card.started_at = Some(at_ms);
    }

    let card = &session.cards[index];
    let transition = CardTransition {
        card_id: card.id,
        status: card.status,
        cumulative_total: card.cumulative_total,
        wagers_used: card.wagers_used,
        next_card_id: unlocked.map(|position| session.cards[position].id),
    };
    info!(
        card = transition.card_id,
        status = ?transition.status,
        cumulative_total = transition.cumulative_total,
        wagers_used = transition.wagers_used,
        next_card = ?transition.next_card_id,
        "card finished"
    );
    Some(transition)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(total_cards: u32, target: u64, max_wagers: u32) -> CardPlan {
        CardPlan {
            total_cards,
            target,
            max_wagers,
        }
    }

    fn active(target: i64, max_wagers: u32) -> Card {
        let mut card = Card::new(1, target, max_wagers);
        card.status = CardStatus::Active;
        card
    }

    #[test]
    fn test_start_session_activates_first_card() {
        let session = start_session(&plan(3, 100, 15), &SessionLimits::default(), 42);
        assert_eq!(session.cards.len(), 3);
        assert_eq!(session.current_card_index, Some(0));
        assert_eq!(session.cards[0].status, CardStatus::Active);
        assert_eq!(session.cards[0].started_at, Some(42));
        assert!(session.cards[1..]
            .iter()
            .all(|card| card.status == CardStatus::Locked && card.started_at.is_none()));
        assert_eq!(session.cards[2].id, 3);
        assert_eq!(session.bankroll, 1_000);
    }

    #[test]
    fn test_start_session_without_cards() {
        let session = start_session(&plan(0, 100, 15), &SessionLimits::default(), 0);
        assert!(session.cards.is_empty());
        assert_eq!(session.current_card_index, None);
    }

    #[test]
    fn test_card_completes_before_wager_limit() {
        // Ten wagers netting 105 against a target of 100.
        let mut card = active(100, 15);
        for pnl in [20, -10, 15, 10, 10, 20, -5, 15, 10, 20] {
            card = apply_resolution(&card, pnl);
        }
        assert_eq!(card.cumulative_total, 105);
        assert_eq!(card.wagers_used, 10);
        assert_eq!(card.status, CardStatus::Completed);
    }

    #[test]
    fn test_card_fails_on_last_wager() {
        let mut card = active(100, 5);
        for wager in 1..=5 {
            card = apply_resolution(&card, -20);
            if wager < 5 {
                assert_eq!(card.status, CardStatus::Active);
            }
        }
        assert_eq!(card.cumulative_total, -100);
        assert_eq!(card.status, CardStatus::Failed);
    }

    #[test]
    fn test_completion_beats_failure_on_final_wager() {
        let mut card = active(100, 2);
        card = apply_resolution(&card, 10);
        card = apply_resolution(&card, 90);
        assert_eq!(card.wagers_used, 2);
        assert_eq!(card.status, CardStatus::Completed);
    }

    #[test]
    fn test_terminal_and_locked_cards_are_untouched() {
        let mut card = active(10, 1);
        card = apply_resolution(&card, 50);
        assert_eq!(card.status, CardStatus::Completed);
        assert_eq!(apply_resolution(&card, -500), card);

        let locked = Card::new(2, 10, 1);
        assert_eq!(apply_resolution(&locked, 5), locked);
    }

    #[test]
    fn test_session_unlocks_next_card() {
        let mut session = start_session(&plan(2, 50, 3), &SessionLimits::default(), 0);
        let update = apply_to_session(&mut session, 50, 100, 50, 7);
        let transition = update.card.expect("card finished");
        assert_eq!(transition.card_id, 1);
        assert_eq!(transition.status, CardStatus::Completed);
        assert_eq!(transition.next_card_id, Some(2));
        assert_eq!(session.current_card_index, Some(1));
        assert_eq!(session.cards[1].status, CardStatus::Active);
        assert_eq!(session.cards[1].started_at, Some(7));
        assert_eq!(update.bankroll, 1_050);
        assert_eq!(update.net_result, 50);

        for _ in 0..3 {
            apply_to_session(&mut session, 10, 0, -10, 9);
        }
        assert_eq!(session.cards[1].status, CardStatus::Failed);
        assert_eq!(session.current_card_index, None);
        assert!(session.cards_finished());
        assert_eq!(session.completed_cards(), 1);

        // With every card finished only the bankroll moves.
        let update = apply_to_session(&mut session, 10, 20, 10, 10);
        assert_eq!(update.card, None);
        assert_eq!(session.cards[1].wagers_used, 3);
    }

    #[test]
    fn test_session_totals_and_stop_signals() {
        let limits = SessionLimits {
            bankroll: 500,
            stop_loss: Some(100),
            stop_profit: Some(200),
        };
        let mut session = start_session(&plan(0, 100, 15), &limits, 0);
        let update = apply_to_session(&mut session, 60, 0, -60, 1);
        assert!(!update.stop.any());
        let update = apply_to_session(&mut session, 40, 0, -40, 2);
        assert!(update.stop.stop_loss);
        assert_eq!(session.total_wagered, 100);
        assert_eq!(session.total_returned, 0);
        assert_eq!(session.bankroll, 400);

        // Advisory only: play continues.
        let update = apply_to_session(&mut session, 100, 400, 300, 3);
        assert!(update.stop.stop_profit);
        assert_eq!(update.net_result, 200);
    }
}

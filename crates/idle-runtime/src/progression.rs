//! Achievement ladder, promo objectives and the prestige gate.
//!
//! Every check here compares a threshold against the monotonic lifetime
//! total and flips a flag at most once, so evaluating repeatedly without a
//! state change yields nothing new.

use crate::notice::Notice;
use idle_core::{Achievement, GameConfig, GameState};
use tracing::info;

/// Mark newly satisfied achievements, returning them in threshold order.
pub fn evaluate_achievements(state: &mut GameState) -> Vec<Achievement> {
    let lifetime = state.lifetime_spent;
    let mut unlocked = Vec::new();
    for ach in state
        .achievements
        .iter_mut()
        .filter(|a| !a.achieved && lifetime >= a.threshold)
    {
        ach.achieved = true;
        unlocked.push(ach.clone());
    }
    unlocked
}

pub fn current_level(state: &GameState) -> usize {
    state.level()
}

/// Promo codes unlocked by this evaluation, as `(objective number, code)`.
pub fn evaluate_objectives(state: &mut GameState, cfg: &GameConfig) -> Vec<(usize, String)> {
    let [first, second] = cfg.promo_objectives;
    let mut unlocked = Vec::new();
    if !state.objectives.first_reached && state.lifetime_spent >= first {
        state.objectives.first_reached = true;
        unlocked.push((1, cfg.promo_codes[0].clone()));
    }
    if !state.objectives.second_reached && state.lifetime_spent >= second {
        state.objectives.second_reached = true;
        unlocked.push((2, cfg.promo_codes[1].clone()));
    }
    unlocked
}

/// Open the prestige gate once the requirement is met. Returns true on the
/// evaluation that opens it.
pub fn evaluate_prestige_gate(state: &mut GameState, cfg: &GameConfig) -> bool {
    if state.prestige_unlocked || state.lifetime_spent < cfg.prestige_requirement {
        return false;
    }
    state.prestige_unlocked = true;
    true
}

/// Run every progression check and collect the resulting notices.
pub fn evaluate(state: &mut GameState, cfg: &GameConfig) -> Vec<Notice> {
    let mut notices: Vec<Notice> = evaluate_achievements(state)
        .into_iter()
        .map(|a| {
            info!(level = a.id, label = %a.label, "achievement unlocked");
            Notice::AchievementUnlocked {
                level: a.id,
                label: a.label,
            }
        })
        .collect();
    for (objective, code) in evaluate_objectives(state, cfg) {
        info!(objective, "promo objective reached");
        notices.push(Notice::PromoCodeUnlocked { objective, code });
    }
    if evaluate_prestige_gate(state, cfg) {
        info!(lifetime = state.lifetime_spent, "prestige unlocked");
        notices.push(Notice::PrestigeAvailable);
    }
    notices
}

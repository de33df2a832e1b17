//! Manual and automatic production.

use idle_core::{GameConfig, GameState};
use idle_econ::{auto_yield, manual_yield};

/// Apply one manual action and return the units earned (always >= 1).
pub fn on_manual_action(state: &mut GameState, cfg: &GameConfig) -> u64 {
    let earned = manual_yield(state, cfg);
    state.credit(earned);
    state.total_clicks = state.total_clicks.saturating_add(1);
    state.clicks_since_mini_game = state.clicks_since_mini_game.saturating_add(1);
    earned
}

/// Apply one production tick. `None` means nothing was produced and the
/// state was not touched.
pub fn on_tick(state: &mut GameState) -> Option<u64> {
    let produced = auto_yield(state);
    if produced == 0 {
        return None;
    }
    state.credit(produced);
    Some(produced)
}

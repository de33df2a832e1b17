//! Prestige reset protocol.

use crate::error::GameError;
use idle_core::{GameConfig, GameState};

/// Units still to produce before prestige opens, 0 once it is open.
pub fn remaining_to_unlock(state: &GameState, cfg: &GameConfig) -> u64 {
    if state.prestige_unlocked {
        return 0;
    }
    cfg.prestige_requirement.saturating_sub(state.lifetime_spent)
}

/// Build the post-prestige state.
///
/// Everything returns to its initial value except the prestige multiplier,
/// which grows by `cfg.prestige_factor`, the mute preference and the
/// mini-game click counter.
pub fn prestige_reset(state: &GameState, cfg: &GameConfig) -> Result<GameState, GameError> {
    if !state.prestige_unlocked {
        return Err(GameError::NotUnlocked);
    }
    let mut next = GameState::new(cfg);
    next.prestige_multiplier = state.prestige_multiplier * cfg.prestige_factor;
    next.muted = state.muted;
    next.clicks_since_mini_game = state.clicks_since_mini_game;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use idle_core::{Campaign, UpgradeId};

    fn late_game(cfg: &GameConfig) -> GameState {
        let mut s = GameState::new(cfg);
        s.credit(60_000);
        s.total_clicks = 4_000;
        s.manual_rate = 12.0;
        s.auto_rate = 7.0;
        s.upgrade_prices.insert(UpgradeId::Atelier, 4_000);
        s.active_campaigns.insert(Campaign::Pub, true);
        s.objectives.first_reached = true;
        s.achievements.iter_mut().for_each(|a| a.achieved = true);
        s.prestige_unlocked = true;
        s.clicks_since_mini_game = 12;
        s.muted = true;
        s
    }

    #[test]
    fn locked_prestige_is_refused() {
        let cfg = GameConfig::default();
        let s = GameState::new(&cfg);
        assert_eq!(prestige_reset(&s, &cfg), Err(GameError::NotUnlocked));
        assert_eq!(remaining_to_unlock(&s, &cfg), 50_000);
    }

    #[test]
    fn first_prestige_resets_progress_but_not_the_multiplier() {
        let cfg = GameConfig::default();
        let s = late_game(&cfg);
        let next = prestige_reset(&s, &cfg).unwrap();
        assert_eq!(next.prestige_multiplier, 1.5);
        assert_eq!(next.lifetime_spent, 0);
        assert_eq!(next.currency, 0);
        assert_eq!(next.total_clicks, 0);
        assert_eq!(next.manual_rate, 1.0);
        assert_eq!(next.auto_rate, 0.0);
        assert_eq!(next.price(UpgradeId::Atelier), 50);
        assert!(!next.is_campaign_active(Campaign::Pub));
        assert!(!next.objectives.first_reached);
        assert!(!next.prestige_unlocked);
        assert!(next.achievements.iter().all(|a| !a.achieved));
        assert_eq!(next.achievements.len(), s.achievements.len());
        assert_eq!(next.clicks_since_mini_game, 12);
        assert!(next.muted);
    }

    #[test]
    fn multiplier_compounds() {
        let cfg = GameConfig::default();
        let mut s = late_game(&cfg);
        s.prestige_multiplier = 1.5;
        let next = prestige_reset(&s, &cfg).unwrap();
        assert_eq!(next.prestige_multiplier, 2.25);
        assert_eq!(remaining_to_unlock(&s, &cfg), 0);
    }
}

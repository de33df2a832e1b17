//! Tunable balance and timing parameters.

use crate::{Achievement, Campaign, EffectKind, UpgradeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// One rung of the achievement ladder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelSpec {
    pub threshold: u64,
    pub label: String,
}

/// An entry of the ephemeral event table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EphemeralSpec {
    pub kind: EffectKind,
    pub name: String,
    pub description: String,
    pub duration_secs: u32,
}

/// Game configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Achievement ladder, thresholds ascending.
    pub levels: Vec<LevelSpec>,
    /// Lifetime thresholds of the two promo objectives.
    pub promo_objectives: [u64; 2],
    /// Codes unlocked by the promo objectives.
    pub promo_codes: [String; 2],
    /// Lifetime production required to unlock prestige.
    pub prestige_requirement: u64,
    /// Factor applied to the prestige multiplier on each prestige (> 1).
    pub prestige_factor: f64,
    /// Interval of the automatic production tick.
    pub tick_interval_ms: u64,
    /// Interval of the ephemeral event roll.
    pub ephemeral_check_interval_ms: u64,
    /// Chance in [0, 1] that a roll starts an event.
    pub ephemeral_chance: f64,
    pub ephemeral_events: Vec<EphemeralSpec>,
    pub pub_duration_secs: u32,
    pub digital_duration_secs: u32,
    pub pub_multiplier: f64,
    pub digital_multiplier: f64,
    /// Chance in [0, 1] per click that a mini-game starts.
    pub mini_game_chance: f64,
    /// Clicks since the last mini-game that force one to start.
    pub mini_game_click_threshold: u32,
    pub frenzy_window_ms: u64,
    pub frenzy_reward_per_tap: u64,
    pub reflex_delay_min_ms: u64,
    pub reflex_delay_max_ms: u64,
    /// Reactions slower than this earn nothing.
    pub reflex_window_ms: u64,
    /// An armed reflex challenge closes with no reward after this long.
    pub reflex_timeout_ms: u64,
    pub daily_reward: u64,
    pub save_debounce_ms: u64,
    /// Balance at which an upgrade is shown in the shop. Absent means always shown.
    pub reveal_thresholds: BTreeMap<UpgradeId, u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        let levels = [
            (100, "Noob"),
            (1_000, "Casual"),
            (2_500, "Pro"),
            (5_000, "Expert"),
            (10_000, "Legend"),
            (20_000, "GOAT"),
        ]
        .into_iter()
        .map(|(threshold, label)| LevelSpec {
            threshold,
            label: label.to_string(),
        })
        .collect();
        let ephemeral_events = vec![
            EphemeralSpec {
                kind: EffectKind::DoubleManual,
                name: "Overdrive".into(),
                description: "doubles manual production for 25s".into(),
                duration_secs: 25,
            },
            EphemeralSpec {
                kind: EffectKind::DoubleAuto,
                name: "Creative frenzy".into(),
                description: "doubles automatic production for 20s".into(),
                duration_secs: 20,
            },
            EphemeralSpec {
                kind: EffectKind::DoubleAll,
                name: "Meltdown".into(),
                description: "x2 on everything for 15s".into(),
                duration_secs: 15,
            },
        ];
        Self {
            levels,
            promo_objectives: [20_000, 50_000],
            promo_codes: ["FACTORY10".into(), "FACTORYGOAT".into()],
            prestige_requirement: 50_000,
            prestige_factor: 1.5,
            tick_interval_ms: 1_000,
            ephemeral_check_interval_ms: 5_000,
            ephemeral_chance: 0.02,
            ephemeral_events,
            pub_duration_secs: 30,
            digital_duration_secs: 45,
            pub_multiplier: 1.5,
            digital_multiplier: 1.3,
            mini_game_chance: 0.01,
            mini_game_click_threshold: 50,
            frenzy_window_ms: 5_000,
            frenzy_reward_per_tap: 2,
            reflex_delay_min_ms: 1_000,
            reflex_delay_max_ms: 4_000,
            reflex_window_ms: 1_000,
            reflex_timeout_ms: 5_000,
            daily_reward: 500,
            save_debounce_ms: 300,
            reveal_thresholds: [
                (UpgradeId::Pub, 500),
                (UpgradeId::Digital, 1_000),
                (UpgradeId::Lab, 2_000),
                (UpgradeId::Staff, 3_000),
            ]
            .into_iter()
            .collect(),
        }
    }
}

impl GameConfig {
    /// Fresh (all unachieved) achievement list built from [`levels`](Self::levels).
    pub fn achievement_ladder(&self) -> Vec<Achievement> {
        self.levels
            .iter()
            .enumerate()
            .map(|(idx, l)| Achievement {
                id: idx as u32 + 1,
                threshold: l.threshold,
                label: l.label.clone(),
                achieved: false,
            })
            .collect()
    }

    pub fn campaign_duration_secs(&self, campaign: Campaign) -> u32 {
        match campaign {
            Campaign::Pub => self.pub_duration_secs,
            Campaign::Digital => self.digital_duration_secs,
        }
    }

    /// Manual-yield multiplier while `campaign` is running.
    pub fn campaign_multiplier(&self, campaign: Campaign) -> f64 {
        match campaign {
            Campaign::Pub => self.pub_multiplier,
            Campaign::Digital => self.digital_multiplier,
        }
    }

    pub fn reveal_threshold(&self, upgrade: UpgradeId) -> u64 {
        self.reveal_thresholds.get(&upgrade).copied().unwrap_or(0)
    }
}

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Achievement thresholds must be strictly ascending. Carries the index of
    /// the first level whose threshold does not exceed its predecessor's.
    #[error("level thresholds must be strictly ascending (at index {0})")]
    UnsortedLevels(usize),
    /// Promo objectives must be ascending.
    #[error("promo objectives must be ascending")]
    UnsortedObjectives,
    /// Probability outside [0, 1] or not finite.
    #[error("{0} must be a probability in [0, 1]")]
    InvalidProbability(&'static str),
    /// Multiplier must be finite and >= 1.
    #[error("{0} must be a finite multiplier >= 1")]
    InvalidMultiplier(&'static str),
    /// Timer intervals and durations must be non-zero.
    #[error("{0} must be > 0")]
    ZeroDuration(&'static str),
    /// Reflex delay range is empty.
    #[error("reflex delay range is empty")]
    EmptyDelayRange,
}

fn check_probability(value: f64, name: &'static str) -> Result<(), ValidationError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::InvalidProbability(name));
    }
    Ok(())
}

fn check_multiplier(value: f64, name: &'static str) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 1.0 {
        return Err(ValidationError::InvalidMultiplier(name));
    }
    Ok(())
}

/// Validate a configuration before building an engine from it.
pub fn validate_config(cfg: &GameConfig) -> Result<(), ValidationError> {
    for (idx, pair) in cfg.levels.windows(2).enumerate() {
        if pair[0].threshold >= pair[1].threshold {
            return Err(ValidationError::UnsortedLevels(idx + 1));
        }
    }
    if cfg.promo_objectives[0] > cfg.promo_objectives[1] {
        return Err(ValidationError::UnsortedObjectives);
    }
    check_probability(cfg.ephemeral_chance, "ephemeral_chance")?;
    check_probability(cfg.mini_game_chance, "mini_game_chance")?;
    check_multiplier(cfg.pub_multiplier, "pub_multiplier")?;
    check_multiplier(cfg.digital_multiplier, "digital_multiplier")?;
    if !cfg.prestige_factor.is_finite() || cfg.prestige_factor <= 1.0 {
        return Err(ValidationError::InvalidMultiplier("prestige_factor"));
    }
    let durations = [
        (cfg.tick_interval_ms, "tick_interval_ms"),
        (cfg.ephemeral_check_interval_ms, "ephemeral_check_interval_ms"),
        (u64::from(cfg.pub_duration_secs), "pub_duration_secs"),
        (u64::from(cfg.digital_duration_secs), "digital_duration_secs"),
        (cfg.frenzy_window_ms, "frenzy_window_ms"),
        (cfg.reflex_window_ms, "reflex_window_ms"),
        (cfg.reflex_timeout_ms, "reflex_timeout_ms"),
    ];
    for (value, name) in durations {
        if value == 0 {
            return Err(ValidationError::ZeroDuration(name));
        }
    }
    if cfg
        .ephemeral_events
        .iter()
        .any(|e| e.duration_secs == 0)
    {
        return Err(ValidationError::ZeroDuration("ephemeral_events.duration_secs"));
    }
    if cfg.reflex_delay_min_ms > cfg.reflex_delay_max_ms {
        return Err(ValidationError::EmptyDelayRange);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&GameConfig::default()), Ok(()));
    }

    #[test]
    fn ladder_is_one_based() {
        let ladder = GameConfig::default().achievement_ladder();
        assert_eq!(ladder[0].id, 1);
        assert_eq!(ladder[0].threshold, 100);
        assert_eq!(ladder[5].threshold, 20_000);
        assert_eq!(ladder[5].label, "GOAT");
    }

    #[test]
    fn unsorted_levels_rejected() {
        let mut cfg = GameConfig::default();
        cfg.levels.swap(1, 2);
        // [100, 2500, 1000, ...]: 1000 at index 2 is the first step down
        assert_eq!(
            validate_config(&cfg),
            Err(ValidationError::UnsortedLevels(2))
        );
        let mut cfg = GameConfig::default();
        cfg.levels[1].threshold = 100;
        assert_eq!(
            validate_config(&cfg),
            Err(ValidationError::UnsortedLevels(1))
        );
    }

    #[test]
    fn prestige_factor_must_grow() {
        let mut cfg = GameConfig::default();
        cfg.prestige_factor = 1.0;
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn zero_tick_rejected() {
        let mut cfg = GameConfig::default();
        cfg.tick_interval_ms = 0;
        assert_eq!(
            validate_config(&cfg),
            Err(ValidationError::ZeroDuration("tick_interval_ms"))
        );
    }

    #[test]
    fn yaml_style_partial_config_uses_defaults() {
        let cfg: GameConfig =
            serde_json::from_str(r#"{"daily_reward": 1000, "ephemeral_chance": 0.5}"#).unwrap();
        assert_eq!(cfg.daily_reward, 1_000);
        assert_eq!(cfg.ephemeral_chance, 0.5);
        assert_eq!(cfg.prestige_requirement, 50_000);
        assert_eq!(cfg.reveal_threshold(UpgradeId::Lab), 2_000);
        assert_eq!(cfg.reveal_threshold(UpgradeId::Atelier), 0);
    }

    proptest! {
        #[test]
        fn probabilities_in_range_accepted(p in 0.0f64..=1.0) {
            let mut cfg = GameConfig::default();
            cfg.ephemeral_chance = p;
            cfg.mini_game_chance = p;
            prop_assert!(validate_config(&cfg).is_ok());
        }

        #[test]
        fn probabilities_above_one_rejected(p in 1.0001f64..100.0) {
            let mut cfg = GameConfig::default();
            cfg.mini_game_chance = p;
            prop_assert_eq!(
                validate_config(&cfg),
                Err(ValidationError::InvalidProbability("mini_game_chance"))
            );
        }
    }
}

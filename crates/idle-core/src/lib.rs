#![deny(warnings)]

//! Core domain model for the idle factory game.
//!
//! This crate defines the single serializable [`GameState`] root, the
//! identifiers shared by every subsystem and the tunable [`GameConfig`].
//! It holds no timing or randomness: those live in `idle-runtime`.

mod config;

pub use config::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Purchasable upgrades, in shop order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeId {
    /// Workshop extension: +1 per click.
    Atelier,
    /// Automatic machine: +1 per second.
    Machine,
    /// Advertising campaign (timed manual boost).
    Pub,
    /// Digital campaign (timed manual boost).
    Digital,
    /// R&D lab: +2 per click.
    Lab,
    /// Hiring: +1 per second.
    Staff,
}

impl UpgradeId {
    /// All upgrades in shop order.
    pub fn all() -> &'static [UpgradeId] {
        &[
            UpgradeId::Atelier,
            UpgradeId::Machine,
            UpgradeId::Pub,
            UpgradeId::Digital,
            UpgradeId::Lab,
            UpgradeId::Staff,
        ]
    }

    /// Stable lowercase identifier used in input bindings and saves.
    pub fn key(&self) -> &'static str {
        match self {
            UpgradeId::Atelier => "atelier",
            UpgradeId::Machine => "machine",
            UpgradeId::Pub => "pub",
            UpgradeId::Digital => "digital",
            UpgradeId::Lab => "lab",
            UpgradeId::Staff => "staff",
        }
    }

    /// Look up an upgrade by its [`key`](Self::key).
    pub fn from_key(key: &str) -> Option<UpgradeId> {
        UpgradeId::all().iter().copied().find(|u| u.key() == key)
    }

    /// Price of the first purchase.
    pub fn base_price(&self) -> u64 {
        match self {
            UpgradeId::Atelier => 50,
            UpgradeId::Machine => 200,
            UpgradeId::Pub => 300,
            UpgradeId::Digital => 500,
            UpgradeId::Lab => 800,
            UpgradeId::Staff => 1_000,
        }
    }

    /// The campaign this upgrade toggles, for toggle-type upgrades.
    pub fn campaign(&self) -> Option<Campaign> {
        match self {
            UpgradeId::Pub => Some(Campaign::Pub),
            UpgradeId::Digital => Some(Campaign::Digital),
            _ => None,
        }
    }
}

/// Timed campaign flags bought from the shop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Campaign {
    Pub,
    Digital,
}

impl Campaign {
    pub fn all() -> &'static [Campaign] {
        &[Campaign::Pub, Campaign::Digital]
    }

    /// The shop upgrade that starts this campaign.
    pub fn upgrade(&self) -> UpgradeId {
        match self {
            Campaign::Pub => UpgradeId::Pub,
            Campaign::Digital => UpgradeId::Digital,
        }
    }
}

/// Production channel a multiplier applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    Manual,
    Auto,
}

/// Kinds of ephemeral (randomly rolled) events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectKind {
    DoubleManual,
    DoubleAuto,
    DoubleAll,
}

impl EffectKind {
    /// Multiplier this kind applies on `channel`.
    pub fn multiplier_for(&self, channel: Channel) -> f64 {
        match (self, channel) {
            (EffectKind::DoubleManual, Channel::Manual) => 2.0,
            (EffectKind::DoubleAuto, Channel::Auto) => 2.0,
            (EffectKind::DoubleAll, _) => 2.0,
            _ => 1.0,
        }
    }
}

/// Descriptor of a running ephemeral event, persisted with the state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EphemeralEffect {
    pub kind: EffectKind,
    pub name: String,
    pub description: String,
    pub duration_secs: u32,
}

impl EphemeralEffect {
    pub fn multiplier_for(&self, channel: Channel) -> f64 {
        self.kind.multiplier_for(channel)
    }
}

/// A level of the achievement ladder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    /// 1-based position in the ladder.
    pub id: u32,
    /// Lifetime production required.
    pub threshold: u64,
    pub label: String,
    /// Flips false -> true once, never back (except on prestige/reset).
    pub achieved: bool,
}

/// One-shot promo objective gates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveFlags {
    pub first_reached: bool,
    pub second_reached: bool,
}

/// The whole game state, persisted as a single JSON document.
///
/// Unknown fields are ignored and missing fields take their default values
/// when a snapshot is decoded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameState {
    /// Spendable balance.
    pub currency: u64,
    /// Cumulative production; the only progression metric.
    pub lifetime_spent: u64,
    pub total_clicks: u64,
    /// Base yield per click (>= 1).
    pub manual_rate: f64,
    /// Base yield per tick (>= 0).
    pub auto_rate: f64,
    /// Permanent multiplier carried across prestige resets (>= 1).
    pub prestige_multiplier: f64,
    pub upgrade_prices: BTreeMap<UpgradeId, u64>,
    pub active_campaigns: BTreeMap<Campaign, bool>,
    pub active_effect: Option<EphemeralEffect>,
    pub achievements: Vec<Achievement>,
    pub objectives: ObjectiveFlags,
    pub prestige_unlocked: bool,
    /// Manual actions since the last mini-game trigger.
    pub clicks_since_mini_game: u32,
    pub muted: bool,
}

impl GameState {
    /// Fresh state for the given configuration.
    pub fn new(config: &GameConfig) -> Self {
        Self {
            currency: 0,
            lifetime_spent: 0,
            total_clicks: 0,
            manual_rate: 1.0,
            auto_rate: 0.0,
            prestige_multiplier: 1.0,
            upgrade_prices: base_prices(),
            active_campaigns: Campaign::all().iter().map(|c| (*c, false)).collect(),
            active_effect: None,
            achievements: config.achievement_ladder(),
            objectives: ObjectiveFlags::default(),
            prestige_unlocked: false,
            clicks_since_mini_game: 0,
            muted: false,
        }
    }

    /// Current price of `upgrade`, falling back to its base price.
    pub fn price(&self, upgrade: UpgradeId) -> u64 {
        self.upgrade_prices
            .get(&upgrade)
            .copied()
            .unwrap_or_else(|| upgrade.base_price())
    }

    pub fn is_campaign_active(&self, campaign: Campaign) -> bool {
        self.active_campaigns.get(&campaign).copied().unwrap_or(false)
    }

    /// Add produced or awarded units to both the balance and the lifetime total.
    pub fn credit(&mut self, amount: u64) {
        self.currency = self.currency.saturating_add(amount);
        self.lifetime_spent = self.lifetime_spent.saturating_add(amount);
    }

    /// Number of achievements satisfied contiguously from the start of the ladder.
    pub fn level(&self) -> usize {
        self.achievements
            .iter()
            .take_while(|a| self.lifetime_spent >= a.threshold)
            .count()
    }

    /// Clamp fields that a hand-edited or partial snapshot may have pushed out
    /// of range, and rebuild the achievement ladder from `config`.
    pub fn normalize(&mut self, config: &GameConfig) {
        if !self.manual_rate.is_finite() || self.manual_rate < 1.0 {
            self.manual_rate = 1.0;
        }
        if !self.auto_rate.is_finite() || self.auto_rate < 0.0 {
            self.auto_rate = 0.0;
        }
        if !self.prestige_multiplier.is_finite() || self.prestige_multiplier < 1.0 {
            self.prestige_multiplier = 1.0;
        }
        for upgrade in UpgradeId::all() {
            let price = self.price(*upgrade).max(upgrade.base_price());
            self.upgrade_prices.insert(*upgrade, price);
        }
        for campaign in Campaign::all() {
            self.active_campaigns.entry(*campaign).or_insert(false);
        }
        let saved: BTreeMap<u32, bool> = self
            .achievements
            .iter()
            .map(|a| (a.id, a.achieved))
            .collect();
        self.achievements = config.achievement_ladder();
        for a in &mut self.achievements {
            a.achieved = saved.get(&a.id).copied().unwrap_or(false);
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(&GameConfig::default())
    }
}

/// Base price of every upgrade.
pub fn base_prices() -> BTreeMap<UpgradeId, u64> {
    UpgradeId::all()
        .iter()
        .map(|u| (*u, u.base_price()))
        .collect()
}

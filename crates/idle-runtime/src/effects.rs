//! Timed effect registry: campaign flags and the ephemeral event.
//!
//! Each running effect owns exactly one expiry timer. Restarting a flag
//! replaces its timer instead of stacking a second one.

use crate::scheduler::{Scheduler, TimerId};
use crate::TimerEvent;
use idle_core::{Campaign, EphemeralEffect, GameConfig, GameState};
use rand::Rng;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct EffectRegistry {
    campaign_timers: BTreeMap<Campaign, TimerId>,
    ephemeral_timer: Option<TimerId>,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise `campaign` and (re)arm its expiry `duration_secs` from now.
    pub fn start_timed_flag(
        &mut self,
        state: &mut GameState,
        scheduler: &mut Scheduler<TimerEvent>,
        campaign: Campaign,
        duration_secs: u32,
    ) {
        if let Some(old) = self.campaign_timers.remove(&campaign) {
            scheduler.cancel(old);
        }
        state.active_campaigns.insert(campaign, true);
        let id = scheduler.schedule(
            u64::from(duration_secs) * 1_000,
            TimerEvent::CampaignExpired(campaign),
        );
        self.campaign_timers.insert(campaign, id);
        debug!(?campaign, duration_secs, "campaign started");
    }

    /// Lower `campaign`. Returns whether it was running.
    pub fn expire_flag(&mut self, state: &mut GameState, campaign: Campaign) -> bool {
        self.campaign_timers.remove(&campaign);
        let was_active = state.is_campaign_active(campaign);
        state.active_campaigns.insert(campaign, false);
        was_active
    }

    /// Start `effect` unless one is already running.
    pub fn start_ephemeral_effect(
        &mut self,
        state: &mut GameState,
        scheduler: &mut Scheduler<TimerEvent>,
        effect: EphemeralEffect,
    ) -> bool {
        if state.active_effect.is_some() {
            return false;
        }
        let delay_ms = u64::from(effect.duration_secs) * 1_000;
        debug!(kind = ?effect.kind, delay_ms, "ephemeral effect started");
        state.active_effect = Some(effect);
        self.ephemeral_timer = Some(scheduler.schedule(delay_ms, TimerEvent::EphemeralExpired));
        true
    }

    /// Clear the running ephemeral effect, returning it.
    pub fn expire_ephemeral(&mut self, state: &mut GameState) -> Option<EphemeralEffect> {
        self.ephemeral_timer = None;
        state.active_effect.take()
    }

    /// Arm fresh expiry timers for effects found active in a restored state.
    pub fn rearm(
        &mut self,
        state: &mut GameState,
        scheduler: &mut Scheduler<TimerEvent>,
        cfg: &GameConfig,
    ) {
        for campaign in Campaign::all() {
            if state.is_campaign_active(*campaign) {
                let secs = cfg.campaign_duration_secs(*campaign);
                self.start_timed_flag(state, scheduler, *campaign, secs);
            }
        }
        if let Some(effect) = state.active_effect.take() {
            self.start_ephemeral_effect(state, scheduler, effect);
        }
    }

    /// Cancel every expiry timer. Flags in the state are left as they are.
    pub fn cancel_all(&mut self, scheduler: &mut Scheduler<TimerEvent>) {
        for (_, id) in std::mem::take(&mut self.campaign_timers) {
            scheduler.cancel(id);
        }
        if let Some(id) = self.ephemeral_timer.take() {
            scheduler.cancel(id);
        }
    }
}

/// Roll the ephemeral event table once.
pub fn roll_ephemeral<R: Rng>(rng: &mut R, cfg: &GameConfig) -> Option<EphemeralEffect> {
    if cfg.ephemeral_events.is_empty() || rng.gen::<f64>() >= cfg.ephemeral_chance {
        return None;
    }
    let spec = &cfg.ephemeral_events[rng.gen_range(0..cfg.ephemeral_events.len())];
    Some(EphemeralEffect {
        kind: spec.kind,
        name: spec.name.clone(),
        description: spec.description.clone(),
        duration_secs: spec.duration_secs,
    })
}

use crate::effects::{roll_ephemeral, EffectRegistry};
use crate::error::GameError;
use crate::minigame::{MiniGameEngine, MiniGameKind, MiniGameResult};
use crate::notice::Notice;
use crate::scheduler::{Scheduler, TimerId};
use crate::{prestige, production, progression, TimerEvent};
use chrono::NaiveDate;
use idle_core::{validate_config, EphemeralEffect, GameConfig, GameState, UpgradeId, ValidationError};
use idle_econ::{EconError, Purchase, UpgradeEffect};
use persistence::{ClaimLedger, Store};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

/// The game engine: single owner and writer of the state.
pub struct Engine<S: Store> {
    config: GameConfig,
    state: GameState,
    scheduler: Scheduler<TimerEvent>,
    effects: EffectRegistry,
    mini_games: MiniGameEngine,
    rng: ChaCha8Rng,
    store: S,
    visible: bool,
    tick_timer: Option<TimerId>,
    roll_timer: Option<TimerId>,
    save_timer: Option<TimerId>,
    notices: Vec<Notice>,
    refresh_requests: u64,
}

impl<S: Store> Engine<S> {
    /// Build an engine, restoring the saved game from `store` when one exists.
    ///
    /// The engine starts visible with both intervals running.
    pub fn new(config: GameConfig, store: S, seed: u64) -> Result<Self, ValidationError> {
        validate_config(&config)?;
        let state = persistence::load_state(&store, &config)
            .unwrap_or_else(|| GameState::new(&config));
        let mut engine = Self {
            config,
            state,
            scheduler: Scheduler::new(),
            effects: EffectRegistry::new(),
            mini_games: MiniGameEngine::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            store,
            visible: true,
            tick_timer: None,
            roll_timer: None,
            save_timer: None,
            notices: Vec::new(),
            refresh_requests: 0,
        };
        engine
            .effects
            .rearm(&mut engine.state, &mut engine.scheduler, &engine.config);
        let restored = progression::evaluate(&mut engine.state, &engine.config);
        engine.notices.extend(restored);
        engine.start_intervals();
        engine.refresh_requests += 1;
        info!(
            seed,
            lifetime = engine.state.lifetime_spent,
            prestige = engine.state.prestige_multiplier,
            "engine ready"
        );
        Ok(engine)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current virtual time.
    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    pub fn level(&self) -> usize {
        progression::current_level(&self.state)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn active_mini_game(&self) -> Option<MiniGameKind> {
        self.mini_games.active_kind()
    }

    /// Take the queued notices, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Number of display refreshes requested since the last call.
    pub fn take_refresh_requests(&mut self) -> u64 {
        std::mem::take(&mut self.refresh_requests)
    }

    pub fn price_of(&self, upgrade: UpgradeId) -> u64 {
        idle_econ::price_of(&self.state, upgrade)
    }

    pub fn can_afford(&self, upgrade: UpgradeId) -> bool {
        idle_econ::can_afford(&self.state, upgrade)
    }

    /// Whether the shop should show `upgrade` at the current balance.
    pub fn is_revealed(&self, upgrade: UpgradeId) -> bool {
        self.state.currency >= self.config.reveal_threshold(upgrade)
    }

    /// Automatic production per tick at the current rates.
    pub fn auto_rate_per_tick(&self) -> u64 {
        idle_econ::auto_yield(&self.state)
    }

    pub fn daily_reward_available(&self, today: NaiveDate) -> bool {
        !self.store.has_claimed_on(today)
    }

    /// One manual action. Returns the units earned (always >= 1).
    pub fn click(&mut self) -> u64 {
        let earned = production::on_manual_action(&mut self.state, &self.config);
        debug!(earned, clicks = self.state.total_clicks, "manual action");
        self.after_mutation();

        let now = self.scheduler.now_ms();
        if let Some(result) = self
            .mini_games
            .on_click(now, &self.config, &mut self.scheduler)
        {
            self.award_mini_game(result);
        }

        if self
            .mini_games
            .should_trigger(&self.state, &self.config, &mut self.rng)
        {
            self.state.clicks_since_mini_game = 0;
            let kind = MiniGameEngine::choose_kind(&mut self.rng);
            self.start_mini_game(kind);
        }
        earned
    }

    /// Buy one level of `upgrade`.
    pub fn buy(&mut self, upgrade: UpgradeId) -> Result<Purchase, GameError> {
        let purchase = match idle_econ::apply_purchase(&mut self.state, upgrade) {
            Ok(p) => p,
            Err(e) => {
                let notice = match &e {
                    EconError::InsufficientFunds { price, .. } => Notice::InsufficientFunds {
                        upgrade,
                        price: *price,
                    },
                    EconError::AlreadyActive(u) => Notice::AlreadyActive(*u),
                };
                debug!(error = %e, "purchase refused");
                self.notices.push(notice);
                self.refresh_requests += 1;
                return Err(e.into());
            }
        };
        match purchase.effect {
            UpgradeEffect::Campaign(campaign) => {
                let duration_secs = self.config.campaign_duration_secs(campaign);
                self.effects.start_timed_flag(
                    &mut self.state,
                    &mut self.scheduler,
                    campaign,
                    duration_secs,
                );
                self.notices.push(Notice::CampaignStarted {
                    campaign,
                    duration_secs,
                });
            }
            UpgradeEffect::ManualRate(_) | UpgradeEffect::AutoRate(_) => {
                self.notices.push(Notice::Purchased(upgrade));
            }
        }
        self.after_mutation();
        Ok(purchase)
    }

    /// Reset progress in exchange for a permanent multiplier. Confirmation is
    /// the caller's job. Returns the new multiplier.
    pub fn activate_prestige(&mut self) -> Result<f64, GameError> {
        let next = match prestige::prestige_reset(&self.state, &self.config) {
            Ok(next) => next,
            Err(e) => {
                let remaining = prestige::remaining_to_unlock(&self.state, &self.config);
                self.notices.push(Notice::PrestigeLocked { remaining });
                self.refresh_requests += 1;
                return Err(e);
            }
        };
        self.effects.cancel_all(&mut self.scheduler);
        self.mini_games.cancel(&mut self.scheduler);
        self.state = next;
        let multiplier = self.state.prestige_multiplier;
        info!(multiplier, "prestige activated");
        self.notices.push(Notice::PrestigeActivated { multiplier });
        self.after_mutation();
        Ok(multiplier)
    }

    /// Grant the daily reward unless `today` was already claimed.
    pub fn claim_daily_reward(&mut self, today: NaiveDate) -> Result<u64, GameError> {
        if self.store.has_claimed_on(today) {
            self.notices.push(Notice::DailyRewardAlreadyClaimed);
            self.refresh_requests += 1;
            return Err(GameError::AlreadyClaimed);
        }
        let amount = self.config.daily_reward;
        self.state.credit(amount);
        if let Err(e) = self.store.record_claim(today) {
            warn!(error = %e, "could not record daily claim");
        }
        info!(%today, amount, "daily reward claimed");
        self.notices.push(Notice::DailyRewardClaimed { amount });
        self.after_mutation();
        Ok(amount)
    }

    /// Start an ephemeral event now. Refused while another one runs.
    pub fn start_ephemeral_effect(&mut self, effect: EphemeralEffect) -> bool {
        let notice = Notice::EventStarted {
            name: effect.name.clone(),
            description: effect.description.clone(),
        };
        if !self
            .effects
            .start_ephemeral_effect(&mut self.state, &mut self.scheduler, effect)
        {
            return false;
        }
        self.notices.push(notice);
        self.after_mutation();
        true
    }

    /// Start a mini-game now. Refused while another one runs.
    pub fn start_mini_game(&mut self, kind: MiniGameKind) -> bool {
        if !self
            .mini_games
            .start(kind, &self.config, &mut self.rng, &mut self.scheduler)
        {
            return false;
        }
        self.notices.push(Notice::MiniGameStarted(kind));
        self.refresh_requests += 1;
        true
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.state.muted = !self.state.muted;
        self.notices.push(Notice::MuteToggled(self.state.muted));
        self.after_mutation();
        self.state.muted
    }

    /// Wipe everything, including the prestige multiplier, the stored save
    /// and the daily claim record.
    pub fn reset(&mut self) {
        self.scheduler.clear();
        self.tick_timer = None;
        self.roll_timer = None;
        self.save_timer = None;
        self.effects = EffectRegistry::new();
        self.mini_games = MiniGameEngine::new();
        persistence::wipe(&mut self.store);
        self.state = GameState::new(&self.config);
        if self.visible {
            self.start_intervals();
        }
        info!("game reset");
        self.notices.push(Notice::GameReset);
        self.after_mutation();
    }

    /// Pause (hidden) or resume (visible) background production and the
    /// event roll. Elapsed hidden time is not caught up.
    pub fn set_visible(&mut self, visible: bool) {
        if visible == self.visible {
            return;
        }
        self.visible = visible;
        if visible {
            self.start_intervals();
        } else {
            self.stop_intervals();
        }
        debug!(visible, "visibility changed");
    }

    /// Advance the clock by `ms`, firing every timer that falls due.
    pub fn advance(&mut self, ms: u64) {
        let target = self.scheduler.now_ms().saturating_add(ms);
        while let Some((_, event)) = self.scheduler.pop_due(target) {
            self.dispatch(event);
        }
        self.scheduler.advance_to(target);
    }

    /// Write the snapshot now, cancelling any pending debounced write.
    pub fn flush(&mut self) {
        if let Some(id) = self.save_timer.take() {
            self.scheduler.cancel(id);
        }
        persistence::save_state(&mut self.store, &self.state);
    }

    /// Flush and hand back the store.
    pub fn shutdown(mut self) -> S {
        self.flush();
        self.store
    }

    fn dispatch(&mut self, event: TimerEvent) {
        debug!(?event, now = self.scheduler.now_ms(), "timer fired");
        match event {
            TimerEvent::ProductionTick => {
                self.tick_timer = Some(
                    self.scheduler
                        .schedule(self.config.tick_interval_ms, TimerEvent::ProductionTick),
                );
                if production::on_tick(&mut self.state).is_some() {
                    self.after_mutation();
                }
            }
            TimerEvent::EphemeralRoll => {
                self.roll_timer = Some(self.scheduler.schedule(
                    self.config.ephemeral_check_interval_ms,
                    TimerEvent::EphemeralRoll,
                ));
                if self.state.active_effect.is_none() {
                    if let Some(effect) = roll_ephemeral(&mut self.rng, &self.config) {
                        self.start_ephemeral_effect(effect);
                    }
                }
            }
            TimerEvent::CampaignExpired(campaign) => {
                if self.effects.expire_flag(&mut self.state, campaign) {
                    self.notices.push(Notice::CampaignEnded(campaign));
                    self.after_mutation();
                }
            }
            TimerEvent::EphemeralExpired => {
                if let Some(effect) = self.effects.expire_ephemeral(&mut self.state) {
                    self.notices.push(Notice::EventEnded { name: effect.name });
                    self.after_mutation();
                }
            }
            TimerEvent::FrenzyClosed => {
                if let Some(result) = self.mini_games.close_frenzy(&self.config) {
                    self.award_mini_game(result);
                }
            }
            TimerEvent::ReflexGo => {
                let now = self.scheduler.now_ms();
                if self
                    .mini_games
                    .arm_reflex(now, &self.config, &mut self.scheduler)
                {
                    self.notices.push(Notice::ReflexGo);
                    self.refresh_requests += 1;
                }
            }
            TimerEvent::ReflexTimeout => {
                if let Some(result) = self.mini_games.expire_reflex() {
                    self.award_mini_game(result);
                }
            }
            TimerEvent::FlushSave => {
                self.save_timer = None;
                persistence::save_state(&mut self.store, &self.state);
            }
        }
    }

    fn award_mini_game(&mut self, result: MiniGameResult) {
        self.state.credit(result.reward());
        self.notices.push(match result {
            MiniGameResult::TapFrenzy { taps, reward } => Notice::FrenzyResult { taps, reward },
            MiniGameResult::Reflex {
                reward,
                reaction_ms,
            } => Notice::ReflexResult {
                reward,
                reaction_ms,
            },
        });
        self.after_mutation();
    }

    /// Re-evaluate progression, request a refresh and a debounced save.
    fn after_mutation(&mut self) {
        let unlocked = progression::evaluate(&mut self.state, &self.config);
        self.notices.extend(unlocked);
        self.refresh_requests += 1;
        if let Some(id) = self.save_timer.take() {
            self.scheduler.cancel(id);
        }
        self.save_timer = Some(
            self.scheduler
                .schedule(self.config.save_debounce_ms, TimerEvent::FlushSave),
        );
    }

    fn start_intervals(&mut self) {
        self.stop_intervals();
        self.tick_timer = Some(
            self.scheduler
                .schedule(self.config.tick_interval_ms, TimerEvent::ProductionTick),
        );
        self.roll_timer = Some(self.scheduler.schedule(
            self.config.ephemeral_check_interval_ms,
            TimerEvent::EphemeralRoll,
        ));
    }

    fn stop_intervals(&mut self) {
        for id in [self.tick_timer.take(), self.roll_timer.take()]
            .into_iter()
            .flatten()
        {
            self.scheduler.cancel(id);
        }
    }
}

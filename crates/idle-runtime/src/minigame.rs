//! Short skill challenges: tap frenzy and reflex.
//!
//! At most one challenge runs at a time; while one runs, the trigger check
//! is skipped entirely.

use crate::scheduler::{Scheduler, TimerId};
use crate::TimerEvent;
use idle_core::{GameConfig, GameState};
use rand::Rng;
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MiniGameKind {
    TapFrenzy,
    Reflex,
}

/// A running challenge and the timer driving its next transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MiniGame {
    TapFrenzy { taps: u32, closes: TimerId },
    /// Waiting for the random "go" delay; clicks are ignored.
    ReflexWaiting { go: TimerId },
    /// "Go" was signalled at `go_at_ms`; the next click resolves it.
    ReflexArmed { go_at_ms: u64, timeout: TimerId },
}

/// Final result of a challenge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MiniGameResult {
    TapFrenzy { taps: u32, reward: u64 },
    /// `reaction_ms` is `None` when the challenge timed out.
    Reflex { reward: u64, reaction_ms: Option<u64> },
}

impl MiniGameResult {
    pub fn reward(&self) -> u64 {
        match self {
            MiniGameResult::TapFrenzy { reward, .. } | MiniGameResult::Reflex { reward, .. } => {
                *reward
            }
        }
    }
}

/// `taps * reward_per_tap`.
pub fn frenzy_reward(taps: u32, cfg: &GameConfig) -> u64 {
    u64::from(taps).saturating_mul(cfg.frenzy_reward_per_tap)
}

/// `max(0, floor((window - elapsed) / 10))`.
pub fn reflex_reward(elapsed_ms: u64, cfg: &GameConfig) -> u64 {
    cfg.reflex_window_ms.saturating_sub(elapsed_ms) / 10
}

#[derive(Debug, Default)]
pub struct MiniGameEngine {
    active: Option<MiniGame>,
}

impl MiniGameEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_kind(&self) -> Option<MiniGameKind> {
        self.active.map(|g| match g {
            MiniGame::TapFrenzy { .. } => MiniGameKind::TapFrenzy,
            MiniGame::ReflexWaiting { .. } | MiniGame::ReflexArmed { .. } => MiniGameKind::Reflex,
        })
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Whether a challenge should start after a manual action: a low-probability
    /// roll, or the click counter reaching its threshold.
    pub fn should_trigger<R: Rng>(&self, state: &GameState, cfg: &GameConfig, rng: &mut R) -> bool {
        if self.is_running() {
            return false;
        }
        let lucky = rng.gen::<f64>() < cfg.mini_game_chance;
        lucky || state.clicks_since_mini_game >= cfg.mini_game_click_threshold
    }

    /// Uniform choice between the two challenges.
    pub fn choose_kind<R: Rng>(rng: &mut R) -> MiniGameKind {
        if rng.gen_bool(0.5) {
            MiniGameKind::TapFrenzy
        } else {
            MiniGameKind::Reflex
        }
    }

    /// Start `kind`. Refused (false) while another challenge runs.
    pub fn start<R: Rng>(
        &mut self,
        kind: MiniGameKind,
        cfg: &GameConfig,
        rng: &mut R,
        scheduler: &mut Scheduler<TimerEvent>,
    ) -> bool {
        if self.is_running() {
            return false;
        }
        let game = match kind {
            MiniGameKind::TapFrenzy => MiniGame::TapFrenzy {
                taps: 0,
                closes: scheduler.schedule(cfg.frenzy_window_ms, TimerEvent::FrenzyClosed),
            },
            MiniGameKind::Reflex => {
                let delay = if cfg.reflex_delay_min_ms < cfg.reflex_delay_max_ms {
                    rng.gen_range(cfg.reflex_delay_min_ms..cfg.reflex_delay_max_ms)
                } else {
                    cfg.reflex_delay_min_ms
                };
                MiniGame::ReflexWaiting {
                    go: scheduler.schedule(delay, TimerEvent::ReflexGo),
                }
            }
        };
        info!(?kind, "mini-game started");
        self.active = Some(game);
        true
    }

    /// Feed a manual action to the running challenge.
    pub fn on_click(
        &mut self,
        now_ms: u64,
        cfg: &GameConfig,
        scheduler: &mut Scheduler<TimerEvent>,
    ) -> Option<MiniGameResult> {
        if let Some(MiniGame::TapFrenzy { taps, .. }) = &mut self.active {
            *taps = taps.saturating_add(1);
            return None;
        }
        let (go_at_ms, timeout) = match self.active {
            Some(MiniGame::ReflexArmed { go_at_ms, timeout }) => (go_at_ms, timeout),
            _ => return None,
        };
        scheduler.cancel(timeout);
        self.active = None;
        let elapsed = now_ms.saturating_sub(go_at_ms);
        let result = MiniGameResult::Reflex {
            reward: reflex_reward(elapsed, cfg),
            reaction_ms: Some(elapsed),
        };
        info!(?result, "reflex resolved");
        Some(result)
    }

    /// The tap-frenzy window closed.
    pub fn close_frenzy(&mut self, cfg: &GameConfig) -> Option<MiniGameResult> {
        let taps = match self.active {
            Some(MiniGame::TapFrenzy { taps, .. }) => taps,
            _ => return None,
        };
        self.active = None;
        let result = MiniGameResult::TapFrenzy {
            taps,
            reward: frenzy_reward(taps, cfg),
        };
        info!(?result, "tap frenzy closed");
        Some(result)
    }

    /// The reflex delay elapsed: record the "go" time. Returns whether the
    /// signal should be shown.
    pub fn arm_reflex(
        &mut self,
        now_ms: u64,
        cfg: &GameConfig,
        scheduler: &mut Scheduler<TimerEvent>,
    ) -> bool {
        if !matches!(self.active, Some(MiniGame::ReflexWaiting { .. })) {
            return false;
        }
        self.active = Some(MiniGame::ReflexArmed {
            go_at_ms: now_ms,
            timeout: scheduler.schedule(cfg.reflex_timeout_ms, TimerEvent::ReflexTimeout),
        });
        true
    }

    /// The armed reflex received no action in time.
    pub fn expire_reflex(&mut self) -> Option<MiniGameResult> {
        if !matches!(self.active, Some(MiniGame::ReflexArmed { .. })) {
            return None;
        }
        self.active = None;
        Some(MiniGameResult::Reflex {
            reward: 0,
            reaction_ms: None,
        })
    }

    /// Abort the running challenge without a result.
    pub fn cancel(&mut self, scheduler: &mut Scheduler<TimerEvent>) {
        let timer = match self.active.take() {
            Some(MiniGame::TapFrenzy { closes, .. }) => closes,
            Some(MiniGame::ReflexWaiting { go }) => go,
            Some(MiniGame::ReflexArmed { timeout, .. }) => timeout,
            None => return,
        };
        scheduler.cancel(timer);
    }
}

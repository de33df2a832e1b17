#![deny(warnings)]

//! Game simulation runtime for the idle factory.
//!
//! [`Engine`] owns the [`idle_core::GameState`] and is its only writer. Every
//! public operation and every timer callback runs to completion before the
//! next one starts; timers live on a virtual clock ([`Scheduler`]) that the
//! host advances.

pub mod effects;
mod engine;
mod error;
pub mod minigame;
mod notice;
pub mod prestige;
pub mod production;
pub mod progression;
pub mod scheduler;

pub use engine::Engine;
pub use error::GameError;
pub use minigame::{MiniGameKind, MiniGameResult};
pub use notice::Notice;
pub use scheduler::{Scheduler, TimerId};

use idle_core::Campaign;

/// Deferred actions the engine schedules on its clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    /// Automatic production interval.
    ProductionTick,
    /// Ephemeral event roll interval.
    EphemeralRoll,
    CampaignExpired(Campaign),
    EphemeralExpired,
    FrenzyClosed,
    ReflexGo,
    ReflexTimeout,
    /// Debounced snapshot write.
    FlushSave,
}

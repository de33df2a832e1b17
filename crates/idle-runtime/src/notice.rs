//! Messages for the presentation layer.

use crate::minigame::MiniGameKind;
use idle_core::{Campaign, UpgradeId};
use idle_econ::format_number;
use std::fmt;

/// A user-visible notification. `Display` renders the message text.
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    Purchased(UpgradeId),
    CampaignStarted { campaign: Campaign, duration_secs: u32 },
    CampaignEnded(Campaign),
    InsufficientFunds { upgrade: UpgradeId, price: u64 },
    AlreadyActive(UpgradeId),
    AchievementUnlocked { level: u32, label: String },
    PromoCodeUnlocked { objective: usize, code: String },
    PrestigeAvailable,
    PrestigeActivated { multiplier: f64 },
    PrestigeLocked { remaining: u64 },
    EventStarted { name: String, description: String },
    EventEnded { name: String },
    MiniGameStarted(MiniGameKind),
    ReflexGo,
    FrenzyResult { taps: u32, reward: u64 },
    ReflexResult { reward: u64, reaction_ms: Option<u64> },
    DailyRewardClaimed { amount: u64 },
    DailyRewardAlreadyClaimed,
    MuteToggled(bool),
    GameReset,
}

fn upgrade_label(upgrade: UpgradeId) -> &'static str {
    match upgrade {
        UpgradeId::Atelier => "Workshop extension",
        UpgradeId::Machine => "Automatic machine",
        UpgradeId::Pub => "Ad campaign",
        UpgradeId::Digital => "Digital campaign",
        UpgradeId::Lab => "R&D lab",
        UpgradeId::Staff => "New hire",
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Purchased(u) => write!(f, "{} bought!", upgrade_label(*u)),
            Notice::CampaignStarted {
                campaign,
                duration_secs,
            } => write!(
                f,
                "{} ON ({duration_secs}s)!",
                upgrade_label(campaign.upgrade())
            ),
            Notice::CampaignEnded(c) => write!(f, "{} finished.", upgrade_label(c.upgrade())),
            Notice::InsufficientFunds { upgrade, price } => write!(
                f,
                "Not enough units for {} ({} needed)!",
                upgrade_label(*upgrade),
                format_number(*price)
            ),
            Notice::AlreadyActive(u) => write!(f, "{} is already active!", upgrade_label(*u)),
            Notice::AchievementUnlocked { level, label } => {
                write!(f, "Level {level} reached: {label}")
            }
            Notice::PromoCodeUnlocked { objective, code } => {
                write!(f, "Promo code #{objective} unlocked: {code}")
            }
            Notice::PrestigeAvailable => write!(f, "Prestige is unlocked!"),
            Notice::PrestigeActivated { multiplier } => {
                write!(f, "Prestige activated! Production x{multiplier:.2}")
            }
            Notice::PrestigeLocked { remaining } => write!(
                f,
                "Prestige locked: {} more units to produce",
                format_number(*remaining)
            ),
            Notice::EventStarted { name, description } => {
                write!(f, "Event: {name}! ({description})")
            }
            Notice::EventEnded { name } => write!(f, "Event over: {name}"),
            Notice::MiniGameStarted(MiniGameKind::TapFrenzy) => {
                write!(f, "Mini-game: tap frenzy, click as much as you can!")
            }
            Notice::MiniGameStarted(MiniGameKind::Reflex) => {
                write!(f, "Mini-game: reflex challenge, click on the signal!")
            }
            Notice::ReflexGo => write!(f, "CLICK NOW!"),
            Notice::FrenzyResult { taps, reward } => write!(
                f,
                "Mini-game over: +{} units ({taps} taps)",
                format_number(*reward)
            ),
            Notice::ReflexResult {
                reward,
                reaction_ms: Some(ms),
            } => write!(f, "Reflex: +{} units (time: {ms} ms)", format_number(*reward)),
            Notice::ReflexResult {
                reaction_ms: None, ..
            } => write!(f, "Reflex: too slow, no bonus"),
            Notice::DailyRewardClaimed { amount } => {
                write!(f, "+{} units (daily reward)", format_number(*amount))
            }
            Notice::DailyRewardAlreadyClaimed => write!(f, "Daily reward already claimed today"),
            Notice::MuteToggled(true) => write!(f, "Sound off"),
            Notice::MuteToggled(false) => write!(f, "Sound on"),
            Notice::GameReset => write!(f, "The game has been reset."),
        }
    }
}

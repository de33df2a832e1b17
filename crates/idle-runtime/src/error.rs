use idle_econ::EconError;
use thiserror::Error;

/// Recoverable, user-facing refusals. State is unchanged when one is returned.
#[derive(Debug, Error, PartialEq)]
pub enum GameError {
    /// Purchase refused (insufficient funds or campaign already running).
    #[error(transparent)]
    Econ(#[from] EconError),
    /// The daily reward was already claimed today.
    #[error("daily reward already claimed today")]
    AlreadyClaimed,
    /// Prestige gate not reached.
    #[error("prestige is not unlocked yet")]
    NotUnlocked,
}

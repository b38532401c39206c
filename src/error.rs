//! Error type for game operations.

use thiserror::Error;

use crate::models::Money;

/// Failure of a game operation.
///
/// Validation variants are recoverable: the state is left untouched and the
/// message can be shown to the player as-is.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("share count must be at least 1 (got {0})")]
    InvalidShares(u32),

    #[error("insufficient cash: need {required}, have {available} (short {shortfall})")]
    InsufficientCash {
        required: Money,
        available: Money,
        shortfall: Money,
    },

    #[error("you don't hold any {0}")]
    NoHolding(String),

    #[error("insufficient shares of {symbol}: holding {held}, tried to sell {requested}")]
    InsufficientShares {
        symbol: String,
        held: u32,
        requested: u32,
    },

    #[error("holding {held} shares of {symbol}, cannot add {requested} more")]
    HoldingLimit {
        symbol: String,
        held: u32,
        requested: u32,
    },

    #[error("stock not available: {0}")]
    StockNotAvailable(String),

    #[error("game is over (day {day} of {max_days})")]
    GameOver { day: u32, max_days: u32 },

    #[error("no saved game found")]
    NoSavedGame,

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl GameError {
    /// True for rule violations the player can correct and retry.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            GameError::InvalidShares(_)
                | GameError::InsufficientCash { .. }
                | GameError::NoHolding(_)
                | GameError::InsufficientShares { .. }
                | GameError::HoldingLimit { .. }
                | GameError::StockNotAvailable(_)
                | GameError::GameOver { .. }
                | GameError::NoSavedGame
        )
    }
}

pub type GameResult<T> = std::result::Result<T, GameError>;

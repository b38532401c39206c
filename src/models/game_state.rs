//! Whole-game state: day counter, portfolio, market and progression.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::{Portfolio, Stock};

/// Difficulty tier: scales random volatility and the upside of good news.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn volatility_multiplier(&self) -> f64 {
        match self {
            Difficulty::Easy => 0.7,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.5,
        }
    }

    pub fn positive_news_multiplier(&self) -> f64 {
        match self {
            Difficulty::Easy => 1.5,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 0.7,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Normal => "NORMAL",
            Difficulty::Hard => "HARD",
        }
    }
}

impl FromStr for Difficulty {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(anyhow::anyhow!("Unknown difficulty: {} (expected easy, normal, hard)", s)),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Lifecycle status of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    NotStarted,
    #[default]
    InProgress,
    Completed,
    Paused,
}

/// Complete game state. Transitions build a new value rather than mutating
/// one that callers can observe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// 1-based day counter
    pub current_day: u32,
    pub max_days: u32,
    pub portfolio: Portfolio,

    /// Every listed stock, locked or not
    pub stocks: Vec<Stock>,

    /// Symbols the player may trade
    pub unlocked_companies: BTreeSet<String>,

    pub status: GameStatus,
    pub difficulty: Difficulty,

    #[serde(default)]
    pub total_trades: u32,

    #[serde(default)]
    pub winning_trades: u32,
}

impl GameState {
    pub fn is_game_over(&self) -> bool {
        self.current_day >= self.max_days
    }

    pub fn remaining_days(&self) -> u32 {
        self.max_days.saturating_sub(self.current_day)
    }

    /// Fraction of trades that were winning sells.
    pub fn win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            return 0.0;
        }
        self.winning_trades as f64 / self.total_trades as f64
    }

    pub fn is_unlocked(&self, symbol: &str) -> bool {
        self.unlocked_companies.contains(symbol)
    }

    pub fn stock(&self, symbol: &str) -> Option<&Stock> {
        self.stocks.iter().find(|s| s.symbol() == symbol)
    }

    /// Stock by symbol, only if it is unlocked.
    pub fn unlocked_stock(&self, symbol: &str) -> Option<&Stock> {
        self.stock(symbol).filter(|s| self.is_unlocked(s.symbol()))
    }

    pub fn unlocked_stocks(&self) -> impl Iterator<Item = &Stock> {
        self.stocks.iter().filter(|s| self.is_unlocked(s.symbol()))
    }

    /// Player level from asset growth, days played and trade count.
    ///
    /// `floor(total_assets / initial_cash + day / 5 + trades / 10)`, at least 1.
    pub fn player_level(&self) -> u32 {
        let asset_multiplier = if self.portfolio.initial_cash.is_zero() {
            0.0
        } else {
            (self.portfolio.total_assets().amount() / self.portfolio.initial_cash.amount())
                .to_f64()
                .unwrap_or(0.0)
        };
        let day_bonus = (self.current_day / 5) as f64;
        let trade_bonus = (self.total_trades / 10) as f64;

        let level = (asset_multiplier + day_bonus + trade_bonus).floor();
        if level.is_finite() && level >= 1.0 {
            level as u32
        } else {
            1
        }
    }

    /// Locked companies whose unlock level the player has reached.
    pub fn unlockable_companies(&self) -> BTreeSet<String> {
        let level = self.player_level();
        self.stocks
            .iter()
            .filter(|s| !self.is_unlocked(s.symbol()) && s.company.unlock_level <= level)
            .map(|s| s.symbol().to_string())
            .collect()
    }

    /// Count a completed trade.
    pub fn record_trade(&mut self, is_winning: bool) {
        self.total_trades += 1;
        if is_winning {
            self.winning_trades += 1;
        }
    }
}

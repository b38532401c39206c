//! Game configuration.

use std::str::FromStr;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::models::Money;

/// Tunable constants for the simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Starting cash
    pub initial_cash: Money,

    /// Length of a game in days
    pub max_days: u32,

    /// Commission charged on buy and sell notional (0.001 = 0.1%)
    pub commission_rate: Decimal,

    /// Number of price points kept per stock
    pub history_depth: usize,

    /// Prices never fall below this
    pub price_floor: Money,

    /// Largest fractional move allowed in one update (0.30 = ±30%)
    pub max_daily_move: f64,

    /// Standard deviation of the random daily move before volatility scaling
    pub base_daily_move: f64,

    /// Initial price spread around each company's base price (0.05 = ±5%)
    pub initial_price_spread: f64,

    /// How many roster companies are tradable from day one
    pub initial_unlocked: usize,

    /// News items generated per day (inclusive range)
    pub min_news_per_day: usize,
    pub max_news_per_day: usize,

    /// Seconds between days in auto-play
    pub tick_interval_secs: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_cash: Money::from_yen(1_000_000),
            max_days: 30,
            commission_rate: dec!(0.001),     // 0.1%
            history_depth: 30,
            price_floor: Money::from_yen(1),
            max_daily_move: 0.30,
            base_daily_move: 0.05,            // 5% daily sigma
            initial_price_spread: 0.05,
            initial_unlocked: 6,
            min_news_per_day: 2,
            max_news_per_day: 4,
            tick_interval_secs: 2,
        }
    }
}

impl GameConfig {
    /// Defaults, overridden by `STOCKSIM_*` environment variables (a `.env`
    /// file is loaded first if present):
    /// - STOCKSIM_INITIAL_CASH
    /// - STOCKSIM_MAX_DAYS
    /// - STOCKSIM_COMMISSION_RATE
    /// - STOCKSIM_HISTORY_DEPTH
    /// - STOCKSIM_TICK_SECS
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Some(cash) = env_override::<Decimal>("STOCKSIM_INITIAL_CASH")? {
            config.initial_cash = Money::new(cash);
        }
        if let Some(days) = env_override("STOCKSIM_MAX_DAYS")? {
            config.max_days = days;
        }
        if let Some(rate) = env_override("STOCKSIM_COMMISSION_RATE")? {
            config.commission_rate = rate;
        }
        if let Some(depth) = env_override("STOCKSIM_HISTORY_DEPTH")? {
            config.history_depth = depth;
        }
        if let Some(secs) = env_override("STOCKSIM_TICK_SECS")? {
            config.tick_interval_secs = secs;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine can't run with.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.initial_cash.is_positive(),
            "initial cash must be positive"
        );
        anyhow::ensure!(self.max_days >= 2, "a game needs at least 2 days");
        anyhow::ensure!(
            self.commission_rate >= Decimal::ZERO && self.commission_rate < Decimal::ONE,
            "commission rate must be in [0, 1)"
        );
        anyhow::ensure!(self.history_depth >= 1, "history depth must be at least 1");
        anyhow::ensure!(
            self.price_floor.is_positive(),
            "price floor must be positive"
        );
        anyhow::ensure!(
            self.max_daily_move > 0.0 && self.max_daily_move < 1.0,
            "max daily move must be in (0, 1)"
        );
        anyhow::ensure!(
            self.min_news_per_day <= self.max_news_per_day,
            "min news per day exceeds max"
        );
        anyhow::ensure!(
            self.tick_interval_secs >= 1,
            "tick interval must be at least 1s"
        );
        Ok(())
    }
}

fn env_override<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("Invalid {}: {}", key, raw)),
        Err(_) => Ok(None),
    }
}

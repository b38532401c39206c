//! Game session: owns the live state and persists every transition.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::config::GameConfig;
use crate::db::Database;
use crate::error::{GameError, GameResult};
use crate::metrics::StatisticsCalculator;
use crate::models::{Difficulty, GameState, GameStatistics, NewsEvent, PricePoint, Transaction};
use crate::trading::{TradeExecutor, TradeOutcome};

use super::engine::{DayOutcome, GameEngine};

/// SplitMix64 increment, spreads consecutive days across the seed space.
const DAY_STREAM_STEP: u64 = 0x9E37_79B9_7F4A_7C15;

/// A running game backed by the database.
///
/// Each operation computes a complete new state and only swaps it in once it
/// has been saved.
pub struct GameSession {
    engine: GameEngine,
    executor: TradeExecutor,
    db: Database,
    seed: Option<u64>,
    state: GameState,
}

/// Random source for the transition out of `day` (day 0 lists the market).
///
/// With a seed every day gets its own stream, so a game resumed from disk
/// plays out exactly like one played in a single session.
fn day_rng(seed: Option<u64>, day: u32) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed ^ u64::from(day).wrapping_mul(DAY_STREAM_STEP)),
        None => StdRng::from_os_rng(),
    }
}

impl GameSession {
    /// Start a new game, discarding any saved one.
    pub async fn start_new(
        config: GameConfig,
        db: Database,
        difficulty: Difficulty,
        seed: Option<u64>,
    ) -> GameResult<Self> {
        let engine = GameEngine::new(config);
        let mut rng = day_rng(seed, 0);
        let state = engine.new_game(difficulty, Utc::now().timestamp(), &mut rng);

        if db.has_saved_game().await? {
            warn!("Replacing saved game");
        }
        db.start_game(&state).await?;

        info!(
            difficulty = %difficulty,
            max_days = state.max_days,
            cash = %state.portfolio.cash,
            "New game started"
        );

        Ok(Self::assemble(engine, db, seed, state))
    }

    /// Resume the saved game.
    pub async fn load(config: GameConfig, db: Database, seed: Option<u64>) -> GameResult<Self> {
        let state = db.load_game_state().await?;
        if state.max_days != config.max_days {
            warn!(
                saved = state.max_days,
                configured = config.max_days,
                "Saved game length differs from configuration; keeping saved value"
            );
        }

        for quote in db.get_stocks().await? {
            let stored = quote.current_price()?;
            if let Some(stock) = state.stock(&quote.symbol) {
                if stock.current_price != stored {
                    warn!(
                        symbol = %quote.symbol,
                        state_price = %stock.current_price,
                        stored_price = %stored,
                        "Stock table out of step with saved state"
                    );
                }
            }
        }

        info!(
            day = state.current_day,
            max_days = state.max_days,
            "Game loaded"
        );
        Ok(Self::assemble(GameEngine::new(config), db, seed, state))
    }

    fn assemble(engine: GameEngine, db: Database, seed: Option<u64>, state: GameState) -> Self {
        Self {
            executor: TradeExecutor::new(engine.config()),
            engine,
            db,
            seed,
            state,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        self.engine.config()
    }

    /// Buy shares at the current price.
    pub async fn buy(&mut self, symbol: &str, shares: u32) -> GameResult<TradeOutcome> {
        let outcome = self
            .executor
            .buy(&self.state, symbol, shares, Utc::now().timestamp())?;
        self.commit_trade(&outcome).await?;
        Ok(outcome)
    }

    /// Sell shares at the current price.
    pub async fn sell(&mut self, symbol: &str, shares: u32) -> GameResult<TradeOutcome> {
        let outcome = self
            .executor
            .sell(&self.state, symbol, shares, Utc::now().timestamp())?;
        self.commit_trade(&outcome).await?;
        Ok(outcome)
    }

    async fn commit_trade(&mut self, outcome: &TradeOutcome) -> GameResult<()> {
        self.db
            .commit_trade(&outcome.transaction, &outcome.state)
            .await?;
        self.state = outcome.state.clone();
        Ok(())
    }

    /// Advance to the next day.
    pub async fn next_day(&mut self) -> GameResult<DayOutcome> {
        let mut rng = day_rng(self.seed, self.state.current_day);
        let outcome = self
            .engine
            .advance_day(&self.state, Utc::now().timestamp(), &mut rng)?;

        self.db.commit_day(&outcome.news, &outcome.state).await?;

        if !outcome.unlocked.is_empty() {
            info!(symbols = ?outcome.unlocked, "Companies unlocked");
        }
        if outcome.state.is_game_over() {
            info!(assets = %outcome.state.portfolio.total_assets(), "Game completed");
        }

        self.state = outcome.state.clone();
        Ok(outcome)
    }

    /// Statistics over the saved transaction log.
    pub async fn statistics(&self) -> GameResult<GameStatistics> {
        let transactions = self.db.get_transactions().await?;
        Ok(StatisticsCalculator::calculate(&self.state, &transactions))
    }

    /// Transaction log, optionally narrowed to a symbol and/or a day.
    pub async fn transactions(
        &self,
        symbol: Option<&str>,
        day: Option<u32>,
    ) -> GameResult<Vec<Transaction>> {
        match (symbol, day) {
            (Some(symbol), Some(day)) => {
                let mut rows = self.db.get_transactions_for_day(day).await?;
                rows.retain(|t| t.symbol == symbol);
                Ok(rows)
            }
            (Some(symbol), None) => self.db.get_transactions_for_symbol(symbol).await,
            (None, Some(day)) => self.db.get_transactions_for_day(day).await,
            (None, None) => self.db.get_transactions().await,
        }
    }

    pub async fn news_for_day(&self, day: u32) -> GameResult<Vec<NewsEvent>> {
        self.db.get_news_for_day(day).await
    }

    /// Recent saved prices for a listed symbol.
    pub async fn price_history(&self, symbol: &str, limit: i64) -> GameResult<Vec<PricePoint>> {
        if self.state.stock(symbol).is_none() {
            return Err(GameError::StockNotAvailable(symbol.to_string()));
        }
        self.db.get_price_history(symbol, limit).await
    }

    /// Drop saved price points older than `cutoff`.
    pub async fn prune_history(&self, cutoff: i64) -> GameResult<u64> {
        let removed = self.db.prune_price_history(cutoff).await?;
        info!(removed = removed, cutoff = cutoff, "Price history pruned");
        Ok(removed)
    }
}

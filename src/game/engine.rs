//! Game setup and day advancement.

use rand::Rng;
use tracing::info;

use crate::config::GameConfig;
use crate::error::{GameError, GameResult};
use crate::market::{NewsGenerator, PriceUpdater, Roster};
use crate::models::{Company, Difficulty, GameState, GameStatus, NewsEvent, Portfolio};

/// Result of advancing one day.
#[derive(Debug, Clone)]
pub struct DayOutcome {
    pub state: GameState,

    /// News published on the new day, in time order
    pub news: Vec<NewsEvent>,

    /// Symbols unlocked by this advance
    pub unlocked: Vec<String>,
}

/// Pure game rules: builds new states from old ones and a random source.
#[derive(Debug, Clone)]
pub struct GameEngine {
    config: GameConfig,
    roster: Roster,
    prices: PriceUpdater,
    news: NewsGenerator,
}

impl GameEngine {
    pub fn new(config: GameConfig) -> Self {
        Self::with_roster(config, Roster::standard())
    }

    pub fn with_roster(config: GameConfig, roster: Roster) -> Self {
        Self {
            prices: PriceUpdater::new(&config),
            news: NewsGenerator::new(&config),
            roster,
            config,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Fresh day-1 state: full roster listed near base prices, the first
    /// companies unlocked, all cash.
    pub fn new_game<R: Rng + ?Sized>(
        &self,
        difficulty: Difficulty,
        timestamp: i64,
        rng: &mut R,
    ) -> GameState {
        let stocks = self
            .roster
            .list_stocks(self.config.initial_price_spread, timestamp, rng);
        let unlocked_companies = self
            .roster
            .initial_symbols(self.config.initial_unlocked)
            .into_iter()
            .collect();

        GameState {
            current_day: 1,
            max_days: self.config.max_days,
            portfolio: Portfolio::new(self.config.initial_cash),
            stocks,
            unlocked_companies,
            status: GameStatus::InProgress,
            difficulty,
            total_trades: 0,
            winning_trades: 0,
        }
    }

    /// Move to the next day.
    ///
    /// News for the new day drives the price update, holdings are marked to
    /// the new prices, and companies unlock based on the player level before
    /// the advance.
    pub fn advance_day<R: Rng + ?Sized>(
        &self,
        state: &GameState,
        timestamp: i64,
        rng: &mut R,
    ) -> GameResult<DayOutcome> {
        if state.is_game_over() {
            return Err(GameError::GameOver {
                day: state.current_day,
                max_days: state.max_days,
            });
        }

        let next_day = state.current_day + 1;
        let companies: Vec<Company> = state.stocks.iter().map(|s| s.company.clone()).collect();

        let news = self
            .news
            .generate(next_day, &companies, state.difficulty, rng);
        let stocks = self
            .prices
            .update_all(&state.stocks, &news, state.difficulty, timestamp, rng);
        let unlocked: Vec<String> = state.unlockable_companies().into_iter().collect();

        let mut next = state.clone();
        for stock in &stocks {
            next.portfolio
                .update_price(stock.symbol(), stock.current_price);
        }
        next.stocks = stocks;
        next.unlocked_companies.extend(unlocked.iter().cloned());
        next.current_day = next_day;
        next.status = if next_day >= next.max_days {
            GameStatus::Completed
        } else {
            GameStatus::InProgress
        };

        info!(
            day = next_day,
            news = news.len(),
            unlocked = ?unlocked,
            assets = %next.portfolio.total_assets(),
            "Day advanced"
        );

        Ok(DayOutcome {
            state: next,
            news,
            unlocked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use crate::trading::TradeExecutor;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn engine_with_days(max_days: u32) -> GameEngine {
        let mut config = GameConfig::default();
        config.max_days = max_days;
        GameEngine::new(config)
    }

    #[test]
    fn test_new_game() {
        let engine = GameEngine::new(GameConfig::default());
        let mut rng = StdRng::seed_from_u64(1);
        let state = engine.new_game(Difficulty::Easy, 100, &mut rng);

        assert_eq!(state.current_day, 1);
        assert_eq!(state.max_days, 30);
        assert_eq!(state.stocks.len(), 10);
        assert_eq!(state.unlocked_companies.len(), 6);
        assert!(state.is_unlocked("ENGY"));
        assert!(!state.is_unlocked("DGTL"));
        assert_eq!(state.portfolio.cash, Money::from_yen(1_000_000));
        assert_eq!(state.difficulty, Difficulty::Easy);
        assert_eq!(state.status, GameStatus::InProgress);
    }

    #[test]
    fn test_advance_moves_day_and_prices() {
        let engine = GameEngine::new(GameConfig::default());
        let mut rng = StdRng::seed_from_u64(2);
        let state = engine.new_game(Difficulty::Normal, 0, &mut rng);
        let state = TradeExecutor::new(engine.config())
            .buy(&state, "CYBT", 10, 0)
            .unwrap()
            .state;

        let outcome = engine.advance_day(&state, 86_400, &mut rng).unwrap();
        let next = &outcome.state;

        assert_eq!(next.current_day, 2);
        assert!((2..=4).contains(&outcome.news.len()));
        assert!(outcome.news.iter().all(|n| n.day == 2));

        for (before, after) in state.stocks.iter().zip(&next.stocks) {
            assert_eq!(after.previous_price, before.current_price);
            assert_eq!(after.last_updated, 86_400);
            assert_eq!(after.price_history.len(), 2);
        }

        // Holding follows the market
        let cybt = next.stock("CYBT").unwrap().current_price;
        assert_eq!(next.portfolio.holding("CYBT").unwrap().current_price, cybt);
        assert_eq!(next.portfolio.cash, state.portfolio.cash);
    }

    #[test]
    fn test_unlocks_from_pre_advance_level() {
        let engine = GameEngine::new(GameConfig::default());
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = engine.new_game(Difficulty::Normal, 0, &mut rng);

        // Day 4 is still level 1
        state.current_day = 4;
        let outcome = engine.advance_day(&state, 0, &mut rng).unwrap();
        assert!(outcome.unlocked.is_empty());

        // Advancing from day 5 uses level 2
        let outcome = engine.advance_day(&outcome.state, 0, &mut rng).unwrap();
        assert_eq!(
            outcome.unlocked,
            vec!["DGTL".to_string(), "MDCL".to_string()]
        );
        assert!(outcome.state.is_unlocked("DGTL"));
        assert!(outcome.state.is_unlocked("MDCL"));
        assert!(!outcome.state.is_unlocked("CHMC"));
    }

    #[test]
    fn test_game_ends_at_max_days() {
        let engine = engine_with_days(3);
        let mut rng = StdRng::seed_from_u64(4);
        let state = engine.new_game(Difficulty::Hard, 0, &mut rng);

        let day2 = engine.advance_day(&state, 0, &mut rng).unwrap().state;
        assert_eq!(day2.status, GameStatus::InProgress);

        let day3 = engine.advance_day(&day2, 0, &mut rng).unwrap().state;
        assert_eq!(day3.current_day, 3);
        assert_eq!(day3.status, GameStatus::Completed);
        assert!(day3.is_game_over());

        let err = engine.advance_day(&day3, 0, &mut rng).unwrap_err();
        assert_eq!(err.to_string(), "game is over (day 3 of 3)");
    }

    #[test]
    fn test_same_seed_same_game() {
        let engine = GameEngine::new(GameConfig::default());
        let play = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut state = engine.new_game(Difficulty::Normal, 0, &mut rng);
            for day in 1..10 {
                state = engine.advance_day(&state, day, &mut rng).unwrap().state;
            }
            state
                .stocks
                .iter()
                .map(|s| s.current_price)
                .collect::<Vec<_>>()
        };

        assert_eq!(play(99), play(99));
    }
}

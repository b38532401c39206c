//! Daily price update: random walk scaled by volatility, plus news impact.
//!
//! For each stock the fractional move is
//!
//! ```text
//! delta = N(0,1) * company_volatility * difficulty_multiplier * base_daily_move
//!       + sum(resolved impact of every news item naming the symbol)
//! ```
//!
//! clamped to `[-max_daily_move, +max_daily_move]` and applied
//! multiplicatively. The result never goes below the price floor.

use rand::Rng;
use rand_distr::StandardNormal;
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::GameConfig;
use crate::models::{Difficulty, Money, NewsEvent, PricePoint, Stock};

/// Decimal places kept on the daily multiplier.
const FACTOR_DP: u32 = 8;

/// Decimal places kept on prices.
const PRICE_DP: u32 = 4;

/// Computes next-day prices.
#[derive(Debug, Clone)]
pub struct PriceUpdater {
    base_daily_move: f64,
    max_daily_move: f64,
    price_floor: Money,
    history_depth: usize,
}

impl PriceUpdater {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            base_daily_move: config.base_daily_move,
            max_daily_move: config.max_daily_move,
            price_floor: config.price_floor,
            history_depth: config.history_depth.max(1),
        }
    }

    /// Fractional move for one stock before clamping.
    pub fn raw_delta<R: Rng + ?Sized>(
        &self,
        stock: &Stock,
        news: &[NewsEvent],
        difficulty: Difficulty,
        rng: &mut R,
    ) -> f64 {
        let volatility = stock.company.volatility.multiplier() * difficulty.volatility_multiplier();
        let normal: f64 = rng.sample(StandardNormal);
        let random_change = normal * volatility * self.base_daily_move;

        let news_impact: f64 = news
            .iter()
            .filter(|event| event.affects(stock.symbol()))
            .map(|event| event.impact.resolve(rng))
            .sum();

        random_change + news_impact
    }

    /// Clamp a move to the allowed daily range.
    pub fn clamp_delta(&self, delta: f64) -> f64 {
        if delta.is_nan() {
            return 0.0;
        }
        delta.clamp(-self.max_daily_move, self.max_daily_move)
    }

    /// Apply a clamped fractional move to a price, respecting the floor.
    pub fn apply_delta(&self, price: Money, delta: f64) -> Money {
        let delta = self.clamp_delta(delta);
        let factor = Decimal::try_from(1.0 + delta)
            .unwrap_or(Decimal::ONE)
            .round_dp(FACTOR_DP);

        let next = Money::new((price * factor).amount().round_dp(PRICE_DP));
        next.max(self.price_floor)
    }

    /// Next state of a single stock.
    pub fn update_stock<R: Rng + ?Sized>(
        &self,
        stock: &Stock,
        news: &[NewsEvent],
        difficulty: Difficulty,
        timestamp: i64,
        rng: &mut R,
    ) -> Stock {
        let delta = self.raw_delta(stock, news, difficulty, rng);
        let new_price = self.apply_delta(stock.current_price, delta);

        debug!(
            symbol = %stock.symbol(),
            delta = delta,
            old = %stock.current_price.amount(),
            new = %new_price.amount(),
            "Price updated"
        );

        let mut history = stock.price_history.clone();
        history.push(PricePoint {
            price: new_price,
            timestamp,
        });
        if history.len() > self.history_depth {
            let excess = history.len() - self.history_depth;
            history.drain(..excess);
        }

        Stock {
            company: stock.company.clone(),
            current_price: new_price,
            previous_price: stock.current_price,
            price_history: history,
            last_updated: timestamp,
        }
    }

    /// Next state of every stock.
    pub fn update_all<R: Rng + ?Sized>(
        &self,
        stocks: &[Stock],
        news: &[NewsEvent],
        difficulty: Difficulty,
        timestamp: i64,
        rng: &mut R,
    ) -> Vec<Stock> {
        stocks
            .iter()
            .map(|stock| self.update_stock(stock, news, difficulty, timestamp, rng))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Company, CompanyCategory, MarketImpact, NewsType, Volatility};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    fn make_stock(symbol: &str, volatility: Volatility, price: Decimal) -> Stock {
        let company = Company {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            category: CompanyCategory::Technology,
            description: String::new(),
            volatility,
            has_dividend: false,
            unlock_level: 1,
        };
        Stock::listed(company, Money::new(price), 0)
    }

    fn make_news(symbol: &str, impact: MarketImpact) -> NewsEvent {
        NewsEvent {
            id: "n".to_string(),
            title: "test".to_string(),
            description: String::new(),
            affected_companies: vec![symbol.to_string()],
            impact,
            news_type: NewsType::Positive,
            occurred_at: 36_000,
            day: 2,
        }
    }

    #[test]
    fn test_update_stays_within_daily_bound() {
        let updater = PriceUpdater::new(&GameConfig::default());
        let mut rng = StdRng::seed_from_u64(1);
        let mut stock = make_stock("CYBT", Volatility::High, dec!(1000));
        let news = vec![
            make_news("CYBT", MarketImpact::volatile()),
            make_news("CYBT", MarketImpact::volatile()),
        ];

        for day in 0..500 {
            let next = updater.update_stock(&stock, &news, Difficulty::Hard, day, &mut rng);
            let old = stock.current_price.amount();
            let new = next.current_price.amount();
            let tolerance = dec!(0.0001);

            assert!(
                new >= old * dec!(0.7) - tolerance,
                "{} fell too far from {}",
                new,
                old
            );
            assert!(
                new <= old * dec!(1.3) + tolerance,
                "{} rose too far from {}",
                new,
                old
            );
            assert!(next.current_price >= Money::from_yen(1));
            assert_eq!(next.previous_price, stock.current_price);
            stock = next;
        }
    }

    #[test]
    fn test_strong_news_is_clamped() {
        let updater = PriceUpdater::new(&GameConfig::default());
        let mut rng = StdRng::seed_from_u64(9);
        let stock = make_stock("FOOD", Volatility::Low, dec!(800));
        // Three certain +25..+30% impacts: way past the cap
        let boom = MarketImpact::new(0.25, 0.30, 1.0);
        let news = vec![
            make_news("FOOD", boom),
            make_news("FOOD", boom),
            make_news("FOOD", boom),
        ];

        let next = updater.update_stock(&stock, &news, Difficulty::Normal, 1, &mut rng);
        assert_eq!(next.current_price, Money::new(dec!(1040)));
    }

    #[test]
    fn test_unrelated_news_is_ignored() {
        let updater = PriceUpdater::new(&GameConfig::default());
        let stock = make_stock("FOOD", Volatility::Low, dec!(800));
        let news = vec![make_news("CYBT", MarketImpact::new(0.25, 0.30, 1.0))];

        let mut with_news = StdRng::seed_from_u64(3);
        let mut without_news = StdRng::seed_from_u64(3);
        let a = updater.update_stock(&stock, &news, Difficulty::Normal, 1, &mut with_news);
        let b = updater.update_stock(&stock, &[], Difficulty::Normal, 1, &mut without_news);
        assert_eq!(a.current_price, b.current_price);
    }

    #[test]
    fn test_price_floor() {
        let updater = PriceUpdater::new(&GameConfig::default());
        assert_eq!(
            updater.apply_delta(Money::new(dec!(1.2)), -0.3),
            Money::from_yen(1)
        );
        assert_eq!(
            updater.apply_delta(Money::from_yen(1000), -0.9),
            Money::from_yen(700)
        );
        assert_eq!(
            updater.apply_delta(Money::from_yen(1000), f64::NAN),
            Money::from_yen(1000)
        );
    }

    #[test]
    fn test_history_is_capped() {
        let mut config = GameConfig::default();
        config.history_depth = 5;
        let updater = PriceUpdater::new(&config);
        let mut rng = StdRng::seed_from_u64(11);
        let mut stock = make_stock("RETL", Volatility::Medium, dec!(1100));

        for day in 1..=12 {
            stock = updater.update_stock(&stock, &[], Difficulty::Normal, day, &mut rng);
        }

        assert_eq!(stock.price_history.len(), 5);
        assert_eq!(stock.price_history.first().unwrap().timestamp, 8);
        assert_eq!(
            stock.price_history.last().unwrap().price,
            stock.current_price
        );
        assert_eq!(stock.last_updated, 12);
    }

    #[test]
    fn test_same_seed_same_prices() {
        let updater = PriceUpdater::new(&GameConfig::default());
        let stocks = vec![
            make_stock("CYBT", Volatility::High, dec!(1000)),
            make_stock("FOOD", Volatility::Low, dec!(800)),
        ];

        let mut rng = StdRng::seed_from_u64(5);
        let a = updater.update_all(&stocks, &[], Difficulty::Normal, 1, &mut rng);
        let mut rng = StdRng::seed_from_u64(5);
        let b = updater.update_all(&stocks, &[], Difficulty::Normal, 1, &mut rng);
        assert_eq!(a, b);
    }
}

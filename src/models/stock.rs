//! Stock quote: a company plus its current price and recent history.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use super::{Company, Money};

/// One recorded price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: Money,
    /// Unix timestamp (seconds)
    pub timestamp: i64,
}

/// Direction of recent price movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceTrend {
    Upward,
    Downward,
    Neutral,
}

impl PriceTrend {
    pub fn arrow(&self) -> &'static str {
        match self {
            PriceTrend::Upward => "↑",
            PriceTrend::Downward => "↓",
            PriceTrend::Neutral => "→",
        }
    }
}

/// A tradable stock and its price state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub company: Company,
    pub current_price: Money,
    /// Price before the most recent update
    pub previous_price: Money,
    /// Most recent price points, oldest first
    pub price_history: Vec<PricePoint>,
    /// Unix timestamp of the last update
    pub last_updated: i64,
}

impl Stock {
    /// Fresh listing with a single history point and no change yet.
    pub fn listed(company: Company, price: Money, timestamp: i64) -> Self {
        Self {
            company,
            current_price: price,
            previous_price: price,
            price_history: vec![PricePoint { price, timestamp }],
            last_updated: timestamp,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.company.symbol
    }

    /// Fractional change since the previous price.
    pub fn change_rate(&self) -> Decimal {
        if self.previous_price.is_zero() {
            return Decimal::ZERO;
        }
        (self.current_price - self.previous_price).amount() / self.previous_price.amount()
    }

    pub fn change_amount(&self) -> Money {
        self.current_price - self.previous_price
    }

    pub fn is_positive_change(&self) -> bool {
        self.change_rate() > Decimal::ZERO
    }

    pub fn is_negative_change(&self) -> bool {
        self.change_rate() < Decimal::ZERO
    }

    /// Highest price among the last `points` history entries.
    pub fn highest_price(&self, points: usize) -> Money {
        self.recent(points)
            .iter()
            .map(|p| p.price)
            .max()
            .unwrap_or(self.current_price)
    }

    /// Lowest price among the last `points` history entries.
    pub fn lowest_price(&self, points: usize) -> Money {
        self.recent(points)
            .iter()
            .map(|p| p.price)
            .min()
            .unwrap_or(self.current_price)
    }

    /// Trend over the last `points` entries, by counting rising vs falling steps.
    pub fn trend(&self, points: usize) -> PriceTrend {
        if points < 2 || self.price_history.len() < points {
            return PriceTrend::Neutral;
        }

        let recent = self.recent(points);
        let rising = recent
            .windows(2)
            .filter(|w| w[1].price > w[0].price)
            .count();
        let falling = recent
            .windows(2)
            .filter(|w| w[1].price < w[0].price)
            .count();

        match rising.cmp(&falling) {
            std::cmp::Ordering::Greater => PriceTrend::Upward,
            std::cmp::Ordering::Less => PriceTrend::Downward,
            std::cmp::Ordering::Equal => PriceTrend::Neutral,
        }
    }

    /// Sample standard deviation of point-to-point returns across the history.
    pub fn realized_volatility(&self) -> f64 {
        let returns: Vec<f64> = self
            .price_history
            .windows(2)
            .filter(|w| w[0].price.is_positive())
            .map(|w| (w[1].price.to_f64() - w[0].price.to_f64()) / w[0].price.to_f64())
            .collect();

        if returns.len() < 2 {
            return 0.0;
        }
        let std_dev = returns.std_dev();
        if std_dev.is_finite() {
            std_dev
        } else {
            0.0
        }
    }

    fn recent(&self, points: usize) -> &[PricePoint] {
        let start = self.price_history.len().saturating_sub(points);
        &self.price_history[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompanyCategory, Volatility};

    fn make_stock(prices: &[i64]) -> Stock {
        let company = Company {
            symbol: "CYBT".to_string(),
            name: "Cybertron".to_string(),
            category: CompanyCategory::Technology,
            description: String::new(),
            volatility: Volatility::High,
            has_dividend: false,
            unlock_level: 1,
        };
        let history: Vec<PricePoint> = prices
            .iter()
            .enumerate()
            .map(|(i, p)| PricePoint {
                price: Money::from_yen(*p),
                timestamp: i as i64,
            })
            .collect();
        let current = history.last().map(|p| p.price).unwrap_or(Money::ZERO);
        let previous = if history.len() > 1 {
            history[history.len() - 2].price
        } else {
            current
        };

        Stock {
            company,
            current_price: current,
            previous_price: previous,
            price_history: history,
            last_updated: prices.len() as i64,
        }
    }

    #[test]
    fn test_change_rate() {
        let stock = make_stock(&[1000, 1100]);
        assert_eq!(stock.change_rate(), Decimal::new(1, 1));
        assert_eq!(stock.change_amount(), Money::from_yen(100));
        assert!(stock.is_positive_change());

        let flat = make_stock(&[1000]);
        assert_eq!(flat.change_rate(), Decimal::ZERO);
        assert!(!flat.is_positive_change() && !flat.is_negative_change());
    }

    #[test]
    fn test_high_low_window() {
        let stock = make_stock(&[2000, 900, 1000, 1200, 1100]);
        assert_eq!(stock.highest_price(3), Money::from_yen(1200));
        assert_eq!(stock.lowest_price(3), Money::from_yen(1000));
        assert_eq!(stock.highest_price(10), Money::from_yen(2000));
    }

    #[test]
    fn test_trend() {
        assert_eq!(make_stock(&[100, 110, 120]).trend(3), PriceTrend::Upward);
        assert_eq!(make_stock(&[120, 110, 100]).trend(3), PriceTrend::Downward);
        assert_eq!(make_stock(&[100, 110, 100]).trend(3), PriceTrend::Neutral);
        // Not enough history
        assert_eq!(make_stock(&[100, 110]).trend(3), PriceTrend::Neutral);
    }

    #[test]
    fn test_realized_volatility() {
        assert_eq!(make_stock(&[1000, 1000, 1000]).realized_volatility(), 0.0);
        assert!(make_stock(&[1000, 1200, 900, 1300]).realized_volatility() > 0.1);
    }
}

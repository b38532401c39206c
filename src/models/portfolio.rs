//! Portfolio: cash plus one holding per company.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Money;

/// A position of shares in one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,

    /// Always > 0 while the holding exists
    pub shares: u32,

    /// Volume-weighted average purchase price
    pub average_price: Money,

    pub current_price: Money,
}

impl Holding {
    pub fn new(symbol: impl Into<String>, shares: u32, price: Money) -> Self {
        Self {
            symbol: symbol.into(),
            shares,
            average_price: price,
            current_price: price,
        }
    }

    pub fn current_value(&self) -> Money {
        self.current_price * Decimal::from(self.shares)
    }

    pub fn cost_basis(&self) -> Money {
        self.average_price * Decimal::from(self.shares)
    }

    pub fn unrealized_pnl(&self) -> Money {
        (self.current_price - self.average_price) * Decimal::from(self.shares)
    }

    /// Unrealized P&L as a fraction of the average price.
    pub fn unrealized_pnl_rate(&self) -> Decimal {
        if self.average_price.is_zero() {
            return Decimal::ZERO;
        }
        (self.current_price - self.average_price).amount() / self.average_price.amount()
    }

    /// Average in a new lot at `price`. Trades are checked against the
    /// share limit before they get here.
    pub fn add(&mut self, shares: u32, price: Money) {
        let total_shares = self.shares.saturating_add(shares);
        let total_cost = self.cost_basis() + price * Decimal::from(shares);

        self.average_price = total_cost / Decimal::from(total_shares);
        self.shares = total_shares;
        self.current_price = price;
    }
}

/// Cash and holdings for the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub cash: Money,

    /// Keyed by symbol. Holdings with zero shares are never kept.
    pub holdings: BTreeMap<String, Holding>,

    /// Starting cash, the baseline for profit calculations
    pub initial_cash: Money,
}

impl Portfolio {
    pub fn new(initial_cash: Money) -> Self {
        Self {
            cash: initial_cash,
            holdings: BTreeMap::new(),
            initial_cash,
        }
    }

    pub fn total_stock_value(&self) -> Money {
        self.holdings.values().map(Holding::current_value).sum()
    }

    pub fn total_assets(&self) -> Money {
        self.cash + self.total_stock_value()
    }

    pub fn profit_loss(&self) -> Money {
        self.total_assets() - self.initial_cash
    }

    pub fn profit_rate(&self) -> Decimal {
        if self.initial_cash.is_zero() {
            return Decimal::ZERO;
        }
        self.profit_loss().amount() / self.initial_cash.amount()
    }

    pub fn can_afford(&self, amount: Money) -> bool {
        self.cash >= amount
    }

    pub fn holding(&self, symbol: &str) -> Option<&Holding> {
        self.holdings.get(symbol)
    }

    /// Record bought shares and debit `cash_out` (notional plus fees).
    pub fn add_shares(&mut self, symbol: &str, shares: u32, price: Money, cash_out: Money) {
        match self.holdings.get_mut(symbol) {
            Some(holding) => holding.add(shares, price),
            None => {
                self.holdings
                    .insert(symbol.to_string(), Holding::new(symbol, shares, price));
            }
        }
        self.cash -= cash_out;
    }

    /// Remove sold shares and credit `cash_in` (notional less fees).
    ///
    /// The holding is dropped once it reaches zero shares; the average price
    /// of what remains is unchanged.
    pub fn remove_shares(&mut self, symbol: &str, shares: u32, price: Money, cash_in: Money) {
        let Some(holding) = self.holdings.get_mut(symbol) else {
            return;
        };

        if holding.shares <= shares {
            self.holdings.remove(symbol);
        } else {
            holding.shares -= shares;
            holding.current_price = price;
        }
        self.cash += cash_in;
    }

    /// Mark a holding to a new market price. No-op for symbols not held.
    pub fn update_price(&mut self, symbol: &str, price: Money) {
        if let Some(holding) = self.holdings.get_mut(symbol) {
            holding.current_price = price;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_holding_averaging() {
        let mut holding = Holding::new("CYBT", 100, Money::from_yen(1000));
        holding.add(100, Money::from_yen(1200));

        assert_eq!(holding.shares, 200);
        // (100 * 1000 + 100 * 1200) / 200 = 1100
        assert_eq!(holding.average_price, Money::from_yen(1100));
        assert_eq!(holding.current_price, Money::from_yen(1200));
        assert_eq!(holding.unrealized_pnl(), Money::from_yen(20000));
    }

    #[test]
    fn test_holding_pnl_rate() {
        let mut holding = Holding::new("FOOD", 10, Money::from_yen(800));
        holding.current_price = Money::from_yen(600);

        assert_eq!(holding.unrealized_pnl_rate(), dec!(-0.25));
        assert_eq!(holding.current_value(), Money::from_yen(6000));
    }

    #[test]
    fn test_portfolio_totals() {
        let mut portfolio = Portfolio::new(Money::from_yen(1_000_000));
        portfolio.add_shares("CYBT", 100, Money::from_yen(1000), Money::from_yen(100_100));
        portfolio.update_price("CYBT", Money::from_yen(1500));

        assert_eq!(portfolio.cash, Money::from_yen(899_900));
        assert_eq!(portfolio.total_stock_value(), Money::from_yen(150_000));
        assert_eq!(portfolio.total_assets(), Money::from_yen(1_049_900));
        assert_eq!(portfolio.profit_loss(), Money::from_yen(49_900));
        assert_eq!(portfolio.profit_rate(), dec!(0.0499));
    }

    #[test]
    fn test_remove_all_drops_holding() {
        let mut portfolio = Portfolio::new(Money::from_yen(1_000_000));
        portfolio.add_shares("RETL", 10, Money::from_yen(1100), Money::from_yen(11_000));
        portfolio.remove_shares("RETL", 10, Money::from_yen(1100), Money::from_yen(11_000));

        assert!(portfolio.holding("RETL").is_none());
        assert!(portfolio.holdings.is_empty());
        assert_eq!(portfolio.cash, Money::from_yen(1_000_000));
    }

    #[test]
    fn test_update_price_ignores_unheld() {
        let mut portfolio = Portfolio::new(Money::from_yen(1000));
        portfolio.update_price("NONE", Money::from_yen(5));
        assert!(portfolio.holdings.is_empty());
    }
}

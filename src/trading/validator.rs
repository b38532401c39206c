//! Pre-trade checks for buy and sell orders.
//!
//! Checks run in a fixed order and the first failure wins:
//! - Buy: stock unlocked, share count, holding stays countable, cash covers
//!   notional plus commission
//! - Sell: stock unlocked, share count, holding exists, enough shares held

use rust_decimal::Decimal;
use tracing::debug;

use crate::config::GameConfig;
use crate::error::{GameError, GameResult};
use crate::models::{GameState, Money, Stock};

/// Priced order that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeQuote {
    pub symbol: String,
    pub shares: u32,
    pub price_per_share: Money,

    /// shares * price_per_share
    pub notional: Money,

    pub commission: Money,
}

impl TradeQuote {
    /// Cash needed to buy: notional plus commission.
    pub fn total_cost(&self) -> Money {
        self.notional + self.commission
    }

    /// Cash received on a sale: notional less commission.
    pub fn net_proceeds(&self) -> Money {
        self.notional - self.commission
    }
}

/// Validates orders against a game state.
#[derive(Debug, Clone)]
pub struct TradeValidator {
    commission_rate: Decimal,
}

impl TradeValidator {
    pub fn new(config: &GameConfig) -> Self {
        Self::with_commission_rate(config.commission_rate)
    }

    pub fn with_commission_rate(commission_rate: Decimal) -> Self {
        Self { commission_rate }
    }

    /// Commission owed on a notional amount.
    pub fn commission_for(&self, notional: Money) -> Money {
        notional * self.commission_rate
    }

    /// Price `shares` of a stock at its current price.
    pub fn quote(&self, stock: &Stock, shares: u32) -> TradeQuote {
        let notional = stock.current_price * Decimal::from(shares);
        TradeQuote {
            symbol: stock.symbol().to_string(),
            shares,
            price_per_share: stock.current_price,
            notional,
            commission: self.commission_for(notional),
        }
    }

    /// Check a buy order and price it.
    pub fn validate_buy(
        &self,
        state: &GameState,
        symbol: &str,
        shares: u32,
    ) -> GameResult<TradeQuote> {
        let stock = Self::available_stock(state, symbol)?;
        Self::check_shares(shares)?;

        if let Some(holding) = state.portfolio.holding(symbol) {
            if holding.shares.checked_add(shares).is_none() {
                return Err(GameError::HoldingLimit {
                    symbol: symbol.to_string(),
                    held: holding.shares,
                    requested: shares,
                });
            }
        }

        let quote = self.quote(stock, shares);
        let required = quote.total_cost();
        let available = state.portfolio.cash;
        if !state.portfolio.can_afford(required) {
            debug!(
                symbol = %symbol,
                required = %required.amount(),
                available = %available.amount(),
                "Buy rejected"
            );
            return Err(GameError::InsufficientCash {
                required,
                available,
                shortfall: required - available,
            });
        }

        Ok(quote)
    }

    /// Check a sell order and price it.
    pub fn validate_sell(
        &self,
        state: &GameState,
        symbol: &str,
        shares: u32,
    ) -> GameResult<TradeQuote> {
        let stock = Self::available_stock(state, symbol)?;
        Self::check_shares(shares)?;

        let holding = state
            .portfolio
            .holding(symbol)
            .ok_or_else(|| GameError::NoHolding(symbol.to_string()))?;
        if holding.shares < shares {
            return Err(GameError::InsufficientShares {
                symbol: symbol.to_string(),
                held: holding.shares,
                requested: shares,
            });
        }

        Ok(self.quote(stock, shares))
    }

    fn available_stock<'a>(state: &'a GameState, symbol: &str) -> GameResult<&'a Stock> {
        state
            .unlocked_stock(symbol)
            .ok_or_else(|| GameError::StockNotAvailable(symbol.to_string()))
    }

    fn check_shares(shares: u32) -> GameResult<()> {
        if shares == 0 {
            return Err(GameError::InvalidShares(shares));
        }
        Ok(())
    }
}

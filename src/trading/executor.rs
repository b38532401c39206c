//! Trade execution: turns a validated order into a new game state and a
//! transaction record.

use rust_decimal::Decimal;
use tracing::info;

use crate::config::GameConfig;
use crate::error::GameResult;
use crate::models::{GameState, Money, Transaction, TransactionType};

use super::validator::{TradeQuote, TradeValidator};

/// Result of an executed trade.
#[derive(Debug, Clone)]
pub struct TradeOutcome {
    /// State after the trade
    pub state: GameState,

    pub transaction: Transaction,

    /// `shares * (price - average cost)` for sells, zero for buys
    pub realized_pnl: Money,

    /// Sell above average cost
    pub is_winning: bool,
}

/// Executes buys and sells against a game state.
///
/// The input state is never modified. On any validation failure the error is
/// returned and the caller keeps its current state.
#[derive(Debug, Clone)]
pub struct TradeExecutor {
    validator: TradeValidator,
}

impl TradeExecutor {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            validator: TradeValidator::new(config),
        }
    }

    /// Buy `shares` of `symbol` at the current price.
    pub fn buy(
        &self,
        state: &GameState,
        symbol: &str,
        shares: u32,
        timestamp: i64,
    ) -> GameResult<TradeOutcome> {
        let quote = self.validator.validate_buy(state, symbol, shares)?;

        let mut next = state.clone();
        next.portfolio
            .add_shares(symbol, shares, quote.price_per_share, quote.total_cost());
        next.record_trade(false);

        let transaction = Self::record(&quote, TransactionType::Buy, timestamp, state.current_day);

        info!(
            symbol = %symbol,
            shares = shares,
            price = %quote.price_per_share,
            cost = %quote.total_cost(),
            "Bought"
        );

        Ok(TradeOutcome {
            state: next,
            transaction,
            realized_pnl: Money::ZERO,
            is_winning: false,
        })
    }

    /// Sell `shares` of `symbol` at the current price.
    pub fn sell(
        &self,
        state: &GameState,
        symbol: &str,
        shares: u32,
        timestamp: i64,
    ) -> GameResult<TradeOutcome> {
        let quote = self.validator.validate_sell(state, symbol, shares)?;

        // validate_sell guarantees the holding exists
        let average_price = state
            .portfolio
            .holding(symbol)
            .map(|h| h.average_price)
            .unwrap_or(quote.price_per_share);
        let realized_pnl = (quote.price_per_share - average_price) * Decimal::from(shares);
        let is_winning = quote.price_per_share > average_price;

        let mut next = state.clone();
        next.portfolio
            .remove_shares(symbol, shares, quote.price_per_share, quote.net_proceeds());
        next.record_trade(is_winning);

        let transaction = Self::record(&quote, TransactionType::Sell, timestamp, state.current_day);

        info!(
            symbol = %symbol,
            shares = shares,
            price = %quote.price_per_share,
            proceeds = %quote.net_proceeds(),
            pnl = %realized_pnl.format_with_sign(),
            winning = is_winning,
            "Sold"
        );

        Ok(TradeOutcome {
            state: next,
            transaction,
            realized_pnl,
            is_winning,
        })
    }

    fn record(quote: &TradeQuote, kind: TransactionType, timestamp: i64, day: u32) -> Transaction {
        Transaction {
            id: Transaction::generate_id(),
            symbol: quote.symbol.clone(),
            kind,
            shares: quote.shares,
            price_per_share: quote.price_per_share,
            notional: quote.notional,
            commission: quote.commission,
            timestamp,
            day,
        }
    }
}

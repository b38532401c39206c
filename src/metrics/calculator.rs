//! Calculator for game statistics: per-symbol P&L, win rate, frequency,
//! diversification.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use statrs::statistics::Statistics;

use crate::models::{
    GameState, GameStatistics, Money, StockPerformance, Transaction, TransactionType,
};

/// Running position while replaying the log for one symbol.
#[derive(Debug, Default)]
struct Replay {
    shares: u64,
    average_cost: Money,
    realized: Money,
    bought_notional: Money,
    trades: u32,
    winning: u32,
}

impl Replay {
    fn apply(&mut self, transaction: &Transaction) {
        let price = transaction.price_per_share;
        self.trades += 1;

        match transaction.kind {
            TransactionType::Buy => {
                let total_shares = self.shares + u64::from(transaction.shares);
                if total_shares > 0 {
                    let total_cost = self.average_cost * Decimal::from(self.shares)
                        + price * Decimal::from(transaction.shares);
                    self.average_cost = total_cost / Decimal::from(total_shares);
                }
                self.shares = total_shares;
                self.bought_notional += transaction.notional;
            }
            TransactionType::Sell => {
                self.realized += (price - self.average_cost) * Decimal::from(transaction.shares);
                if price > self.average_cost {
                    self.winning += 1;
                }
                self.shares = self.shares.saturating_sub(u64::from(transaction.shares));
                if self.shares == 0 {
                    self.average_cost = Money::ZERO;
                }
            }
        }
    }
}

/// Calculator for computing game statistics.
pub struct StatisticsCalculator;

impl StatisticsCalculator {
    /// Build the report from the current state and the full transaction log
    /// in execution order.
    pub fn calculate(state: &GameState, transactions: &[Transaction]) -> GameStatistics {
        let portfolio = &state.portfolio;
        let notionals: Vec<f64> = transactions.iter().map(|t| t.notional.to_f64()).collect();
        let (average_trade_size, trade_size_std_dev) = Self::trade_size_stats(notionals);

        GameStatistics {
            total_assets: portfolio.total_assets(),
            initial_assets: portfolio.initial_cash,
            profit_loss: portfolio.profit_loss(),
            profit_rate: portfolio.profit_rate(),
            total_trades: state.total_trades,
            winning_trades: state.winning_trades,
            win_rate: state.win_rate(),
            current_day: state.current_day,
            max_days: state.max_days,
            stock_performances: Self::stock_performances(state, transactions),
            trading_frequency: Self::trading_frequency(transactions.len(), state.current_day),
            diversification: Self::diversification(state),
            average_trade_size,
            trade_size_std_dev,
        }
    }

    /// Per-symbol performance, best profit rate first.
    pub fn stock_performances(
        state: &GameState,
        transactions: &[Transaction],
    ) -> Vec<StockPerformance> {
        let mut replays: BTreeMap<&str, Replay> = BTreeMap::new();
        for transaction in transactions {
            replays
                .entry(transaction.symbol.as_str())
                .or_default()
                .apply(transaction);
        }
        for symbol in state.portfolio.holdings.keys() {
            replays.entry(symbol.as_str()).or_default();
        }

        let mut performances: Vec<StockPerformance> = replays
            .into_iter()
            .map(|(symbol, replay)| {
                let holding = state.portfolio.holding(symbol);
                let unrealized = holding.map(|h| h.unrealized_pnl()).unwrap_or(Money::ZERO);
                let total = replay.realized + unrealized;
                let profit_rate = if replay.bought_notional.is_zero() {
                    Decimal::ZERO
                } else {
                    total.amount() / replay.bought_notional.amount()
                };

                StockPerformance {
                    symbol: symbol.to_string(),
                    total_profit_loss: total,
                    realized_profit_loss: replay.realized,
                    unrealized_profit_loss: unrealized,
                    profit_rate,
                    total_trades: replay.trades,
                    winning_trades: replay.winning,
                    current_holding: holding.map(|h| h.shares).unwrap_or(0),
                }
            })
            .collect();

        performances.sort_by(|a, b| b.profit_rate.cmp(&a.profit_rate));
        performances
    }

    /// Transactions per elapsed day.
    pub fn trading_frequency(transaction_count: usize, current_day: u32) -> f64 {
        if current_day == 0 {
            return 0.0;
        }
        transaction_count as f64 / current_day as f64
    }

    /// `1 - sum(weight^2)` over holding values; 0 when nothing is held.
    pub fn diversification(state: &GameState) -> f64 {
        let values: Vec<f64> = state
            .portfolio
            .holdings
            .values()
            .map(|h| h.current_value().to_f64())
            .collect();
        let total: f64 = values.iter().sum();

        if total <= 0.0 {
            return 0.0;
        }

        let concentration: f64 = values.iter().map(|v| (v / total).powi(2)).sum();
        1.0 - concentration
    }

    /// Mean and sample std-dev of trade notionals.
    fn trade_size_stats(notionals: Vec<f64>) -> (f64, f64) {
        match notionals.len() {
            0 => (0.0, 0.0),
            1 => (notionals[0], 0.0),
            _ => {
                let mean = notionals.clone().mean();
                let std_dev = notionals.std_dev();
                (mean, std_dev)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, GameStatus, Portfolio};
    use rust_decimal_macros::dec;

    fn make_state(day: u32) -> GameState {
        GameState {
            current_day: day,
            max_days: 30,
            portfolio: Portfolio::new(Money::from_yen(1_000_000)),
            stocks: vec![],
            unlocked_companies: Default::default(),
            status: GameStatus::InProgress,
            difficulty: Difficulty::Normal,
            total_trades: 0,
            winning_trades: 0,
        }
    }

    fn trade(symbol: &str, kind: TransactionType, shares: u32, price: i64) -> Transaction {
        let notional = Money::from_yen(price) * Decimal::from(shares);
        Transaction {
            id: Transaction::generate_id(),
            symbol: symbol.to_string(),
            kind,
            shares,
            price_per_share: Money::from_yen(price),
            notional,
            commission: notional * dec!(0.001),
            timestamp: 0,
            day: 1,
        }
    }

    #[test]
    fn test_realized_pnl_uses_running_average() {
        let mut state = make_state(4);
        state
            .portfolio
            .add_shares("CYBT", 100, Money::from_yen(1100), Money::ZERO);
        state.portfolio.update_price("CYBT", Money::from_yen(1300));

        let log = vec![
            trade("CYBT", TransactionType::Buy, 100, 1000),
            trade("CYBT", TransactionType::Buy, 100, 1200), // avg 1100
            trade("CYBT", TransactionType::Sell, 100, 1000), // -10,000, losing
        ];

        let perfs = StatisticsCalculator::stock_performances(&state, &log);
        assert_eq!(perfs.len(), 1);

        let cybt = &perfs[0];
        assert_eq!(cybt.realized_profit_loss, Money::from_yen(-10_000));
        // 100 * (1300 - 1100)
        assert_eq!(cybt.unrealized_profit_loss, Money::from_yen(20_000));
        assert_eq!(cybt.total_profit_loss, Money::from_yen(10_000));
        // 10,000 / 220,000 bought
        assert!((cybt.profit_rate - dec!(0.0454545)).abs() < dec!(0.000001));
        assert_eq!(cybt.total_trades, 3);
        assert_eq!(cybt.winning_trades, 0);
        assert_eq!(cybt.current_holding, 100);
    }

    #[test]
    fn test_performances_sorted_best_first() {
        let state = make_state(2);
        let log = vec![
            trade("FOOD", TransactionType::Buy, 10, 800),
            trade("FOOD", TransactionType::Sell, 10, 700),
            trade("ENTM", TransactionType::Buy, 10, 780),
            trade("ENTM", TransactionType::Sell, 10, 900),
        ];

        let perfs = StatisticsCalculator::stock_performances(&state, &log);
        let order: Vec<_> = perfs.iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(order, vec!["ENTM", "FOOD"]);
        assert_eq!(perfs[0].winning_trades, 1);
        assert_eq!(perfs[0].current_holding, 0);
    }

    #[test]
    fn test_diversification() {
        let mut state = make_state(1);
        assert_eq!(StatisticsCalculator::diversification(&state), 0.0);

        state
            .portfolio
            .add_shares("CYBT", 10, Money::from_yen(1000), Money::ZERO);
        assert!(StatisticsCalculator::diversification(&state).abs() < 1e-12);

        state
            .portfolio
            .add_shares("FOOD", 10, Money::from_yen(1000), Money::ZERO);
        assert!((StatisticsCalculator::diversification(&state) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_full_report() {
        let mut state = make_state(5);
        state.total_trades = 4;
        state.winning_trades = 1;
        let log = vec![
            trade("FOOD", TransactionType::Buy, 10, 800),
            trade("FOOD", TransactionType::Sell, 10, 900),
            trade("RETL", TransactionType::Buy, 10, 1000),
            trade("RETL", TransactionType::Sell, 10, 1000),
        ];

        let stats = StatisticsCalculator::calculate(&state, &log);
        assert_eq!(stats.trading_frequency, 0.8);
        assert_eq!(stats.win_rate, 0.25);
        assert_eq!(stats.initial_assets, Money::from_yen(1_000_000));
        assert_eq!(stats.stock_performances.len(), 2);
        // 8000, 9000, 10000, 10000
        assert!((stats.average_trade_size - 9250.0).abs() < 1e-9);
        assert!(stats.trade_size_std_dev > 0.0);
        assert!(stats.to_string().contains("FOOD"));
    }

    #[test]
    fn test_replay_handles_share_counts_past_u32() {
        let state = make_state(1);
        let log = vec![
            trade("CYBT", TransactionType::Buy, u32::MAX, 1),
            trade("CYBT", TransactionType::Buy, u32::MAX, 3),
            trade("CYBT", TransactionType::Sell, 10, 4),
        ];

        let perfs = StatisticsCalculator::stock_performances(&state, &log);
        // Sold at 4 against an average of 2
        assert_eq!(perfs[0].realized_profit_loss, Money::from_yen(20));
        assert_eq!(perfs[0].winning_trades, 1);
    }

    #[test]
    fn test_empty_log() {
        let state = make_state(1);
        let stats = StatisticsCalculator::calculate(&state, &[]);
        assert_eq!(stats.trading_frequency, 0.0);
        assert_eq!(stats.average_trade_size, 0.0);
        assert_eq!(stats.trade_size_std_dev, 0.0);
        assert!(stats.stock_performances.is_empty());
    }
}

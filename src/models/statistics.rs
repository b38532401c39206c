//! End-of-game report: profit, win rate, per-symbol performance, diversification.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::Money;

/// Per-symbol trading performance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPerformance {
    pub symbol: String,

    /// Realized plus unrealized P&L
    pub total_profit_loss: Money,

    pub realized_profit_loss: Money,
    pub unrealized_profit_loss: Money,

    /// Total P&L over total bought notional
    pub profit_rate: Decimal,

    pub total_trades: u32,

    /// Sells above the running average cost
    pub winning_trades: u32,

    /// Shares still held
    pub current_holding: u32,
}

impl StockPerformance {
    pub fn win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            return 0.0;
        }
        self.winning_trades as f64 / self.total_trades as f64
    }
}

/// Rating tier for the player's overall result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvestmentRating {
    Legendary,
    Excellent,
    Good,
    Average,
    Beginner,
}

impl InvestmentRating {
    pub fn display_name(&self) -> &'static str {
        match self {
            InvestmentRating::Legendary => "Legendary Investor",
            InvestmentRating::Excellent => "Excellent Investor",
            InvestmentRating::Good => "Solid Investor",
            InvestmentRating::Average => "Average Investor",
            InvestmentRating::Beginner => "Beginner Investor",
        }
    }

    pub fn stars(&self) -> u8 {
        match self {
            InvestmentRating::Legendary => 5,
            InvestmentRating::Excellent => 4,
            InvestmentRating::Good => 3,
            InvestmentRating::Average => 2,
            InvestmentRating::Beginner => 1,
        }
    }
}

/// Aggregated statistics for a game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStatistics {
    pub total_assets: Money,
    pub initial_assets: Money,
    pub profit_loss: Money,
    pub profit_rate: Decimal,

    pub total_trades: u32,
    pub winning_trades: u32,
    pub win_rate: f64,

    pub current_day: u32,
    pub max_days: u32,

    /// Sorted by profit rate, best first
    pub stock_performances: Vec<StockPerformance>,

    /// Transactions per elapsed day
    pub trading_frequency: f64,

    /// 1 - Herfindahl index of holding weights (0 = concentrated)
    pub diversification: f64,

    /// Mean and sample std-dev of per-transaction notional
    pub average_trade_size: f64,
    pub trade_size_std_dev: f64,
}

impl GameStatistics {
    pub fn investment_rating(&self) -> InvestmentRating {
        let p = self.profit_rate;
        let w = self.win_rate;

        if p >= dec!(1.0) && w >= 0.8 {
            InvestmentRating::Legendary
        } else if p >= dec!(0.5) && w >= 0.7 {
            InvestmentRating::Excellent
        } else if p >= dec!(0.25) && w >= 0.6 {
            InvestmentRating::Good
        } else if p >= Decimal::ZERO && w >= 0.5 {
            InvestmentRating::Average
        } else {
            InvestmentRating::Beginner
        }
    }
}

impl std::fmt::Display for GameStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rating = self.investment_rating();

        writeln!(
            f,
            "=== Game Statistics (day {}/{}) ===",
            self.current_day, self.max_days
        )?;
        writeln!(f, "Total Assets:     {}", self.total_assets)?;
        writeln!(f, "Initial Assets:   {}", self.initial_assets)?;
        writeln!(
            f,
            "Profit/Loss:      {} ({:+.2}%)",
            self.profit_loss.format_with_sign(),
            self.profit_rate * dec!(100)
        )?;
        writeln!(
            f,
            "Trades:           {} (winning: {}, win rate {:.1}%)",
            self.total_trades,
            self.winning_trades,
            self.win_rate * 100.0
        )?;
        writeln!(f, "Trades per Day:   {:.2}", self.trading_frequency)?;
        writeln!(
            f,
            "Avg Trade Size:   ¥{:.0} (σ ¥{:.0})",
            self.average_trade_size, self.trade_size_std_dev
        )?;
        writeln!(f, "Diversification:  {:.3}", self.diversification)?;
        writeln!(
            f,
            "Rating:           {} {}",
            rating.display_name(),
            "*".repeat(rating.stars() as usize)
        )?;

        if !self.stock_performances.is_empty() {
            writeln!(f, "\n--- Per-Symbol Performance ---")?;
            for perf in &self.stock_performances {
                writeln!(
                    f,
                    "  {:<6} P&L {:>12} ({:+.1}%)  trades {:>3}  wins {:>3} ({:>3.0}%)  held {:>5}",
                    perf.symbol,
                    perf.total_profit_loss.format_with_sign(),
                    perf.profit_rate * dec!(100),
                    perf.total_trades,
                    perf.winning_trades,
                    perf.win_rate() * 100.0,
                    perf.current_holding
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_stats(profit_rate: Decimal, win_rate: f64) -> GameStatistics {
        GameStatistics {
            total_assets: Money::ZERO,
            initial_assets: Money::ZERO,
            profit_loss: Money::ZERO,
            profit_rate,
            total_trades: 10,
            winning_trades: 0,
            win_rate,
            current_day: 30,
            max_days: 30,
            stock_performances: vec![],
            trading_frequency: 0.0,
            diversification: 0.0,
            average_trade_size: 0.0,
            trade_size_std_dev: 0.0,
        }
    }

    #[test]
    fn test_investment_rating_tiers() {
        assert_eq!(
            make_stats(dec!(1.2), 0.85).investment_rating(),
            InvestmentRating::Legendary
        );
        assert_eq!(
            make_stats(dec!(1.2), 0.75).investment_rating(),
            InvestmentRating::Excellent
        );
        assert_eq!(
            make_stats(dec!(0.3), 0.65).investment_rating(),
            InvestmentRating::Good
        );
        assert_eq!(
            make_stats(dec!(0.0), 0.5).investment_rating(),
            InvestmentRating::Average
        );
        assert_eq!(
            make_stats(dec!(-0.1), 0.9).investment_rating(),
            InvestmentRating::Beginner
        );
        assert_eq!(
            make_stats(dec!(0.6), 0.4).investment_rating(),
            InvestmentRating::Beginner
        );
    }

    #[test]
    fn test_symbol_row_shows_win_rate() {
        let perf = StockPerformance {
            symbol: "FOOD".into(),
            total_profit_loss: Money::from_yen(1000),
            realized_profit_loss: Money::from_yen(1000),
            unrealized_profit_loss: Money::ZERO,
            profit_rate: dec!(0.125),
            total_trades: 4,
            winning_trades: 1,
            current_holding: 0,
        };
        assert_eq!(perf.win_rate(), 0.25);

        let mut stats = make_stats(dec!(0.1), 0.25);
        stats.stock_performances = vec![perf];
        let report = stats.to_string();
        assert!(report.contains("wins   1 ( 25%)"));
    }
}

//! Stock Trading Simulation Game
//!
//! Single-player market simulation: trade a small universe of companies over
//! a fixed number of days while prices move on random walks and daily news.

mod config;
mod db;
mod error;
mod game;
mod market;
mod metrics;
mod models;
mod trading;

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rust_decimal_macros::dec;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::GameConfig;
use crate::db::Database;
use crate::error::GameError;
use crate::game::{AutoRunner, GameSession, StopReason};
use crate::models::{Difficulty, GameState};

/// Stock trading simulation CLI.
#[derive(Parser)]
#[command(name = "stocksim")]
#[command(about = "Trade a simulated stock market over a fixed number of days", long_about = None)]
struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "sqlite:./stocksim.db?mode=rwc")]
    database: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Seed for prices and news (random if omitted)
    #[arg(short, long, env = "STOCKSIM_SEED")]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new game, replacing any saved one
    New {
        /// Difficulty (easy, normal, hard)
        #[arg(short, long, default_value = "normal")]
        difficulty: Difficulty,
    },

    /// Show day, cash and holdings
    Status,

    /// Show current prices
    Market,

    /// Buy shares at the current price
    Buy {
        symbol: String,
        shares: u32,
    },

    /// Sell shares at the current price
    Sell {
        symbol: String,
        shares: u32,
    },

    /// Advance to the next day
    Next,

    /// Advance automatically until the game ends (Ctrl+C to stop)
    Run {
        /// Seconds between days
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Show game statistics
    Stats,

    /// Show saved price history for a symbol
    History {
        symbol: String,

        /// Number of points to show
        #[arg(short, long, default_value = "30")]
        limit: i64,
    },

    /// Show the transaction log
    Trades {
        /// Only this symbol
        symbol: Option<String>,

        /// Only trades made on this day
        #[arg(short, long)]
        day: Option<u32>,
    },

    /// Show news for a day (defaults to today)
    News {
        day: Option<u32>,
    },

    /// Delete saved price history older than some days
    Prune {
        /// Keep this many days of history
        #[arg(short, long, default_value = "30")]
        keep_days: i64,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = GameConfig::from_env()?;

    if let Err(e) = run(cli, config).await {
        // Rule violations are normal play, not failures
        match e.downcast_ref::<GameError>() {
            Some(game_error) if game_error.is_validation() => {
                println!("Cannot do that: {}", game_error);
                if matches!(game_error, GameError::NoSavedGame) {
                    println!("Start one with 'stocksim new'.");
                }
            }
            _ => return Err(e),
        }
    }

    Ok(())
}

async fn run(cli: Cli, config: GameConfig) -> Result<()> {
    if let Commands::Config = cli.command {
        println!("\n=== Configuration ===");
        println!("Database:  {}", cli.database);
        let seed = match cli.seed {
            Some(seed) => seed.to_string(),
            None => "random".to_string(),
        };
        println!("Seed:      {}", seed);
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let db = Database::new(&cli.database).await?;

    if let Commands::New { difficulty } = cli.command {
        let session = GameSession::start_new(config, db, difficulty, cli.seed).await?;
        let state = session.state();

        println!("\n=== New Game ({}) ===", difficulty);
        println!("Cash:      {}", state.portfolio.cash);
        println!("Days:      {}", state.max_days);
        println!(
            "Commission: {}%",
            session.config().commission_rate * dec!(100)
        );
        print_market(state);
        return Ok(());
    }

    let mut session = GameSession::load(config, db, cli.seed).await?;

    match cli.command {
        Commands::Status => print_status(session.state()),

        Commands::Market => print_market(session.state()),

        Commands::Buy { symbol, shares } => {
            let symbol = symbol.to_uppercase();
            let outcome = session.buy(&symbol, shares).await?;
            let t = &outcome.transaction;

            println!(
                "Bought {} {} @ {} = {} (commission {})",
                t.shares,
                t.symbol,
                t.price_per_share,
                t.total_cost(),
                t.commission
            );
            println!("Cash left: {}", outcome.state.portfolio.cash);
        }

        Commands::Sell { symbol, shares } => {
            let symbol = symbol.to_uppercase();
            let outcome = session.sell(&symbol, shares).await?;
            let t = &outcome.transaction;

            println!(
                "Sold {} {} @ {} for {} (commission {})",
                t.shares,
                t.symbol,
                t.price_per_share,
                t.notional - t.commission,
                t.commission
            );
            println!(
                "Realized P&L: {} {}",
                outcome.realized_pnl.format_with_sign(),
                if outcome.is_winning { "(win)" } else { "" }
            );
            println!("Cash now: {}", outcome.state.portfolio.cash);
        }

        Commands::Next => {
            let outcome = session.next_day().await?;
            let state = &outcome.state;

            println!("\n=== Day {}/{} ===", state.current_day, state.max_days);
            for event in &outcome.news {
                println!(
                    "  [{}] {:<11} {}",
                    event.formatted_time(),
                    event.news_type.as_str(),
                    event.title
                );
            }
            if !outcome.unlocked.is_empty() {
                println!("\nUnlocked: {}", outcome.unlocked.join(", "));
            }
            print_market(state);

            if state.is_game_over() {
                println!("\nGame over!");
                println!("{}", session.statistics().await?);
            }
        }

        Commands::Run { interval } => {
            let secs = interval
                .unwrap_or(session.config().tick_interval_secs)
                .max(1);
            info!(interval = secs, "Starting auto-play");

            let runner = AutoRunner::new(Duration::from_secs(secs));
            let reason = runner.run(&mut session).await;

            if reason == StopReason::GameOver {
                println!("\nGame over!");
                println!("{}", session.statistics().await?);
            } else {
                println!("\nStopped on day {}.", session.state().current_day);
            }
        }

        Commands::Stats => {
            println!("{}", session.statistics().await?);
        }

        Commands::History { symbol, limit } => {
            let symbol = symbol.to_uppercase();
            let points = session.price_history(&symbol, limit).await?;

            if let Some(stock) = session.state().stock(&symbol) {
                println!("\n=== {} {} ===", stock.symbol(), stock.company.name);
                println!(
                    "Last: {}   change {}",
                    stock.current_price,
                    stock.change_amount().format_with_sign()
                );
                println!(
                    "7-day range: {} - {}   trend {}   volatility {:.2}%",
                    stock.lowest_price(7),
                    stock.highest_price(7),
                    stock.trend(3).arrow(),
                    stock.realized_volatility() * 100.0
                );
            }

            println!("\n{:<20} {:>14}", "TIME", "PRICE");
            println!("{}", "-".repeat(35));
            for point in points {
                println!(
                    "{:<20} {:>14}",
                    format_timestamp(point.timestamp),
                    point.price
                );
            }
        }

        Commands::Trades { symbol, day } => {
            let symbol = symbol.map(|s| s.to_uppercase());
            let transactions = session.transactions(symbol.as_deref(), day).await?;

            if transactions.is_empty() {
                println!("No trades yet.");
                return Ok(());
            }

            println!(
                "\n{:>4} {:>6} {:<5} {:<6} {:>7} {:>12} {:>14} {:>10} {:>15}",
                "DAY", "TIME", "TYPE", "SYMBOL", "SHARES", "PRICE", "NOTIONAL", "FEE", "CASH"
            );
            println!("{}", "-".repeat(88));
            for t in transactions {
                println!(
                    "{:>4} {:>6} {:<5} {:<6} {:>7} {:>12} {:>14} {:>10} {:>15}",
                    t.day,
                    t.formatted_time(),
                    t.kind,
                    t.symbol,
                    t.shares,
                    t.price_per_share,
                    t.notional,
                    t.commission,
                    t.cash_delta().format_with_sign()
                );
            }
        }

        Commands::News { day } => {
            let day = day.unwrap_or(session.state().current_day);
            let news = session.news_for_day(day).await?;

            if news.is_empty() {
                println!("No news on day {}.", day);
                return Ok(());
            }

            println!("\n=== News, day {} ===", day);
            for event in news {
                println!("[{}] {}", event.formatted_time(), event.title);
                println!("    {}", event.description);
                println!(
                    "    {} | affects {}",
                    event.news_type.as_str(),
                    event.affected_companies.join(", ")
                );
            }
        }

        Commands::Prune { keep_days } => {
            let cutoff = prune_cutoff(Utc::now().timestamp(), keep_days);
            let removed = session.prune_history(cutoff).await?;
            println!("Removed {} price points.", removed);
        }

        Commands::New { .. } | Commands::Config => {}
    }

    Ok(())
}

fn print_status(state: &GameState) {
    let portfolio = &state.portfolio;

    println!(
        "\n=== Day {}/{} ({}) ===",
        state.current_day, state.max_days, state.difficulty
    );
    println!("Cash:          {}", portfolio.cash);
    println!("Stock Value:   {}", portfolio.total_stock_value());
    println!("Total Assets:  {}", portfolio.total_assets());
    println!(
        "Profit/Loss:   {} ({:+.2}%)",
        portfolio.profit_loss().format_with_sign(),
        portfolio.profit_rate() * dec!(100)
    );
    println!("Level:         {}", state.player_level());
    println!(
        "Tradable:      {}/{} stocks",
        state.unlocked_stocks().count(),
        state.stocks.len()
    );
    println!(
        "Trades:        {} (win rate {:.1}%)",
        state.total_trades,
        state.win_rate() * 100.0
    );
    println!("Days Left:     {}", state.remaining_days());

    if portfolio.holdings.is_empty() {
        println!("\nNo holdings.");
        return;
    }

    println!(
        "\n{:<6} {:>7} {:>12} {:>12} {:>14} {:>14} {:>8}",
        "SYMBOL", "SHARES", "AVG", "PRICE", "VALUE", "P&L", "P&L%"
    );
    println!("{}", "-".repeat(79));
    for holding in portfolio.holdings.values() {
        println!(
            "{:<6} {:>7} {:>12} {:>12} {:>14} {:>14} {:>7.2}%",
            holding.symbol,
            holding.shares,
            holding.average_price,
            holding.current_price,
            holding.current_value(),
            holding.unrealized_pnl().format_with_sign(),
            holding.unrealized_pnl_rate() * dec!(100)
        );
    }
}

fn print_market(state: &GameState) {
    println!(
        "\n{:<6} {:<20} {:<14} {:<6} {:>12} {:>9} {:>5}",
        "SYMBOL", "NAME", "SECTOR", "VOL", "PRICE", "CHANGE", "TREND"
    );
    println!("{}", "-".repeat(78));

    for stock in &state.stocks {
        let company = &stock.company;
        if !state.is_unlocked(stock.symbol()) {
            println!(
                "{:<6} {:<20} {:<14} locked until level {}",
                company.symbol,
                truncate(&company.name, 20),
                company.category.display_name(),
                company.unlock_level
            );
            continue;
        }

        let marker = if stock.is_positive_change() {
            "+"
        } else if stock.is_negative_change() {
            "-"
        } else {
            " "
        };
        println!(
            "{:<6} {:<20} {:<14} {:<6} {:>12} {}{:>7.2}% {:>5}",
            company.symbol,
            truncate(&company.name, 20),
            company.category.display_name(),
            company.volatility.as_str(),
            stock.current_price,
            marker,
            (stock.change_rate() * dec!(100)).abs(),
            stock.trend(3).arrow()
        );
    }
}

/// Oldest timestamp kept when pruning `keep_days` of history before `now`.
fn prune_cutoff(now: i64, keep_days: i64) -> i64 {
    now.saturating_sub(keep_days.max(0).saturating_mul(86_400))
}

fn format_timestamp(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_cutoff() {
        assert_eq!(prune_cutoff(1_000_000, 2), 1_000_000 - 172_800);
        assert_eq!(prune_cutoff(1_000_000, -3), 1_000_000);
        // keep_days * 86_400 overflows
        assert_eq!(prune_cutoff(0, i64::MAX / 1000), -i64::MAX);
        assert_eq!(prune_cutoff(i64::MIN + 5, 1), i64::MIN);
    }
}

//! SQLite persistence for the game.
//!
//! Stores everything needed to resume a game:
//! - Full game state snapshot (single row)
//! - Current stock prices and price history
//! - Transaction log
//! - Daily news log
//!
//! Every game operation is written in a single SQL transaction, so the log
//! and the snapshot never disagree.

use std::str::FromStr;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use sqlx::{sqlite::SqlitePoolOptions, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{GameError, GameResult};
use crate::models::{
    GameState, MarketImpact, Money, NewsEvent, NewsType, PricePoint, Stock, Transaction,
    TransactionType,
};

/// Database connection pool.
pub struct Database {
    pool: SqlitePool,
}

/// Stored stock price row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredStock {
    pub symbol: String,
    pub current_price: String,
}

/// Stored transaction row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredTransaction {
    pub id: String,
    pub symbol: String,
    pub kind: String,
    pub shares: i64,
    pub price_per_share: String,
    pub notional: String,
    pub commission: String,
    pub timestamp: i64,
    pub day: i64,
}

/// Stored news row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredNewsEvent {
    pub id: String,
    pub day: i64,
    pub title: String,
    pub description: String,
    pub affected_companies: String,
    pub news_type: String,
    pub min_change: f64,
    pub max_change: f64,
    pub probability: f64,
    pub occurred_at: i64,
}

fn parse_money(raw: &str) -> Result<Money> {
    Decimal::from_str(raw)
        .map(Money::new)
        .with_context(|| format!("Invalid stored amount: {}", raw))
}

fn parse_news_type(raw: &str) -> Result<NewsType> {
    match raw {
        "POSITIVE" => Ok(NewsType::Positive),
        "NEGATIVE" => Ok(NewsType::Negative),
        "NEUTRAL" => Ok(NewsType::Neutral),
        "MARKET_WIDE" => Ok(NewsType::MarketWide),
        other => anyhow::bail!("Invalid stored news type: {}", other),
    }
}

impl StoredStock {
    pub fn current_price(&self) -> Result<Money> {
        parse_money(&self.current_price)
    }
}

impl TryFrom<StoredTransaction> for Transaction {
    type Error = anyhow::Error;

    fn try_from(row: StoredTransaction) -> Result<Self> {
        Ok(Transaction {
            kind: row.kind.parse::<TransactionType>()?,
            shares: u32::try_from(row.shares).context("Invalid stored share count")?,
            price_per_share: parse_money(&row.price_per_share)?,
            notional: parse_money(&row.notional)?,
            commission: parse_money(&row.commission)?,
            day: u32::try_from(row.day).context("Invalid stored day")?,
            timestamp: row.timestamp,
            symbol: row.symbol,
            id: row.id,
        })
    }
}

impl TryFrom<StoredNewsEvent> for NewsEvent {
    type Error = anyhow::Error;

    fn try_from(row: StoredNewsEvent) -> Result<Self> {
        Ok(NewsEvent {
            affected_companies: serde_json::from_str(&row.affected_companies)
                .context("Invalid stored affected companies")?,
            news_type: parse_news_type(&row.news_type)?,
            impact: MarketImpact::new(row.min_change, row.max_change, row.probability),
            occurred_at: u32::try_from(row.occurred_at).context("Invalid stored news time")?,
            day: u32::try_from(row.day).context("Invalid stored day")?,
            title: row.title,
            description: row.description,
            id: row.id,
        })
    }
}

impl Database {
    /// Create a new database connection and run migrations.
    pub async fn new(database_url: &str) -> Result<Self> {
        // Every connection to an in-memory database sees its own empty database
        let max_connections = if database_url.contains(":memory:") {
            1
        } else {
            5
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .with_context(|| format!("Failed to connect to database {}", database_url))?;

        let db = Self { pool };
        db.run_migrations()
            .await
            .context("Failed to run migrations")?;

        Ok(db)
    }

    /// Run all database migrations.
    async fn run_migrations(&self) -> Result<()> {
        // Current prices
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stocks (
                symbol TEXT PRIMARY KEY,
                current_price TEXT NOT NULL,
                previous_price TEXT NOT NULL,
                last_updated INTEGER NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Price history
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS price_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                price TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Game state snapshot
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS game_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                state_json TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Transaction log
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id TEXT PRIMARY KEY,
                symbol TEXT NOT NULL,
                kind TEXT NOT NULL,
                shares INTEGER NOT NULL,
                price_per_share TEXT NOT NULL,
                notional TEXT NOT NULL,
                commission TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                day INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // News log
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS news_events (
                id TEXT PRIMARY KEY,
                day INTEGER NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                affected_companies TEXT NOT NULL,
                news_type TEXT NOT NULL,
                min_change REAL NOT NULL,
                max_change REAL NOT NULL,
                probability REAL NOT NULL,
                occurred_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Indexes
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_price_history_symbol_time \
             ON price_history(symbol, timestamp)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_transactions_symbol ON transactions(symbol)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_news_events_day ON news_events(day)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ==================== Game Lifecycle ====================

    /// Replace any saved game with a freshly started one: opening prices,
    /// one history point per stock and the day-1 state.
    pub async fn start_game(&self, state: &GameState) -> GameResult<()> {
        let mut tx = self.pool.begin().await?;

        for table in [
            "game_state",
            "stocks",
            "price_history",
            "transactions",
            "news_events",
        ] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await?;
        }
        write_prices(&mut tx, &state.stocks).await?;
        write_game_state(&mut tx, state).await?;

        tx.commit().await?;
        debug!(difficulty = %state.difficulty, "New game saved");
        Ok(())
    }

    /// Append an executed trade to the log together with the state it
    /// produced.
    pub async fn commit_trade(
        &self,
        transaction: &Transaction,
        state: &GameState,
    ) -> GameResult<()> {
        let mut tx = self.pool.begin().await?;
        write_transaction(&mut tx, transaction).await?;
        write_game_state(&mut tx, state).await?;
        tx.commit().await?;

        debug!(id = %transaction.id, "Trade saved");
        Ok(())
    }

    /// Save a day advance: the day's news, the new prices and the new state.
    pub async fn commit_day(&self, news: &[NewsEvent], state: &GameState) -> GameResult<()> {
        let mut tx = self.pool.begin().await?;
        for event in news {
            write_news_event(&mut tx, event).await?;
        }
        write_prices(&mut tx, &state.stocks).await?;
        write_game_state(&mut tx, state).await?;
        tx.commit().await?;

        debug!(day = state.current_day, news = news.len(), "Day saved");
        Ok(())
    }

    /// Load the saved game state.
    pub async fn load_game_state(&self) -> GameResult<GameState> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT state_json FROM game_state WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;

        let (json,) = row.ok_or(GameError::NoSavedGame)?;
        let state = serde_json::from_str(&json).context("Saved game state is corrupt")?;
        Ok(state)
    }

    pub async fn has_saved_game(&self) -> GameResult<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM game_state WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    // ==================== Stocks ====================

    /// Stored current prices, ordered by symbol.
    pub async fn get_stocks(&self) -> GameResult<Vec<StoredStock>> {
        let rows = sqlx::query_as::<_, StoredStock>(
            "SELECT symbol, current_price FROM stocks ORDER BY symbol",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ==================== Price History ====================

    /// Most recent `limit` price points for a symbol, oldest first.
    pub async fn get_price_history(&self, symbol: &str, limit: i64) -> GameResult<Vec<PricePoint>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT price, timestamp FROM price_history
            WHERE symbol = ?
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(symbol)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut points = rows
            .into_iter()
            .map(|(price, timestamp)| -> Result<PricePoint> {
                Ok(PricePoint {
                    price: parse_money(&price)?,
                    timestamp,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        points.reverse();

        Ok(points)
    }

    /// Delete price points older than `cutoff`. Returns the number removed.
    pub async fn prune_price_history(&self, cutoff: i64) -> GameResult<u64> {
        let result = sqlx::query("DELETE FROM price_history WHERE timestamp < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // ==================== Transactions ====================

    /// Every transaction, in execution order.
    pub async fn get_transactions(&self) -> GameResult<Vec<Transaction>> {
        let rows =
            sqlx::query_as::<_, StoredTransaction>("SELECT * FROM transactions ORDER BY rowid")
                .fetch_all(&self.pool)
                .await?;

        Self::convert_rows(rows)
    }

    /// Transactions for one symbol, in execution order.
    pub async fn get_transactions_for_symbol(&self, symbol: &str) -> GameResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, StoredTransaction>(
            "SELECT * FROM transactions WHERE symbol = ? ORDER BY rowid",
        )
        .bind(symbol)
        .fetch_all(&self.pool)
        .await?;

        Self::convert_rows(rows)
    }

    /// Transactions made on one day, in execution order.
    pub async fn get_transactions_for_day(&self, day: u32) -> GameResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, StoredTransaction>(
            "SELECT * FROM transactions WHERE day = ? ORDER BY rowid",
        )
        .bind(i64::from(day))
        .fetch_all(&self.pool)
        .await?;

        Self::convert_rows(rows)
    }

    // ==================== News ====================

    /// News published on `day`, in time order.
    pub async fn get_news_for_day(&self, day: u32) -> GameResult<Vec<NewsEvent>> {
        let rows = sqlx::query_as::<_, StoredNewsEvent>(
            "SELECT * FROM news_events WHERE day = ? ORDER BY occurred_at, rowid",
        )
        .bind(i64::from(day))
        .fetch_all(&self.pool)
        .await?;

        Self::convert_rows(rows)
    }

    fn convert_rows<S, T>(rows: Vec<S>) -> GameResult<Vec<T>>
    where
        T: TryFrom<S, Error = anyhow::Error>,
    {
        let items = rows
            .into_iter()
            .map(T::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(items)
    }
}

// ==================== Writes ====================

async fn write_game_state(conn: &mut SqliteConnection, state: &GameState) -> GameResult<()> {
    let json = serde_json::to_string(state).context("Failed to serialize game state")?;

    sqlx::query(
        r#"
        INSERT INTO game_state (id, state_json, updated_at)
        VALUES (1, ?, datetime('now'))
        ON CONFLICT(id) DO UPDATE SET
            state_json = excluded.state_json,
            updated_at = datetime('now')
        "#,
    )
    .bind(json)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Upsert each stock's current price and append its latest history point.
async fn write_prices(conn: &mut SqliteConnection, stocks: &[Stock]) -> GameResult<()> {
    for stock in stocks {
        sqlx::query(
            r#"
            INSERT INTO stocks (symbol, current_price, previous_price, last_updated)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(symbol) DO UPDATE SET
                current_price = excluded.current_price,
                previous_price = excluded.previous_price,
                last_updated = excluded.last_updated,
                updated_at = datetime('now')
            "#,
        )
        .bind(stock.symbol())
        .bind(stock.current_price.amount().to_string())
        .bind(stock.previous_price.amount().to_string())
        .bind(stock.last_updated)
        .execute(&mut *conn)
        .await?;

        if let Some(point) = stock.price_history.last() {
            write_price_point(conn, stock.symbol(), point).await?;
        }
    }

    Ok(())
}

async fn write_price_point(
    conn: &mut SqliteConnection,
    symbol: &str,
    point: &PricePoint,
) -> GameResult<()> {
    sqlx::query("INSERT INTO price_history (symbol, price, timestamp) VALUES (?, ?, ?)")
        .bind(symbol)
        .bind(point.price.amount().to_string())
        .bind(point.timestamp)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

async fn write_transaction(
    conn: &mut SqliteConnection,
    transaction: &Transaction,
) -> GameResult<()> {
    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, symbol, kind, shares, price_per_share, notional, commission, timestamp, day
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&transaction.id)
    .bind(&transaction.symbol)
    .bind(transaction.kind.as_str())
    .bind(i64::from(transaction.shares))
    .bind(transaction.price_per_share.amount().to_string())
    .bind(transaction.notional.amount().to_string())
    .bind(transaction.commission.amount().to_string())
    .bind(transaction.timestamp)
    .bind(i64::from(transaction.day))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn write_news_event(conn: &mut SqliteConnection, event: &NewsEvent) -> GameResult<()> {
    let affected = serde_json::to_string(&event.affected_companies)
        .context("Failed to serialize affected companies")?;

    sqlx::query(
        r#"
        INSERT OR REPLACE INTO news_events (
            id, day, title, description, affected_companies, news_type,
            min_change, max_change, probability, occurred_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&event.id)
    .bind(i64::from(event.day))
    .bind(&event.title)
    .bind(&event.description)
    .bind(affected)
    .bind(event.news_type.as_str())
    .bind(event.impact.min_change)
    .bind(event.impact.max_change)
    .bind(event.impact.probability)
    .bind(i64::from(event.occurred_at))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

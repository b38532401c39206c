//! Data models for money, companies, stocks, portfolios, news and game state.

mod company;
mod game_state;
mod money;
mod news;
mod portfolio;
mod statistics;
mod stock;
mod transaction;

pub use company::{Company, CompanyCategory, Volatility};
pub use game_state::{Difficulty, GameState, GameStatus};
pub use money::Money;
pub use news::{MarketImpact, NewsEvent, NewsType};
pub use portfolio::Portfolio;
pub use statistics::{GameStatistics, StockPerformance};
pub use stock::{PricePoint, Stock};
pub use transaction::{Transaction, TransactionType};

//! Trading: order validation and execution.

mod executor;
mod validator;

pub use executor::{TradeExecutor, TradeOutcome};

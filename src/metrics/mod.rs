//! Game statistics.

mod calculator;

pub use calculator::StatisticsCalculator;

//! Market simulation: the company roster, daily news and price moves.

mod news_generator;
mod pricing;
mod roster;

pub use news_generator::NewsGenerator;
pub use pricing::PriceUpdater;
pub use roster::Roster;

//! Game rules, the persisted session and auto-play.

mod engine;
mod runner;
mod session;

pub use engine::GameEngine;
pub use runner::{AutoRunner, StopReason};
pub use session::GameSession;

//! Auto-play: advance one day per tick until the game ends or Ctrl+C.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{debug, error, info};

use crate::error::GameError;

use super::session::GameSession;

/// Why the runner stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    GameOver,
    Shutdown,
}

/// Timer-driven day advancement.
pub struct AutoRunner {
    tick_interval: Duration,
    shutdown: Arc<AtomicBool>,
}

impl AutoRunner {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            tick_interval,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run until the game is over or shutdown is requested. Ctrl+C requests
    /// shutdown.
    pub async fn run(&self, session: &mut GameSession) -> StopReason {
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
            shutdown.store(true, Ordering::SeqCst);
        });

        self.run_ticks(session).await
    }

    async fn run_ticks(&self, session: &mut GameSession) -> StopReason {
        info!(
            interval_secs = self.tick_interval.as_secs_f64(),
            day = session.state().current_day,
            "Starting auto-play"
        );

        let mut ticker = interval(self.tick_interval);

        while !self.shutdown.load(Ordering::SeqCst) {
            ticker.tick().await;
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            debug!("Auto-play tick");
            match session.next_day().await {
                Ok(outcome) => {
                    let state = &outcome.state;
                    info!(
                        day = state.current_day,
                        max_days = state.max_days,
                        assets = %state.portfolio.total_assets(),
                        pnl = %state.portfolio.profit_loss().format_with_sign(),
                        "Day complete"
                    );
                    for event in &outcome.news {
                        info!(time = %event.formatted_time(), title = %event.title, "News");
                    }
                    if state.is_game_over() {
                        return StopReason::GameOver;
                    }
                }
                Err(GameError::GameOver { day, max_days }) => {
                    info!(day = day, max_days = max_days, "Game already over");
                    return StopReason::GameOver;
                }
                Err(e) => {
                    error!(error = %e, "Error in auto-play tick");
                }
            }
        }

        info!(day = session.state().current_day, "Auto-play stopped");
        StopReason::Shutdown
    }
}

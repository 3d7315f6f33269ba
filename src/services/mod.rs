// All service modules
pub mod inflight;
pub mod onchain;
pub mod rate_limiter;
pub mod relayer;
pub mod sequence;
pub mod submission_queue;

#[cfg(test)]
pub mod testing;

// Re-export for convenience
pub use rate_limiter::RateLimiter;
pub use relayer::RelayerService;

use std::sync::Arc;
use std::time::Duration;

use crate::{config::Config, constants::RATE_LIMIT_PRUNE_INTERVAL_SECS};

/// Start all background services
pub fn start_background_services(limiter: Arc<RateLimiter>, config: &Config) {
    tracing::info!("Starting background services...");

    limiter.start_pruner(Duration::from_secs(RATE_LIMIT_PRUNE_INTERVAL_SECS));
    tracing::info!(
        "Rate limiter pruning every {}s ({} requests / {}ms)",
        RATE_LIMIT_PRUNE_INTERVAL_SECS,
        config.rate_limit_max_requests,
        config.rate_limit_window_ms
    );

    tracing::info!("All background services started successfully");
}

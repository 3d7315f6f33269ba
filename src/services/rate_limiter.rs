use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

struct FixedWindow {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter per origin. Coarse overload protection only;
/// it never takes part in ordering or dedupe decisions.
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    windows: Mutex<HashMap<String, FixedWindow>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn allow(&self, origin: &str) -> bool {
        self.allow_at(origin, Instant::now())
    }

    fn allow_at(&self, origin: &str, now: Instant) -> bool {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = windows
            .entry(origin.to_string())
            .or_insert(FixedWindow {
                started: now,
                count: 0,
            });
        if now.saturating_duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }
        entry.count = entry.count.saturating_add(1);
        entry.count <= self.max_requests
    }

    /// Drops windows that have already expired.
    pub fn prune(&self) {
        self.prune_at(Instant::now());
    }

    fn prune_at(&self, now: Instant) {
        let window = self.window;
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        windows.retain(|_, entry| now.saturating_duration_since(entry.started) < window);
    }

    pub fn tracked_origins(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn start_pruner(self: Arc<Self>, every: Duration) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                self.prune();
                tracing::debug!("Rate limiter tracking {} origins", self.tracked_origins());
            }
        });
    }
}

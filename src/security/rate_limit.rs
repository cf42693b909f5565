//! Login attempt rate limiting.
//!
//! Each client keeps a list of attempt timestamps. A check prunes entries
//! older than the window, refuses when the remainder has reached the limit,
//! and otherwise records the attempt. Pruning happens per check rather
//! than on clock ticks, so back-to-back bursts on either side of the
//! window edge can admit up to twice the nominal limit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::broadcast;

/// Length of the rate-limit window.
pub const LOGIN_WINDOW: Duration = Duration::from_secs(60);

/// Storage for per-client attempt timestamps.
///
/// Implementations must make `check_and_record` a single atomic
/// read-modify-write per client so concurrent attempts are never lost.
pub trait AttemptStore: Send + Sync {
    /// Prune, check and (if allowed) record an attempt at `now`.
    fn check_and_record(&self, client_id: &str, now: f64, window: f64, max: usize) -> bool;

    /// Drop clients with no attempts inside the window. Returns how many
    /// clients were removed.
    fn sweep(&self, now: f64, window: f64) -> usize;

    /// Number of clients currently tracked.
    fn tracked_clients(&self) -> usize;
}

/// Process-local attempt log: a map behind a mutex.
#[derive(Debug, Default)]
pub struct InMemoryAttemptStore {
    attempts: Mutex<HashMap<String, Vec<f64>>>,
}

impl InMemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AttemptStore for InMemoryAttemptStore {
    fn check_and_record(&self, client_id: &str, now: f64, window: f64, max: usize) -> bool {
        let mut attempts = self.attempts.lock().unwrap_or_else(PoisonError::into_inner);
        let log = attempts.entry(client_id.to_string()).or_default();

        log.retain(|t| now - t <= window);
        if log.len() >= max {
            return false;
        }
        log.push(now);
        true
    }

    fn sweep(&self, now: f64, window: f64) -> usize {
        let mut attempts = self.attempts.lock().unwrap_or_else(PoisonError::into_inner);
        let before = attempts.len();
        attempts.retain(|_, log| log.iter().any(|t| now - t <= window));
        before - attempts.len()
    }

    fn tracked_clients(&self) -> usize {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Fixed-window limiter for `POST /auth/login`.
#[derive(Clone)]
pub struct LoginRateLimiter {
    store: Arc<dyn AttemptStore>,
    max_per_window: usize,
    window: Duration,
}

impl std::fmt::Debug for LoginRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRateLimiter")
            .field("max_per_window", &self.max_per_window)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl LoginRateLimiter {
    /// Limiter over a fresh in-memory store with the standard 60s window.
    pub fn new(max_per_window: u32) -> Self {
        Self::with_store(Arc::new(InMemoryAttemptStore::new()), max_per_window)
    }

    /// Limiter over a caller-provided store.
    pub fn with_store(store: Arc<dyn AttemptStore>, max_per_window: u32) -> Self {
        Self {
            store,
            max_per_window: max_per_window as usize,
            window: LOGIN_WINDOW,
        }
    }

    /// Check the client at an explicit time (seconds since the epoch).
    pub fn check_and_record(&self, client_id: &str, now: f64) -> bool {
        self.store.check_and_record(
            client_id,
            now,
            self.window.as_secs_f64(),
            self.max_per_window,
        )
    }

    /// Check the client against the current wall clock.
    pub fn allow(&self, client_id: &str) -> bool {
        self.check_and_record(client_id, unix_now())
    }

    /// Evict clients whose attempts have all aged out.
    pub fn sweep(&self, now: f64) -> usize {
        self.store.sweep(now, self.window.as_secs_f64())
    }

    pub fn tracked_clients(&self) -> usize {
        self.store.tracked_clients()
    }

    /// Sweep once per window until shutdown. Without this the attempt log
    /// grows with every distinct client IP ever seen.
    pub async fn run_sweeper(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.window);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = self.sweep(unix_now());
                    if evicted > 0 {
                        tracing::debug!(
                            evicted,
                            remaining = self.tracked_clients(),
                            "Swept idle login rate-limit entries"
                        );
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Rate-limit sweeper stopping");
                    break;
                }
            }
        }
    }
}

/// Seconds since the Unix epoch as a float.
pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

//! The poll, compare, notify, persist cycle and its timer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::{thread_rng, Rng};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::discord;
use crate::instagram;
use crate::store::LastSeenStore;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// In-process overlap flag: at most one cycle's core logic runs at a time.
/// Never persisted; a restart always clears it. Advisory only, it does not
/// protect against a second process instance.
#[derive(Debug, Default)]
pub struct CycleGuard {
    running: AtomicBool,
}

impl CycleGuard {
    /// Claim the guard, or `None` when a cycle already holds it. The guard
    /// is released when the returned token drops, so a panicking cycle
    /// cannot leave it set.
    fn try_acquire(&self) -> Option<CycleToken<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CycleToken { guard: self })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

struct CycleToken<'a> {
    guard: &'a CycleGuard,
}

impl Drop for CycleToken<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}

/// Drives poll cycles on a timer, with the overlap guard and the shared
/// HTTP client.
pub struct Scheduler {
    config: Config,
    client: reqwest::Client,
    store: Arc<dyn LastSeenStore>,
    guard: CycleGuard,
}

impl Scheduler {
    /// Build a scheduler around the given store.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: Config, store: Arc<dyn LastSeenStore>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            config,
            client,
            store,
            guard: CycleGuard::default(),
        })
    }

    /// Run cycles until `cancel` fires. The first cycle runs immediately,
    /// not after the first interval. Each timer fire spawns a tick; a slow
    /// cycle is never cancelled, the next fire is skipped instead.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            let scheduler = Arc::clone(&self);
            tokio::spawn(async move {
                scheduler.tick().await;
            });

            let delay = self.config.poll_interval + jitter(self.config.poll_jitter);
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("Scheduler stopped");
                    return;
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Run one guarded cycle. Returns `false` when a previous cycle still
    /// holds the guard and this tick was skipped entirely.
    pub async fn tick(&self) -> bool {
        let Some(token) = self.guard.try_acquire() else {
            warn!("Previous cycle still in flight, skipping this tick");
            return false;
        };

        self.cycle().await;

        // Hold the guard through a short grace window so a near-simultaneous
        // timer fire cannot start a second cycle.
        tokio::time::sleep(self.config.cycle_cooldown).await;
        drop(token);
        true
    }

    /// One poll, compare, notify, persist pass. Every failure is logged and
    /// absorbed here; nothing propagates to the timer loop.
    async fn cycle(&self) {
        let post = match instagram::fetch_latest(&self.client, &self.config).await {
            Ok(Some(post)) => post,
            Ok(None) => {
                debug!("Source returned no media");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Source unavailable, skipping cycle");
                return;
            }
        };

        let last_seen = match self.store.get().await {
            Ok(last_seen) => last_seen,
            Err(e) => {
                error!(error = %e, "Store read failed, will retry next cycle");
                return;
            }
        };

        if last_seen.as_deref() == Some(post.id.as_str()) {
            debug!(id = %post.id, "No new post");
            return;
        }

        info!(permalink = %post.permalink, "New post detected");

        if let Err(e) = discord::notify(&self.client, &self.config, &post).await {
            error!(error = %e, "Delivery failed, notification dropped");
        }

        // The id advances even when delivery failed; a permanently broken
        // webhook must not produce a delivery attempt every cycle. The
        // dropped notification is never retried.
        if let Err(e) = self.store.set(&post.id).await {
            error!(error = %e, "Store write failed, post may be re-notified next cycle");
        }
    }
}

/// Uniform random delay up to `max`, desynchronizing polls from external
/// rate-limit windows.
fn jitter(max: Duration) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    Duration::from_secs(thread_rng().gen_range(0..=max.as_secs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_single_acquire() {
        let guard = CycleGuard::default();
        let token = guard.try_acquire();
        assert!(token.is_some());
        assert!(guard.is_running());
        assert!(guard.try_acquire().is_none());
    }

    #[test]
    fn test_guard_released_on_drop() {
        let guard = CycleGuard::default();
        drop(guard.try_acquire());
        assert!(!guard.is_running());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn test_jitter_bounds() {
        assert_eq!(jitter(Duration::ZERO), Duration::ZERO);
        for _ in 0..100 {
            assert!(jitter(Duration::from_secs(30)) <= Duration::from_secs(30));
        }
    }
}

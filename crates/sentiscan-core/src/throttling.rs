use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Per-host politeness gate.
///
/// Each host gets its own single-cell rate limiter, so consecutive requests to
/// the same host are spaced by at least the politeness delay while requests to
/// different hosts proceed independently. A zero delay disables the gate.
pub struct HostThrottle {
    quota: Option<Quota>,
    limiters: Mutex<HashMap<String, Arc<DirectRateLimiter>>>,
}

impl HostThrottle {
    pub fn new(politeness_delay: Duration) -> Self {
        let quota = Quota::with_period(politeness_delay)
            .map(|quota| quota.allow_burst(NonZeroU32::MIN));
        Self {
            quota,
            limiters: Mutex::new(HashMap::new()),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        self.quota.is_some()
    }

    /// Waits until `host` may receive another request.
    pub async fn acquire(&self, host: &str) {
        let Some(limiter) = self.limiter_for(host) else {
            return;
        };
        limiter.until_ready().await;
    }

    fn limiter_for(&self, host: &str) -> Option<Arc<DirectRateLimiter>> {
        let quota = self.quota?;
        let mut limiters = self
            .limiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let limiter = limiters
            .entry(host.to_ascii_lowercase())
            .or_insert_with(|| Arc::new(RateLimiter::direct(quota)));
        Some(Arc::clone(limiter))
    }
}

impl std::fmt::Debug for HostThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostThrottle")
            .field("quota", &self.quota)
            .finish_non_exhaustive()
    }
}

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use tokio::sync::Semaphore;

use crate::config::PolitenessPolicy;
use crate::http_client::{HttpClient, HttpError, HttpFuture, HttpRequest};

type HostRateLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Per-host politeness gate: a concurrency cap plus a minimum spacing between request starts.
#[derive(Clone)]
pub struct HostThrottle {
    limiter: Option<Arc<HostRateLimiter>>,
    permits: Arc<Mutex<HashMap<String, Arc<Semaphore>>>>,
    max_concurrent: usize,
}

/// Held for the duration of one upstream call. Dropping it frees the host slot.
pub struct HostPermit {
    _permit: tokio::sync::OwnedSemaphorePermit,
}

impl HostThrottle {
    pub fn new(max_concurrent: usize, min_interval: Duration) -> Self {
        let limiter =
            quota_from_interval(min_interval).map(|quota| Arc::new(RateLimiter::keyed(quota)));
        Self {
            limiter,
            permits: Arc::new(Mutex::new(HashMap::new())),
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn from_policy(policy: &PolitenessPolicy) -> Self {
        Self::new(policy.max_concurrent_per_host, policy.min_request_interval)
    }

    /// Waits for a free slot on `host`, then for the host's spacing budget.
    pub async fn acquire(&self, host: &str) -> Result<HostPermit, HttpError> {
        let semaphore = self.semaphore_for(host);
        let permit = semaphore
            .acquire_owned()
            .await
            .map_err(|_| HttpError::new(format!("politeness gate for {host} was closed")))?;

        if let Some(limiter) = &self.limiter {
            limiter.until_key_ready(&host.to_owned()).await;
        }

        Ok(HostPermit { _permit: permit })
    }

    /// Requests currently allowed to start against `host` without waiting for a slot.
    pub fn available_slots(&self, host: &str) -> usize {
        self.semaphore_for(host).available_permits()
    }

    fn semaphore_for(&self, host: &str) -> Arc<Semaphore> {
        let mut permits = self
            .permits
            .lock()
            .expect("host permit table should not be poisoned");
        permits
            .entry(host.to_owned())
            .or_insert_with(|| Arc::new(Semaphore::new(self.max_concurrent)))
            .clone()
    }
}

/// Transport wrapper that routes every request through a [`HostThrottle`].
#[derive(Clone)]
pub struct ThrottledHttpClient {
    inner: Arc<dyn HttpClient>,
    throttle: HostThrottle,
}

impl ThrottledHttpClient {
    pub fn new(inner: Arc<dyn HttpClient>, throttle: HostThrottle) -> Self {
        Self { inner, throttle }
    }
}

impl HttpClient for ThrottledHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            let host = request.host().unwrap_or_default();
            let _permit = self.throttle.acquire(&host).await?;
            tracing::trace!(host = %host, url = %request.url, "upstream request");
            self.inner.execute(request).await
        })
    }
}

fn quota_from_interval(min_interval: Duration) -> Option<Quota> {
    if min_interval.is_zero() {
        return None;
    }

    let burst = NonZeroU32::new(1).expect("one is non-zero");
    Quota::with_period(min_interval).map(|quota| quota.allow_burst(burst))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::HttpResponse;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    #[derive(Default)]
    struct PeakTrackingClient {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl HttpClient for PeakTrackingClient {
        fn execute<'a>(&'a self, _request: HttpRequest) -> HttpFuture<'a> {
            Box::pin(async move {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(HttpResponse::ok_json("{}"))
            })
        }
    }

    #[tokio::test]
    async fn caps_concurrent_requests_per_host() {
        let inner = Arc::new(PeakTrackingClient::default());
        let client = ThrottledHttpClient::new(inner.clone(), HostThrottle::new(2, Duration::ZERO));

        let requests = (0..6).map(|i| {
            client.execute(HttpRequest::get(format!("https://quotes.example/chart/{i}")))
        });
        let results = futures_util::future::join_all(requests).await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(inner.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn hosts_have_independent_slots() {
        let throttle = HostThrottle::new(1, Duration::ZERO);

        let _held = throttle.acquire("a.example").await.expect("slot");
        assert_eq!(throttle.available_slots("a.example"), 0);
        assert_eq!(throttle.available_slots("b.example"), 1);
    }

    #[tokio::test]
    async fn spaces_consecutive_requests_to_one_host() {
        let throttle = HostThrottle::new(4, Duration::from_millis(50));
        let started = Instant::now();

        for _ in 0..3 {
            drop(throttle.acquire("quotes.example").await.expect("slot"));
        }

        assert!(started.elapsed() >= Duration::from_millis(90));
    }

    #[test]
    fn zero_interval_disables_spacing() {
        assert!(quota_from_interval(Duration::ZERO).is_none());
        assert!(quota_from_interval(Duration::from_millis(250)).is_some());
    }
}

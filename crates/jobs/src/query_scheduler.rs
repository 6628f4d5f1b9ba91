//! Rate-limited, deduplicating delay queue of FQDN names to (re-)resolve,
//! backed by a fixed pool of workers that issue upstream DNS queries.
//!
//! Deduplication ("a name queued twice collapses to one pending job") is
//! implemented by keeping one pending delay-task per name in a `DashMap`:
//! scheduling a name that already has a pending task cancels the old task
//! and starts a fresh one with the new delay, rather than letting both
//! fire.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use netpol_fqdn_application::ports::{Requeue, UpstreamResolver};
use netpol_fqdn_application::services::SelectorCache;
use netpol_fqdn_domain::RecordFamilies;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

const QUERY_TIMEOUT: Duration = Duration::from_secs(10);

pub struct QuerySchedulerConfig {
    pub worker_count: usize,
    pub min_retry_delay: Duration,
    pub max_retry_delay: Duration,
    pub families: RecordFamilies,
    pub min_ttl: Duration,
}

impl Default for QuerySchedulerConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            min_retry_delay: Duration::from_secs(1),
            max_retry_delay: Duration::from_secs(60),
            families: RecordFamilies::default(),
            min_ttl: Duration::ZERO,
        }
    }
}

/// Proactively re-resolves names tracked by the cache before their TTL
/// expires, and retries failed queries with exponential backoff.
pub struct QueryScheduler {
    work_tx: mpsc::Sender<String>,
    pending: Arc<DashMap<String, CancellationToken>>,
    backoff: Arc<DashMap<String, Duration>>,
    shutdown: CancellationToken,
}

impl QueryScheduler {
    pub fn new(
        selector_cache: Arc<SelectorCache>,
        resolver: Arc<dyn UpstreamResolver>,
        config: QuerySchedulerConfig,
        shutdown: CancellationToken,
    ) -> Arc<Self> {
        let (work_tx, work_rx) = mpsc::channel::<String>(256);
        let backoff = Arc::new(DashMap::new());

        let scheduler = Arc::new(Self {
            work_tx,
            pending: Arc::new(DashMap::new()),
            backoff: backoff.clone(),
            shutdown: shutdown.clone(),
        });

        let work_rx = Arc::new(tokio::sync::Mutex::new(work_rx));
        for worker_id in 0..config.worker_count.max(1) {
            tokio::spawn(worker_loop(
                worker_id,
                work_rx.clone(),
                selector_cache.clone(),
                resolver.clone(),
                scheduler.clone(),
                backoff.clone(),
                config.min_retry_delay,
                config.max_retry_delay,
                config.families,
                config.min_ttl,
                shutdown.clone(),
            ));
        }

        scheduler
    }

    /// Names currently queued or backed off, for observability.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Requeue for QueryScheduler {
    fn schedule(&self, fqdn: String, delay: Duration) {
        if let Some((_, old_token)) = self.pending.remove(&fqdn) {
            old_token.cancel();
        }

        let token = CancellationToken::new();
        self.pending.insert(fqdn.clone(), token.clone());

        let work_tx = self.work_tx.clone();
        let pending = self.pending.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = token.cancelled() => {
                    debug!(%fqdn, "pending query superseded by a newer schedule");
                }
                _ = tokio::time::sleep(delay) => {
                    pending.remove(&fqdn);
                    if work_tx.send(fqdn.clone()).await.is_err() {
                        warn!(%fqdn, "query scheduler worker pool is no longer running");
                    }
                }
            }
        });
    }
}

#[allow(clippy::too_many_arguments)]
async fn worker_loop(
    worker_id: usize,
    queue: Arc<tokio::sync::Mutex<mpsc::Receiver<String>>>,
    selector_cache: Arc<SelectorCache>,
    resolver: Arc<dyn UpstreamResolver>,
    scheduler: Arc<QueryScheduler>,
    backoff: Arc<DashMap<String, Duration>>,
    min_retry_delay: Duration,
    max_retry_delay: Duration,
    families: RecordFamilies,
    min_ttl: Duration,
    shutdown: CancellationToken,
) {
    loop {
        let fqdn = tokio::select! {
            _ = shutdown.cancelled() => {
                debug!(worker_id, "query scheduler worker shutting down");
                break;
            }
            fqdn = async {
                let mut rx = queue.lock().await;
                rx.recv().await
            } => {
                match fqdn {
                    Some(fqdn) => fqdn,
                    None => break,
                }
            }
        };

        match tokio::time::timeout(QUERY_TIMEOUT, resolver.query(&fqdn, families)).await {
            Ok(Ok(answers)) => {
                backoff.remove(&fqdn);
                let answers: Vec<(std::net::IpAddr, Duration)> =
                    answers.into_iter().map(|(ip, ttl)| (ip, ttl.max(min_ttl))).collect();
                if let Some(outcome) = selector_cache.merge_response(Utc::now(), &fqdn, &answers) {
                    if let Some(delay) = outcome.next_requery {
                        scheduler.schedule(fqdn, delay);
                    }
                }
            }
            Ok(Err(e)) => {
                error!(%fqdn, error = %e, "upstream query failed, backing off");
                schedule_retry(&scheduler, &backoff, &fqdn, min_retry_delay, max_retry_delay);
            }
            Err(_) => {
                error!(%fqdn, timeout_secs = QUERY_TIMEOUT.as_secs(), "upstream query timed out, backing off");
                schedule_retry(&scheduler, &backoff, &fqdn, min_retry_delay, max_retry_delay);
            }
        }
    }
}

fn schedule_retry(
    scheduler: &Arc<QueryScheduler>,
    backoff: &DashMap<String, Duration>,
    fqdn: &str,
    min_retry_delay: Duration,
    max_retry_delay: Duration,
) {
    let next_delay = match backoff.get(fqdn) {
        Some(current) => (*current * 2).min(max_retry_delay),
        None => min_retry_delay,
    };
    backoff.insert(fqdn.to_string(), next_delay);
    scheduler.schedule(fqdn.to_string(), next_delay);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use netpol_fqdn_domain::DomainError;
    use std::net::IpAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingResolver {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl UpstreamResolver for CountingResolver {
        async fn query(
            &self,
            _fqdn: &str,
            _families: RecordFamilies,
        ) -> Result<Vec<(IpAddr, Duration)>, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![("10.0.0.5".parse().unwrap(), Duration::from_secs(30))])
        }
    }

    #[tokio::test]
    async fn rescheduling_before_firing_collapses_to_one_pending_job() {
        let cache = Arc::new(SelectorCache::new());
        let resolver = Arc::new(CountingResolver { calls: AtomicUsize::new(0) });
        let scheduler = QueryScheduler::new(
            cache,
            resolver,
            QuerySchedulerConfig {
                worker_count: 1,
                ..Default::default()
            },
            CancellationToken::new(),
        );

        scheduler.schedule("api.example.com".to_string(), Duration::from_millis(200));
        assert_eq!(scheduler.pending_count(), 1);
        scheduler.schedule("api.example.com".to_string(), Duration::from_millis(200));
        assert_eq!(scheduler.pending_count(), 1);
    }
}

use std::sync::Arc;

use netpol_fqdn_application::ports::UpstreamResolver;
use netpol_fqdn_application::services::SelectorCache;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::query_scheduler::{QueryScheduler, QuerySchedulerConfig};

/// Builder for the scheduler's worker pool: wires it against a shutdown
/// token and starts it.
pub struct JobRunner {
    selector_cache: Option<Arc<SelectorCache>>,
    resolver: Option<Arc<dyn UpstreamResolver>>,
    config: QuerySchedulerConfig,
    shutdown: CancellationToken,
}

impl JobRunner {
    pub fn new() -> Self {
        Self {
            selector_cache: None,
            resolver: None,
            config: QuerySchedulerConfig::default(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_selector_cache(mut self, cache: Arc<SelectorCache>) -> Self {
        self.selector_cache = Some(cache);
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn UpstreamResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_scheduler_config(mut self, config: QuerySchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Starts the query scheduler's worker pool and returns the handle used
    /// as the `Requeue` port elsewhere in the system.
    pub fn start(self) -> Arc<QueryScheduler> {
        info!("starting query scheduler job");
        let selector_cache = self.selector_cache.expect("selector cache must be configured");
        let resolver = self.resolver.expect("upstream resolver must be configured");
        QueryScheduler::new(selector_cache, resolver, self.config, self.shutdown)
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}

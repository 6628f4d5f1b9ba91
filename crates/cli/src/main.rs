use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use netpol_fqdn_application::ports::{DatapathPort, ReconcilerPort, Requeue};
use netpol_fqdn_application::services::{PacketInterceptor, RulePortIndex, RuleSyncTracker, SelectorCache};
use netpol_fqdn_application::use_cases::{FqdnEnforcementState, FqdnPolicyController};
use netpol_fqdn_domain::{CliOverrides, Config, RecordFamilies};
use netpol_fqdn_infrastructure::{AutoAckReconciler, DatapathPacketParser, DirectUpstreamResolver, HostUpstreamResolver, LoggingDatapath};
use netpol_fqdn_jobs::{JobRunner, QuerySchedulerConfig};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser)]
#[command(name = "netpol-fqdn-agent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "FQDN-aware NetworkPolicy enforcement core for a CNI agent")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Explicit upstream DNS server, e.g. "10.96.0.10:53"
    #[arg(long)]
    upstream_server: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Floor applied to every cached record's TTL, in seconds
    #[arg(long)]
    min_ttl_secs: Option<u64>,
}

const CLUSTER_DNS_FALLBACK: &str = "10.96.0.10:53";

/// Explicit override takes precedence, then the in-cluster DNS Service
/// address discovered from the conventional Kubernetes env vars, falling
/// back to the well-known cluster DNS address when those are absent.
fn resolve_upstream_server(configured: &Option<String>) -> Option<SocketAddr> {
    if let Some(server) = configured {
        return server.parse().ok();
    }

    if let (Ok(host), Ok(port)) = (
        std::env::var("KUBE_DNS_SERVICE_HOST"),
        std::env::var("KUBE_DNS_SERVICE_PORT"),
    ) {
        if let Ok(addr) = format!("{host}:{port}").parse() {
            return Some(addr);
        }
    }

    CLUSTER_DNS_FALLBACK.parse().ok()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        upstream_server: cli.upstream_server.clone(),
        log_level: cli.log_level.clone(),
        min_ttl_secs: cli.min_ttl_secs,
    };
    let config = Config::load(cli.config.as_deref(), overrides)?;
    config.validate()?;

    let log_level = config.logging.level.parse().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_target(true)
        .with_max_level(log_level)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "starting fqdn policy enforcement agent");

    let families = RecordFamilies {
        v4: config.dns.enable_ipv4,
        v6: config.dns.enable_ipv6,
    };
    let min_ttl = Duration::from_secs(config.dns.min_ttl_secs);
    let realization_timeout = Duration::from_millis(config.dns.realization_timeout_ms);
    let query_timeout = Duration::from_secs(config.dns.query_timeout_secs);

    let resolver: Arc<dyn netpol_fqdn_application::ports::UpstreamResolver> =
        match resolve_upstream_server(&config.dns.upstream_server) {
            Some(server) => {
                info!(%server, "querying upstream dns server directly");
                Arc::new(DirectUpstreamResolver::new(server, query_timeout))
            }
            None => {
                info!("no upstream server configured, falling back to host resolver");
                Arc::new(HostUpstreamResolver::new())
            }
        };

    let shutdown = CancellationToken::new();
    let selector_cache = Arc::new(SelectorCache::new());
    let rule_ports = Arc::new(RulePortIndex::new());
    let tracker = RuleSyncTracker::new(shutdown.clone());
    let datapath: Arc<dyn DatapathPort> = Arc::new(LoggingDatapath::new());
    let reconciler: Arc<dyn ReconcilerPort> = Arc::new(AutoAckReconciler::new(tracker.clone()));
    let parser = Arc::new(DatapathPacketParser::new());

    let scheduler = JobRunner::new()
        .with_selector_cache(selector_cache.clone())
        .with_resolver(resolver)
        .with_scheduler_config(QuerySchedulerConfig {
            worker_count: config.scheduler.worker_count,
            min_retry_delay: Duration::from_secs(config.scheduler.min_retry_delay_secs),
            max_retry_delay: Duration::from_secs(config.scheduler.max_retry_delay_secs),
            families,
            min_ttl,
        })
        .with_shutdown_token(shutdown.clone())
        .start();
    let requeue: Arc<dyn Requeue> = scheduler.clone();

    let interceptor = Arc::new(PacketInterceptor::new(
        selector_cache.clone(),
        tracker.clone(),
        datapath.clone(),
        reconciler,
        parser,
        requeue.clone(),
        min_ttl,
        families,
        realization_timeout,
    ));

    let state = Arc::new(FqdnEnforcementState {
        selector_cache,
        rule_ports,
        tracker,
        datapath,
        interceptor,
        requeue,
    });
    let _controller = FqdnPolicyController::new(state);

    info!("agent ready, waiting for shutdown signal");
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received, stopping background jobs");
    shutdown.cancel();

    Ok(())
}

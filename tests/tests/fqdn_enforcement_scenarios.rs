//! End-to-end walkthroughs of the five controller operations acting
//! together, one per scenario a reviewer would actually worry about:
//! a brand new name, a wildcard joining an already-resolved name, the
//! interception barrier on both the happy and the failing path, and the
//! cache's tolerance for partial and expired upstream answers.

mod helpers;

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use helpers::mocks::{RecordingDatapath, RecordingRequeue, ScriptedReconciler, SequencedResponseParser};
use netpol_fqdn_application::services::{PacketInterceptor, RulePortIndex, RuleSyncTracker, SelectorCache};
use netpol_fqdn_application::use_cases::{FqdnEnforcementState, FqdnPolicyController};
use netpol_fqdn_domain::{DomainError, PacketHandle, PortId, RecordFamilies, RuleId};
use tokio_util::sync::CancellationToken;

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
}

struct Harness {
    controller: FqdnPolicyController,
    datapath: Arc<RecordingDatapath>,
    requeue: Arc<RecordingRequeue>,
    parser: Arc<SequencedResponseParser>,
}

fn build_harness(reconciler_outcome: Result<(), String>) -> Harness {
    let selector_cache = Arc::new(SelectorCache::new());
    let rule_ports = Arc::new(RulePortIndex::new());
    let tracker = RuleSyncTracker::new(CancellationToken::new());
    let datapath = Arc::new(RecordingDatapath::default());
    let reconciler = Arc::new(ScriptedReconciler {
        tracker: tracker.clone(),
        outcome: reconciler_outcome,
    });
    let requeue = Arc::new(RecordingRequeue::default());
    let parser = Arc::new(SequencedResponseParser::new());

    let interceptor = Arc::new(PacketInterceptor::new(
        selector_cache.clone(),
        tracker.clone(),
        datapath.clone(),
        reconciler,
        parser.clone(),
        requeue.clone(),
        Duration::from_secs(0),
        RecordFamilies::default(),
        Duration::from_millis(500),
    ));

    let state = Arc::new(FqdnEnforcementState {
        selector_cache,
        rule_ports,
        tracker,
        datapath: datapath.clone(),
        interceptor,
        requeue: requeue.clone(),
    });

    Harness {
        controller: FqdnPolicyController::new(state),
        datapath,
        requeue,
        parser,
    }
}

fn deliver(parser: &SequencedResponseParser, fqdn: &str, answers: Vec<(IpAddr, Duration)>) -> PacketHandle {
    parser.push_response(fqdn, answers);
    PacketHandle::new(vec![0u8; 8], next_cookie())
}

fn next_cookie() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::SeqCst)
}

#[tokio::test]
async fn new_name_happy_path_dispatches_and_caches_the_first_answer() {
    let h = build_harness(Ok(()));

    h.controller
        .add_fqdn_rule(RuleId::from("r1"), vec!["api.example.com".to_string()], vec![PortId(7)])
        .await
        .unwrap();

    assert_eq!(
        *h.requeue.scheduled.lock().unwrap(),
        vec![("api.example.com".to_string(), Duration::ZERO)],
        "a brand new exact-name selector must be queried immediately"
    );

    let packet = deliver(&h.parser, "api.example.com", vec![(ip("10.0.0.1"), Duration::from_secs(60))]);
    h.controller.handle_intercepted_packet(packet).await.unwrap();

    let ips = h.controller.get_ips_for_selectors(vec!["api.example.com".to_string()]).unwrap();
    assert_eq!(ips, vec![ip("10.0.0.1")]);

    let scheduled = h.requeue.scheduled.lock().unwrap();
    assert_eq!(scheduled.last().unwrap(), &("api.example.com".to_string(), Duration::from_secs(60)));
}

#[tokio::test]
async fn wildcard_attach_to_existing_name_skips_the_proactive_query() {
    let h = build_harness(Ok(()));

    h.controller
        .add_fqdn_rule(RuleId::from("r1"), vec!["api.example.com".to_string()], vec![PortId(7)])
        .await
        .unwrap();
    let packet = deliver(&h.parser, "api.example.com", vec![(ip("10.0.0.1"), Duration::from_secs(60))]);
    h.controller.handle_intercepted_packet(packet).await.unwrap();

    let schedule_count_before = h.requeue.scheduled.lock().unwrap().len();

    h.controller
        .add_fqdn_rule(RuleId::from("r2"), vec!["*.example.com".to_string()], vec![PortId(9)])
        .await
        .unwrap();

    assert_eq!(
        h.requeue.scheduled.lock().unwrap().len(),
        schedule_count_before,
        "attaching a wildcard to an already-known name must not trigger a query"
    );

    let ips = h.controller.get_ips_for_selectors(vec!["*.example.com".to_string()]).unwrap();
    assert_eq!(ips, vec![ip("10.0.0.1")]);
}

#[tokio::test]
async fn interception_barrier_resumes_the_packet_once_realization_succeeds() {
    let h = build_harness(Ok(()));
    h.controller
        .add_fqdn_rule(RuleId::from("r1"), vec!["api.example.com".to_string()], vec![PortId(7)])
        .await
        .unwrap();

    let started = std::time::Instant::now();
    let packet = deliver(&h.parser, "api.example.com", vec![(ip("10.0.0.2"), Duration::from_secs(30))]);
    let cookie = packet.cookie;
    h.controller.handle_intercepted_packet(packet).await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_secs(2), "realization must never exceed the configured timeout");
    assert_eq!(*h.datapath.resumed.lock().unwrap(), vec![cookie]);
}

#[tokio::test]
async fn realization_failure_drops_the_packet_and_keeps_blocking_until_success() {
    let h = build_harness(Err("apply failed".to_string()));
    h.controller
        .add_fqdn_rule(RuleId::from("r1"), vec!["api.example.com".to_string()], vec![PortId(7)])
        .await
        .unwrap();

    let first = deliver(&h.parser, "api.example.com", vec![(ip("10.0.0.2"), Duration::from_secs(30))]);
    let result = h.controller.handle_intercepted_packet(first).await;
    assert!(matches!(result, Err(DomainError::RealizationFailed(_, _))));
    assert!(h.datapath.resumed.lock().unwrap().is_empty());

    // A second response for the same name, even with no new addresses,
    // must still block: the rule is still dirty.
    let second = deliver(&h.parser, "api.example.com", vec![(ip("10.0.0.2"), Duration::from_secs(30))]);
    let result = h.controller.handle_intercepted_packet(second).await;
    assert!(
        matches!(result, Err(DomainError::RealizationFailed(_, _))),
        "a rule that never realized must keep blocking subsequent responses"
    );
    assert!(h.datapath.resumed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn partial_response_retains_unexpired_addresses_without_signaling_an_update() {
    let cache = SelectorCache::new();
    cache.add_rule(RuleId::from("r1"), &["api.example.com".to_string()]).unwrap();

    let t0 = at("2026-01-01T00:00:00Z");
    cache
        .merge_response(
            t0,
            "api.example.com",
            &[(ip("10.0.0.1"), Duration::from_secs(60)), (ip("10.0.0.2"), Duration::from_secs(60))],
        )
        .unwrap();

    let t1 = t0 + chrono::Duration::seconds(10);
    let outcome = cache
        .merge_response(t1, "api.example.com", &[(ip("10.0.0.1"), Duration::from_secs(30))])
        .unwrap();

    assert!(!outcome.address_update, "dropping an unexpired address from the response is not an update");
    let mut ips = cache.ips_for_selectors(&["api.example.com".to_string()]).unwrap();
    ips.sort();
    assert_eq!(ips, vec![ip("10.0.0.1"), ip("10.0.0.2")]);
}

#[tokio::test]
async fn expiry_purge_drops_the_stale_address_and_signals_an_update() {
    let cache = SelectorCache::new();
    cache.add_rule(RuleId::from("r3"), &["stale.example.com".to_string()]).unwrap();

    let t0 = at("2026-01-01T00:00:00Z");
    cache
        .merge_response(t0, "stale.example.com", &[(ip("10.0.0.9"), Duration::from_secs(5))])
        .unwrap();

    let t1 = t0 + chrono::Duration::seconds(10);
    let outcome = cache.merge_response(t1, "stale.example.com", &[]).unwrap();

    assert!(outcome.address_update, "an expired address disappearing from the response is an update");
    let ips = cache.ips_for_selectors(&["stale.example.com".to_string()]).unwrap();
    assert!(ips.is_empty());
    assert_eq!(cache.cached_name_count(), 0, "a name with no remaining addresses has no orphaned entry");
}

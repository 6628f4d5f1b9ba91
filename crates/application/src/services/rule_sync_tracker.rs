use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use netpol_fqdn_domain::RuleId;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Result of a single rule's realization attempt, as reported by the
/// reconciler.
pub type RealizationResult = Result<(), String>;

struct RealizationUpdate {
    rule: RuleId,
    result: RealizationResult,
}

struct SubscriberState {
    remaining: AtomicUsize,
    completed: AtomicBool,
    sender: std::sync::Mutex<Option<oneshot::Sender<RealizationResult>>>,
}

impl SubscriberState {
    fn complete(self: &Arc<Self>, result: RealizationResult) {
        if self.completed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(tx) = self.sender.lock().expect("subscriber sender poisoned").take() {
            let _ = tx.send(result);
        }
    }
}

#[derive(Default)]
struct TrackerState {
    dirty: HashSet<RuleId>,
    subscribers: HashMap<RuleId, Vec<Arc<SubscriberState>>>,
}

/// Tracks which rules are awaiting datapath realization and notifies
/// whoever is waiting on them. `Subscribe` is a synchronous, immediately
/// consistent operation; `NotifyUpdate` is delivered by the reconciler
/// through a channel drained by a single dispatch task so that a racing
/// `Subscribe` always observes a consistent view.
pub struct RuleSyncTracker {
    state: Arc<RwLock<TrackerState>>,
    update_tx: mpsc::Sender<RealizationUpdate>,
    shutdown: CancellationToken,
}

impl RuleSyncTracker {
    pub fn new(shutdown: CancellationToken) -> Arc<Self> {
        let (update_tx, update_rx) = mpsc::channel(256);
        let state = Arc::new(RwLock::new(TrackerState::default()));

        let tracker = Arc::new(Self {
            state: state.clone(),
            update_tx,
            shutdown: shutdown.clone(),
        });

        tokio::spawn(dispatch_loop(state, update_rx, shutdown));
        tracker
    }

    /// Adds `rule_ids` to the dirty set and registers a subscriber that
    /// completes exactly once: with the first error encountered across any
    /// of its rules, or with success once every rule has reported success.
    pub fn subscribe(&self, rule_ids: &[RuleId]) -> oneshot::Receiver<RealizationResult> {
        let (tx, rx) = oneshot::channel();
        let subscriber = Arc::new(SubscriberState {
            remaining: AtomicUsize::new(rule_ids.len()),
            completed: AtomicBool::new(false),
            sender: std::sync::Mutex::new(Some(tx)),
        });

        if rule_ids.is_empty() {
            subscriber.complete(Ok(()));
            return rx;
        }

        let mut state = self.state.write().expect("tracker mutex poisoned");
        for rule in rule_ids {
            state.dirty.insert(rule.clone());
            state
                .subscribers
                .entry(rule.clone())
                .or_default()
                .push(subscriber.clone());
        }
        rx
    }

    /// Enqueues a realization result for dispatch-loop processing. Returns
    /// immediately; never blocks on subscriber delivery.
    pub async fn notify_rule_realization(&self, rule: RuleId, result: RealizationResult) {
        if self.update_tx.send(RealizationUpdate { rule, result }).await.is_err() {
            warn!("rule sync tracker dispatch loop is no longer running");
        }
    }

    pub fn snapshot_dirty(&self) -> HashSet<RuleId> {
        self.state.read().expect("tracker mutex poisoned").dirty.clone()
    }

    pub fn dirty_count(&self) -> usize {
        self.state.read().expect("tracker mutex poisoned").dirty.len()
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

async fn dispatch_loop(
    state: Arc<RwLock<TrackerState>>,
    mut rx: mpsc::Receiver<RealizationUpdate>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("rule sync tracker dispatch loop shutting down");
                break;
            }
            update = rx.recv() => {
                match update {
                    Some(update) => apply_update(&state, update),
                    None => break,
                }
            }
        }
    }
}

fn apply_update(state: &RwLock<TrackerState>, update: RealizationUpdate) {
    let mut state = state.write().expect("tracker mutex poisoned");
    if let Some(subscribers) = state.subscribers.remove(&update.rule) {
        for subscriber in subscribers {
            match &update.result {
                Err(e) => subscriber.complete(Err(e.clone())),
                Ok(()) => {
                    if subscriber.completed.load(Ordering::SeqCst) {
                        continue;
                    }
                    let prev = subscriber.remaining.fetch_sub(1, Ordering::SeqCst);
                    if prev == 1 {
                        subscriber.complete(Ok(()));
                    }
                }
            }
        }
    }
    if update.result.is_ok() {
        state.dirty.remove(&update.rule);
    }
}

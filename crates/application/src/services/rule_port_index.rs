use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use netpol_fqdn_domain::{PortId, RuleId};

/// Port additions/removals the datapath's DNS-interception flow address set
/// must apply to track the union of ports across all rules.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PortDelta {
    pub added: Vec<PortId>,
    pub removed: Vec<PortId>,
}

/// Tracks the per-rule port set and the union across all rules, under its
/// own mutex (narrower than the selector/cache lock, never nested inside
/// it).
pub struct RulePortIndex {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    rule_ports: HashMap<RuleId, HashSet<PortId>>,
    union: HashSet<PortId>,
}

impl Default for RulePortIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl RulePortIndex {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Computes the delta a call to [`Self::commit_update`] with the same
    /// arguments would produce, without mutating any state. Callers issue
    /// the datapath calls implied by this delta first, and only call
    /// `commit_update` once those succeed — so a failed call can simply be
    /// retried and will see the same unmutated state and recompute the same
    /// delta.
    pub fn preview_update(&self, rule: &RuleId, ports: &[PortId]) -> PortDelta {
        let inner = self.inner.lock().expect("rule/ports mutex poisoned");
        let mut rule_ports = inner.rule_ports.clone();
        rule_ports.insert(rule.clone(), ports.iter().copied().collect());
        diff(&inner.union, &union_of(&rule_ports))
    }

    /// Actually records `rule`'s port set and updates the union. Call only
    /// after the datapath calls implied by the matching `preview_update`
    /// have succeeded.
    pub fn commit_update(&self, rule: RuleId, ports: Vec<PortId>) -> PortDelta {
        let mut inner = self.inner.lock().expect("rule/ports mutex poisoned");
        inner.rule_ports.insert(rule, ports.into_iter().collect());
        recompute_union(&mut inner)
    }

    /// Non-mutating counterpart of [`Self::commit_remove`].
    pub fn preview_remove(&self, rule: &RuleId) -> PortDelta {
        let inner = self.inner.lock().expect("rule/ports mutex poisoned");
        let mut rule_ports = inner.rule_ports.clone();
        rule_ports.remove(rule);
        diff(&inner.union, &union_of(&rule_ports))
    }

    /// Actually drops `rule`'s port set and updates the union. Call only
    /// after the datapath calls implied by the matching `preview_remove`
    /// have succeeded.
    pub fn commit_remove(&self, rule: &RuleId) -> PortDelta {
        let mut inner = self.inner.lock().expect("rule/ports mutex poisoned");
        inner.rule_ports.remove(rule);
        recompute_union(&mut inner)
    }
}

fn union_of(rule_ports: &HashMap<RuleId, HashSet<PortId>>) -> HashSet<PortId> {
    rule_ports.values().flatten().copied().collect()
}

fn diff(old: &HashSet<PortId>, new: &HashSet<PortId>) -> PortDelta {
    PortDelta {
        added: new.difference(old).copied().collect(),
        removed: old.difference(new).copied().collect(),
    }
}

fn recompute_union(inner: &mut Inner) -> PortDelta {
    let new_union = union_of(&inner.rule_ports);
    let delta = diff(&inner.union, &new_union);
    inner.union = new_union;
    delta
}

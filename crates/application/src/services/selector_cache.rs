use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use netpol_fqdn_domain::{DomainError, DnsMeta, MergeOutcome, RuleId, SelectorItem};
use tracing::debug;

/// Holds `DNSCache`, the `FQDN↔SelectorItem` maps, and the
/// `SelectorItem→RuleID` map behind a single mutex, as required by the
/// merge algorithm that must observe and mutate all three atomically.
pub struct SelectorCache {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    fqdn_to_selectors: HashMap<String, HashSet<SelectorItem>>,
    selector_to_fqdns: HashMap<SelectorItem, HashSet<String>>,
    selector_to_rules: HashMap<SelectorItem, HashSet<RuleId>>,
    cache: HashMap<String, DnsMeta>,
}

impl Default for SelectorCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectorCache {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Registers `rule` against the selectors derived from `fqdns`. Returns
    /// the exact names that are newly referenced and should be queried
    /// immediately; wildcard selectors never trigger a proactive query.
    pub fn add_rule(&self, rule: RuleId, fqdns: &[String]) -> Result<Vec<String>, DomainError> {
        let mut to_query = Vec::new();
        let mut inner = self.inner.lock().expect("selector/cache mutex poisoned");

        for raw in fqdns {
            let selector = SelectorItem::parse(raw)?;
            let is_new_selector = !inner.selector_to_rules.contains_key(&selector);

            if is_new_selector {
                match selector.exact_name() {
                    Some(name) => {
                        let name = name.to_string();
                        inner
                            .fqdn_to_selectors
                            .entry(name.clone())
                            .or_default()
                            .insert(selector.clone());
                        inner
                            .selector_to_fqdns
                            .entry(selector.clone())
                            .or_default()
                            .insert(name.clone());
                        to_query.push(name);
                    }
                    None => {
                        let matches: Vec<String> = inner
                            .fqdn_to_selectors
                            .keys()
                            .filter(|name| selector.matches(name))
                            .cloned()
                            .collect();
                        for name in matches {
                            inner
                                .fqdn_to_selectors
                                .get_mut(&name)
                                .expect("name came from fqdn_to_selectors keys")
                                .insert(selector.clone());
                            inner
                                .selector_to_fqdns
                                .entry(selector.clone())
                                .or_default()
                                .insert(name);
                        }
                    }
                }
            }

            inner
                .selector_to_rules
                .entry(selector)
                .or_default()
                .insert(rule.clone());
        }

        Ok(to_query)
    }

    /// Drops `rule` from each selector it referenced via `fqdns`,
    /// garbage-collecting orphaned selectors and, transitively, orphaned
    /// cache entries.
    pub fn remove_rule(&self, rule: &RuleId, fqdns: &[String]) -> Result<(), DomainError> {
        let mut inner = self.inner.lock().expect("selector/cache mutex poisoned");

        for raw in fqdns {
            let selector = SelectorItem::parse(raw)?;
            let Some(rules) = inner.selector_to_rules.get_mut(&selector) else {
                continue;
            };
            rules.remove(rule);
            if !rules.is_empty() {
                continue;
            }
            inner.selector_to_rules.remove(&selector);

            let Some(names) = inner.selector_to_fqdns.remove(&selector) else {
                continue;
            };
            for name in names {
                if let Some(selectors) = inner.fqdn_to_selectors.get_mut(&name) {
                    selectors.remove(&selector);
                    if selectors.is_empty() {
                        inner.fqdn_to_selectors.remove(&name);
                        if inner.cache.remove(&name).is_some() {
                            debug!(fqdn = %name, "evicted orphaned cache entry");
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Folds a freshly parsed response into the cache, establishing new
    /// bidirectional mappings on first sight of a name that some registered
    /// selector matches. Returns `None` if no selector cares about `fqdn`
    /// (the response is dropped, per the non-goal of caching unrelated
    /// names).
    pub fn merge_response(
        &self,
        now: DateTime<Utc>,
        fqdn: &str,
        fresh: &[(IpAddr, Duration)],
    ) -> Option<MergeOutcome> {
        let mut inner = self.inner.lock().expect("selector/cache mutex poisoned");

        if !inner.fqdn_to_selectors.contains_key(fqdn) {
            let matching: Vec<SelectorItem> = inner
                .selector_to_rules
                .keys()
                .filter(|s| s.matches(fqdn))
                .cloned()
                .collect();
            if matching.is_empty() {
                return None;
            }
            for selector in matching {
                inner
                    .fqdn_to_selectors
                    .entry(fqdn.to_string())
                    .or_default()
                    .insert(selector.clone());
                inner
                    .selector_to_fqdns
                    .entry(selector)
                    .or_default()
                    .insert(fqdn.to_string());
            }
        }

        let meta = inner.cache.entry(fqdn.to_string()).or_default();
        let outcome = meta.merge(now, fresh);
        if meta.is_empty() {
            inner.cache.remove(fqdn);
        }
        Some(outcome)
    }

    /// Union of rule IDs whose selectors currently match `fqdn`.
    pub fn matching_rules_for_fqdn(&self, fqdn: &str) -> HashSet<RuleId> {
        let inner = self.inner.lock().expect("selector/cache mutex poisoned");
        let mut rules = HashSet::new();
        if let Some(selectors) = inner.fqdn_to_selectors.get(fqdn) {
            for selector in selectors {
                if let Some(r) = inner.selector_to_rules.get(selector) {
                    rules.extend(r.iter().cloned());
                }
            }
        }
        rules
    }

    /// Union of cached IPs for every name matching any of `expressions`.
    pub fn ips_for_selectors(&self, expressions: &[String]) -> Result<Vec<IpAddr>, DomainError> {
        let inner = self.inner.lock().expect("selector/cache mutex poisoned");
        let mut out = HashSet::new();
        for raw in expressions {
            let selector = SelectorItem::parse(raw)?;
            for (name, meta) in inner.cache.iter() {
                if selector.matches(name) {
                    out.extend(meta.current_ips());
                }
            }
        }
        Ok(out.into_iter().collect())
    }

    pub fn selector_count(&self) -> usize {
        self.inner.lock().expect("selector/cache mutex poisoned").selector_to_rules.len()
    }

    pub fn cached_name_count(&self) -> usize {
        self.inner.lock().expect("selector/cache mutex poisoned").cache.len()
    }
}

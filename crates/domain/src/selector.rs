use std::hash::{Hash, Hasher};
use std::sync::Arc;

use fancy_regex::Regex;

use crate::errors::DomainError;

/// A single selector entry extracted from a NetworkPolicy FQDN rule.
///
/// Two flavors exist: an exact name match, compared case-insensitively, and
/// a wildcard pattern compiled once into a regex at insertion time. Equality
/// and hashing are defined purely in terms of the normalized source text so
/// that `SelectorItem`s can be used as hash map / hash set keys even though
/// the compiled regex itself implements neither.
#[derive(Debug, Clone)]
pub enum SelectorItem {
    ExactName(String),
    Wildcard { pattern: String, regex: Arc<Regex> },
}

impl SelectorItem {
    /// Builds a selector from a policy-authored FQDN string. Names without a
    /// `*` are treated as exact matches (after lowercasing and stripping a
    /// trailing dot); names containing `*` are compiled into an anchored
    /// regex where `*` matches any sequence of characters, including `.`.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return Err(DomainError::InvalidFqdn(raw.to_string()));
        }

        if !normalized.contains('*') {
            return Ok(SelectorItem::ExactName(normalized));
        }

        let pattern = wildcard_to_regex(&normalized);
        let regex = Regex::new(&pattern)
            .map_err(|e| DomainError::InvalidWildcardPattern(raw.to_string(), e.to_string()))?;
        Ok(SelectorItem::Wildcard {
            pattern: normalized,
            regex: Arc::new(regex),
        })
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, SelectorItem::Wildcard { .. })
    }

    /// The FQDN a newly-attached wildcard selector should not retroactively
    /// query for; exact selectors return their own name so callers can
    /// proactively schedule a lookup.
    pub fn exact_name(&self) -> Option<&str> {
        match self {
            SelectorItem::ExactName(name) => Some(name),
            SelectorItem::Wildcard { .. } => None,
        }
    }

    pub fn matches(&self, fqdn: &str) -> bool {
        let candidate = normalize(fqdn);
        match self {
            SelectorItem::ExactName(name) => *name == candidate,
            SelectorItem::Wildcard { regex, .. } => {
                regex.is_match(&candidate).unwrap_or(false)
            }
        }
    }

    fn source(&self) -> &str {
        match self {
            SelectorItem::ExactName(name) => name,
            SelectorItem::Wildcard { pattern, .. } => pattern,
        }
    }
}

impl PartialEq for SelectorItem {
    fn eq(&self, other: &Self) -> bool {
        self.is_wildcard() == other.is_wildcard() && self.source() == other.source()
    }
}

impl Eq for SelectorItem {}

impl Hash for SelectorItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.is_wildcard().hash(state);
        self.source().hash(state);
    }
}

fn normalize(raw: &str) -> String {
    raw.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Translates a wildcard FQDN into an anchored regex: every literal
/// character is escaped, every `*` becomes `.*` (crossing label
/// boundaries), and the whole pattern is anchored at both ends.
/// `*.k8s.io` matches `foo.k8s.io` and `a.b.k8s.io`, but not `k8s.io` or
/// `fooxk8sxio`.
fn wildcard_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');
    for c in pattern.chars() {
        if c == '*' {
            out.push_str(".*");
        } else {
            if "\\.+?()|[]{}^$#".contains(c) {
                out.push('\\');
            }
            out.push(c);
        }
    }
    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_names_normalize_case_and_trailing_dot() {
        let a = SelectorItem::parse("Example.COM.").unwrap();
        let b = SelectorItem::parse("example.com").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn wildcard_crosses_label_boundaries() {
        let item = SelectorItem::parse("*.k8s.io").unwrap();
        assert!(item.matches("foo.k8s.io"));
        assert!(item.matches("a.b.k8s.io"));
        assert!(!item.matches("k8s.io"));
        assert!(!item.matches("fooxk8sxio"));
    }

    #[test]
    fn invalid_fqdn_is_rejected() {
        assert!(SelectorItem::parse("   ").is_err());
    }

    #[test]
    fn selector_equality_ignores_compiled_regex_identity() {
        let a = SelectorItem::parse("*.example.com").unwrap();
        let b = SelectorItem::parse("*.EXAMPLE.com.").unwrap();
        assert_eq!(a, b);
        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }
}

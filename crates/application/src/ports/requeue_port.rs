use std::time::Duration;

/// Asks the query scheduler to (re-)resolve a name after `delay`. Used both
/// by the scheduler's own workers (after a proactive query) and by the
/// packet interceptor (after an intercepted response changes a name's
/// surviving TTL set).
pub trait Requeue: Send + Sync {
    fn schedule(&self, fqdn: String, delay: Duration);
}

use std::net::IpAddr;
use std::sync::Arc;

use netpol_fqdn_domain::DomainError;

use super::state::FqdnEnforcementState;

pub struct GetIpsForSelectorsUseCase {
    state: Arc<FqdnEnforcementState>,
}

impl GetIpsForSelectorsUseCase {
    pub fn new(state: Arc<FqdnEnforcementState>) -> Self {
        Self { state }
    }

    pub fn execute(&self, fqdns: Vec<String>) -> Result<Vec<IpAddr>, DomainError> {
        self.state.selector_cache.ips_for_selectors(&fqdns)
    }
}

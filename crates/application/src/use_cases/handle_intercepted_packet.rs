use std::sync::Arc;

use netpol_fqdn_domain::{DomainError, PacketHandle};

use super::state::FqdnEnforcementState;

pub struct HandleInterceptedPacketUseCase {
    state: Arc<FqdnEnforcementState>,
}

impl HandleInterceptedPacketUseCase {
    pub fn new(state: Arc<FqdnEnforcementState>) -> Self {
        Self { state }
    }

    pub async fn execute(&self, packet: PacketHandle) -> Result<(), DomainError> {
        self.state.interceptor.handle_intercepted_packet(packet).await
    }
}

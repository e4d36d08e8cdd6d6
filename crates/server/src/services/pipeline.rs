//! Per-request session pipeline.
//!
//! The gate only trusts `is_admin` once the resolver has settled, so the two
//! stages always run in order: resolve the session, then load the gate from
//! the settled status.

use std::sync::Arc;

use ai_portal_core::{Identity, SessionStatus};

use super::auth::{AuthBackend, SessionResolver};
use super::capabilities::CapabilityGate;
use crate::storage::BrowserStorage;

/// A resolved session and its capability gate.
pub struct SessionPipeline<B, S> {
    pub resolver: SessionResolver<B, S>,
    pub gate: CapabilityGate<S>,
}

impl<B: AuthBackend, S: BrowserStorage + Clone> SessionPipeline<B, S> {
    /// Run both stages for one browser.
    pub async fn run(backend: Arc<B>, storage: S, cookies: Option<String>) -> Self {
        let mut resolver = SessionResolver::new(backend, storage.clone(), cookies);
        let status = resolver.initialize().await;
        let gate = CapabilityGate::load(storage, status).await;
        Self { resolver, gate }
    }

    #[must_use]
    pub const fn status(&self) -> &SessionStatus {
        self.resolver.status()
    }

    /// Refresh the identity and rebuild the gate for the new status.
    ///
    /// Returns `None` when the refresh failed or found no session; the gate is
    /// closed in both cases.
    pub async fn refresh_user(&mut self) -> Option<&Identity> {
        self.resolver.refresh_user().await;
        self.gate = CapabilityGate::load(self.resolver.storage().clone(), self.resolver.status()).await;
        self.resolver.identity()
    }
}

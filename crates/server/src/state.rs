//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::PortalConfig;
use crate::services::auth::{AuthError, AuthStrategy};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PortalConfig,
    auth: Arc<AuthStrategy>,
}

impl AppState {
    /// Build the state and the session backend selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the session backend cannot be built.
    pub fn new(config: PortalConfig) -> Result<Self, AuthError> {
        let auth = AuthStrategy::from_config(&config.auth, &config.origin())?;
        Ok(Self::with_strategy(config, auth))
    }

    /// Use an already built backend.
    #[must_use]
    pub fn with_strategy(config: PortalConfig, auth: AuthStrategy) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                auth: Arc::new(auth),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    /// The session backend.
    #[must_use]
    pub fn auth(&self) -> &Arc<AuthStrategy> {
        &self.inner.auth
    }
}

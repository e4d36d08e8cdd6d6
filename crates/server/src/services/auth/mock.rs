//! Demo backend: a static user directory and a login marker.

use std::sync::Arc;
use std::time::Duration;

use ai_portal_core::Identity;

use super::{AuthBackend, AuthError, BrowserContext, MockUser, Navigation, UserDirectory};
use crate::storage::{BrowserStorage, keys};

/// Value of the login marker.
pub const DEMO_TOKEN: &str = "demo-token";

/// Mock strategy backend.
#[derive(Debug, Clone)]
pub struct MockBackend {
    directory: Arc<UserDirectory>,
    delay: Duration,
}

impl MockBackend {
    /// `delay` is added to every resolution to imitate provider latency.
    #[must_use]
    pub const fn new(directory: Arc<UserDirectory>, delay: Duration) -> Self {
        Self { directory, delay }
    }

    #[must_use]
    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    /// Persist `id` as the browser's demo account.
    ///
    /// Takes effect on the next resolution; it does not log the browser in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnknownMockUser` if `id` is not in the directory.
    pub async fn select_user<S: BrowserStorage>(
        &self,
        storage: &S,
        id: &str,
    ) -> Result<&MockUser, AuthError> {
        let user = self
            .directory
            .find(id)
            .ok_or_else(|| AuthError::UnknownMockUser(id.to_string()))?;
        storage.set(keys::MOCK_USER_ID, user.id.as_str()).await?;
        tracing::info!(user_id = %user.id, "Mock user selected");
        Ok(user)
    }
}

impl AuthBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn resolve<S: BrowserStorage>(
        &self,
        browser: &BrowserContext<'_, S>,
    ) -> Result<Option<Identity>, AuthError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let marker = browser.storage.get(keys::LOGIN_MARKER).await?;
        if marker.as_deref().is_none_or(str::is_empty) {
            return Ok(None);
        }

        let selected = browser.storage.get(keys::MOCK_USER_ID).await?;
        let user = self.directory.find_or_first(selected.as_deref());
        Ok(Some(user.to_identity()))
    }

    async fn login<S: BrowserStorage>(
        &self,
        browser: &BrowserContext<'_, S>,
    ) -> Result<Navigation, AuthError> {
        browser.storage.set(keys::LOGIN_MARKER, DEMO_TOKEN).await?;
        Ok(Navigation::Reload)
    }

    /// Drops the login and welcome markers. The selected user and the admin
    /// overlays stay.
    async fn logout<S: BrowserStorage>(
        &self,
        browser: &BrowserContext<'_, S>,
    ) -> Result<Navigation, AuthError> {
        browser.storage.remove(keys::LOGIN_MARKER).await?;
        browser.storage.remove(keys::WELCOME_SEEN).await?;
        Ok(Navigation::Reload)
    }

    async fn refresh<S: BrowserStorage>(
        &self,
        _browser: &BrowserContext<'_, S>,
        current: Option<&Identity>,
    ) -> Result<Option<Identity>, AuthError> {
        Ok(current.cloned())
    }
}

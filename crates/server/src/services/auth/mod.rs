//! Session resolution.
//!
//! A request's identity comes from one of two backends, chosen once at
//! startup from [`AuthConfig`](crate::config::AuthConfig):
//!
//! - [`MockBackend`]: a static user directory; "logging in" sets a marker in
//!   the browser session.
//! - [`ProviderBackend`]: an external identity provider whose session cookie is
//!   validated against an HTTP endpoint, with validated identities cached for a
//!   short TTL.
//!
//! [`SessionResolver`] drives either backend for one browser and never lets a
//! resolution error escape: failures degrade to an anonymous session carrying
//! [`AUTHENTICATION_FAILED`].

mod directory;
mod error;
mod mock;
mod provider;

use std::future::Future;
use std::sync::Arc;

use url::Url;

use ai_portal_core::{AUTHENTICATION_FAILED, Identity, SessionStatus};

use crate::config::AuthConfig;
use crate::storage::BrowserStorage;

pub use directory::{MockUser, UserDirectory};
pub use error::AuthError;
pub use mock::{DEMO_TOKEN, MockBackend};
pub use provider::ProviderBackend;

/// What the browser must do after a login or logout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Reload the portal.
    Reload,
    /// Leave the portal for this URL.
    Redirect(Url),
}

/// The browser a request comes from.
#[derive(Debug, Clone, Copy)]
pub struct BrowserContext<'a, S> {
    pub storage: &'a S,
    /// Raw `Cookie` header of the request.
    pub cookies: Option<&'a str>,
}

/// A source of identities.
pub trait AuthBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// The identity of the browser, if it has a session.
    fn resolve<S: BrowserStorage>(
        &self,
        browser: &BrowserContext<'_, S>,
    ) -> impl Future<Output = Result<Option<Identity>, AuthError>> + Send;

    fn login<S: BrowserStorage>(
        &self,
        browser: &BrowserContext<'_, S>,
    ) -> impl Future<Output = Result<Navigation, AuthError>> + Send;

    fn logout<S: BrowserStorage>(
        &self,
        browser: &BrowserContext<'_, S>,
    ) -> impl Future<Output = Result<Navigation, AuthError>> + Send;

    /// Re-resolve the identity, bypassing any cache.
    fn refresh<S: BrowserStorage>(
        &self,
        browser: &BrowserContext<'_, S>,
        current: Option<&Identity>,
    ) -> impl Future<Output = Result<Option<Identity>, AuthError>> + Send;
}

/// The backend selected at startup.
#[derive(Debug)]
pub enum AuthStrategy {
    Mock(MockBackend),
    Provider(ProviderBackend),
}

impl AuthStrategy {
    /// Build the backend described by `config`.
    ///
    /// `origin` is the portal origin handed to the provider as redirect target.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the mock directory is invalid or the provider
    /// client cannot be built.
    pub fn from_config(config: &AuthConfig, origin: &str) -> Result<Self, AuthError> {
        match config {
            AuthConfig::Mock(mock) => Ok(Self::Mock(MockBackend::new(
                Arc::new(UserDirectory::builtin()?),
                mock.delay,
            ))),
            AuthConfig::Keycloak(keycloak) => Ok(Self::Provider(ProviderBackend::new(
                keycloak.clone(),
                origin,
            )?)),
        }
    }

    #[must_use]
    pub const fn as_mock(&self) -> Option<&MockBackend> {
        match self {
            Self::Mock(mock) => Some(mock),
            Self::Provider(_) => None,
        }
    }
}

impl AuthBackend for AuthStrategy {
    fn name(&self) -> &'static str {
        match self {
            Self::Mock(b) => b.name(),
            Self::Provider(b) => b.name(),
        }
    }

    async fn resolve<S: BrowserStorage>(
        &self,
        browser: &BrowserContext<'_, S>,
    ) -> Result<Option<Identity>, AuthError> {
        match self {
            Self::Mock(b) => b.resolve(browser).await,
            Self::Provider(b) => b.resolve(browser).await,
        }
    }

    async fn login<S: BrowserStorage>(
        &self,
        browser: &BrowserContext<'_, S>,
    ) -> Result<Navigation, AuthError> {
        match self {
            Self::Mock(b) => b.login(browser).await,
            Self::Provider(b) => b.login(browser).await,
        }
    }

    async fn logout<S: BrowserStorage>(
        &self,
        browser: &BrowserContext<'_, S>,
    ) -> Result<Navigation, AuthError> {
        match self {
            Self::Mock(b) => b.logout(browser).await,
            Self::Provider(b) => b.logout(browser).await,
        }
    }

    async fn refresh<S: BrowserStorage>(
        &self,
        browser: &BrowserContext<'_, S>,
        current: Option<&Identity>,
    ) -> Result<Option<Identity>, AuthError> {
        match self {
            Self::Mock(b) => b.refresh(browser, current).await,
            Self::Provider(b) => b.refresh(browser, current).await,
        }
    }
}

/// Session state of one browser.
///
/// Starts in [`SessionStatus::Loading`]; [`initialize`](Self::initialize)
/// moves it to authenticated or anonymous.
pub struct SessionResolver<B, S> {
    backend: Arc<B>,
    storage: S,
    cookies: Option<String>,
    status: SessionStatus,
}

impl<B: AuthBackend, S: BrowserStorage> SessionResolver<B, S> {
    #[must_use]
    pub fn new(backend: Arc<B>, storage: S, cookies: Option<String>) -> Self {
        Self {
            backend,
            storage,
            cookies,
            status: SessionStatus::Loading,
        }
    }

    #[must_use]
    pub const fn status(&self) -> &SessionStatus {
        &self.status
    }

    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.status.identity()
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn browser(&self) -> BrowserContext<'_, S> {
        BrowserContext {
            storage: &self.storage,
            cookies: self.cookies.as_deref(),
        }
    }

    /// Resolve the session once. Later calls return the settled status.
    pub async fn initialize(&mut self) -> &SessionStatus {
        if !self.status.is_loading() {
            return &self.status;
        }

        let resolved = self.backend.resolve(&self.browser()).await;
        self.status = match resolved {
            Ok(Some(identity)) => {
                tracing::debug!(
                    backend = self.backend.name(),
                    user_id = %identity.id,
                    role = %identity.role,
                    "Session resolved"
                );
                SessionStatus::Authenticated(identity)
            }
            Ok(None) => SessionStatus::anonymous(),
            Err(e) => {
                tracing::error!(
                    backend = self.backend.name(),
                    error = %e,
                    "Session resolution failed"
                );
                SessionStatus::failed(AUTHENTICATION_FAILED)
            }
        };
        &self.status
    }

    /// Start a login. The session is loading until the browser comes back.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the backend cannot record the login.
    pub async fn login(&mut self) -> Result<Navigation, AuthError> {
        let navigation = self.backend.login(&self.browser()).await?;
        self.status = SessionStatus::Loading;
        Ok(navigation)
    }

    /// End the session. The cached identity is dropped even if the backend
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the backend cannot clear the session.
    pub async fn logout(&mut self) -> Result<Navigation, AuthError> {
        let result = self.backend.logout(&self.browser()).await;
        self.status = SessionStatus::anonymous();
        result
    }

    /// Whether the identity holds `role`, by role name or group.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.identity().is_some_and(|i| i.has_role(role))
    }

    /// Re-resolve the identity, bypassing caches.
    ///
    /// A failed refresh does not keep the previous identity: the session
    /// becomes anonymous with an error and `None` is returned.
    pub async fn refresh_user(&mut self) -> Option<&Identity> {
        let refreshed = self
            .backend
            .refresh(&self.browser(), self.status.identity())
            .await;
        self.status = match refreshed {
            Ok(Some(identity)) => SessionStatus::Authenticated(identity),
            Ok(None) => SessionStatus::anonymous(),
            Err(e) => {
                tracing::error!(
                    backend = self.backend.name(),
                    error = %e,
                    "Identity refresh failed"
                );
                SessionStatus::failed(AUTHENTICATION_FAILED)
            }
        };
        self.identity()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use ai_portal_core::Role;

    use super::*;
    use crate::storage::{MemoryStorage, keys};

    fn mock_backend() -> Arc<MockBackend> {
        Arc::new(MockBackend::new(
            Arc::new(UserDirectory::builtin().unwrap()),
            Duration::ZERO,
        ))
    }

    /// Backend whose resolution always fails.
    struct Broken {
        calls: AtomicUsize,
    }

    impl AuthBackend for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn resolve<S: BrowserStorage>(
            &self,
            _browser: &BrowserContext<'_, S>,
        ) -> Result<Option<Identity>, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AuthError::MalformedIdentity("no subject".to_string()))
        }

        async fn login<S: BrowserStorage>(
            &self,
            _browser: &BrowserContext<'_, S>,
        ) -> Result<Navigation, AuthError> {
            Err(AuthError::Unsupported("broken"))
        }

        async fn logout<S: BrowserStorage>(
            &self,
            _browser: &BrowserContext<'_, S>,
        ) -> Result<Navigation, AuthError> {
            Err(AuthError::Unsupported("broken"))
        }

        async fn refresh<S: BrowserStorage>(
            &self,
            _browser: &BrowserContext<'_, S>,
            _current: Option<&Identity>,
        ) -> Result<Option<Identity>, AuthError> {
            Err(AuthError::Unsupported("broken"))
        }
    }

    #[tokio::test]
    async fn test_initialize_without_marker_is_anonymous() {
        let mut resolver = SessionResolver::new(mock_backend(), MemoryStorage::new(), None);
        assert!(resolver.status().is_loading());

        let status = resolver.initialize().await;
        assert!(!status.is_authenticated());
        assert!(!status.is_loading());
        assert_eq!(status.error(), None);
    }

    #[tokio::test]
    async fn test_initialize_failure_degrades_to_anonymous_with_error() {
        let backend = Arc::new(Broken {
            calls: AtomicUsize::new(0),
        });
        let mut resolver = SessionResolver::new(backend.clone(), MemoryStorage::new(), None);

        let status = resolver.initialize().await;
        assert!(!status.is_authenticated());
        assert_eq!(status.error(), Some(AUTHENTICATION_FAILED));

        // Settled: no second resolution.
        resolver.initialize().await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_login_then_initialize_authenticates() {
        let storage = MemoryStorage::new();
        let mut resolver = SessionResolver::new(mock_backend(), storage.clone(), None);
        resolver.initialize().await;

        assert_eq!(resolver.login().await.unwrap(), Navigation::Reload);
        assert!(resolver.status().is_loading());

        // The reloaded page builds a new resolver over the same storage.
        let mut reloaded = SessionResolver::new(mock_backend(), storage, None);
        let identity = reloaded.initialize().await.identity().unwrap();
        assert_eq!(identity.id.as_str(), "user-1");
        assert_eq!(identity.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_logout_clears_identity() {
        let storage = MemoryStorage::new();
        storage.set(keys::LOGIN_MARKER, DEMO_TOKEN).await.unwrap();
        let mut resolver = SessionResolver::new(mock_backend(), storage.clone(), None);
        assert!(resolver.initialize().await.is_authenticated());

        assert_eq!(resolver.logout().await.unwrap(), Navigation::Reload);
        assert!(resolver.identity().is_none());
        assert_eq!(storage.get(keys::LOGIN_MARKER).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_has_role_checks_role_and_groups() {
        let storage = MemoryStorage::new();
        storage.set(keys::LOGIN_MARKER, DEMO_TOKEN).await.unwrap();
        storage.set(keys::MOCK_USER_ID, "user-2").await.unwrap();
        let mut resolver = SessionResolver::new(mock_backend(), storage, None);

        assert!(!resolver.has_role("contributor"));
        resolver.initialize().await;

        assert!(resolver.has_role("contributor"));
        assert!(resolver.has_role("data-team"));
        assert!(!resolver.has_role("admin"));
    }

    /// Mock login whose refresh always fails, like a provider answering 500.
    struct Revoked(Arc<MockBackend>);

    impl AuthBackend for Revoked {
        fn name(&self) -> &'static str {
            "revoked"
        }

        async fn resolve<S: BrowserStorage>(
            &self,
            browser: &BrowserContext<'_, S>,
        ) -> Result<Option<Identity>, AuthError> {
            self.0.resolve(browser).await
        }

        async fn login<S: BrowserStorage>(
            &self,
            browser: &BrowserContext<'_, S>,
        ) -> Result<Navigation, AuthError> {
            self.0.login(browser).await
        }

        async fn logout<S: BrowserStorage>(
            &self,
            browser: &BrowserContext<'_, S>,
        ) -> Result<Navigation, AuthError> {
            self.0.logout(browser).await
        }

        async fn refresh<S: BrowserStorage>(
            &self,
            _browser: &BrowserContext<'_, S>,
            _current: Option<&Identity>,
        ) -> Result<Option<Identity>, AuthError> {
            Err(AuthError::Validation(reqwest::StatusCode::INTERNAL_SERVER_ERROR))
        }
    }

    #[tokio::test]
    async fn test_refresh_error_after_failed_initialize() {
        let backend = Arc::new(Broken {
            calls: AtomicUsize::new(0),
        });
        let mut resolver = SessionResolver::new(backend, MemoryStorage::new(), None);
        resolver.initialize().await;

        assert!(resolver.refresh_user().await.is_none());
        assert_eq!(resolver.status().error(), Some(AUTHENTICATION_FAILED));
    }

    #[tokio::test]
    async fn test_refresh_error_drops_identity() {
        let storage = MemoryStorage::new();
        storage.set(keys::LOGIN_MARKER, DEMO_TOKEN).await.unwrap();
        let mut resolver =
            SessionResolver::new(Arc::new(Revoked(mock_backend())), storage, None);
        assert!(resolver.initialize().await.is_authenticated());
        assert!(resolver.has_role("admin"));

        assert!(resolver.refresh_user().await.is_none());
        assert!(!resolver.status().is_authenticated());
        assert!(!resolver.has_role("admin"));
        assert_eq!(resolver.status().error(), Some(AUTHENTICATION_FAILED));
    }
}

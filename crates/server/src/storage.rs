//! Per-browser key-value storage.
//!
//! Everything the portal remembers about a browser (demo login marker,
//! selected mock user, admin overlays, welcome marker) goes through
//! [`BrowserStorage`]. In production the store is the browser's
//! `tower-sessions` session; tests use [`MemoryStorage`].
//!
//! Only the session resolver and the capability gate write these keys.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tower_sessions::Session;

/// Keys of the per-browser store.
pub mod keys {
    /// Set by a demo login, removed by logout.
    pub const LOGIN_MARKER: &str = "demo_auth_token";
    /// Selected mock user id. Survives logout.
    pub const MOCK_USER_ID: &str = "mockUserId";
    /// JSON blob of the admin feature flags.
    pub const FEATURE_FLAGS: &str = "adminFeatureFlags";
    /// `"true"` while an admin views the portal as a regular user.
    pub const VIEW_AS_USER: &str = "adminViewAsUser";
    /// Set once the welcome message has been shown.
    pub const WELCOME_SEEN: &str = "hasVisitedPortal";
}

/// Storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The session store rejected the operation.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
    /// A value could not be encoded for storage.
    #[error("encode error: {0}")]
    Encode(#[source] serde_json::Error),
}

/// String key-value store scoped to one browser.
///
/// Last write wins; there is no cross-tab coordination.
pub trait BrowserStorage: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Remove every key.
    fn clear(&self) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// [`BrowserStorage`] backed by the request's `tower-sessions` session.
#[derive(Debug, Clone)]
pub struct SessionStorage(Session);

impl SessionStorage {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self(session)
    }
}

impl BrowserStorage for SessionStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.0.get::<String>(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.0.insert(key, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.0.remove_value(key).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.0.clear().await;
        Ok(())
    }
}

/// In-memory [`BrowserStorage`]. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the stored keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl BrowserStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.inner.write().await.clear();
        Ok(())
    }
}

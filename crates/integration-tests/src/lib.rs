//! Integration test harness for the AI portal.
//!
//! Every test runs its own portal on an ephemeral port, and, for the
//! identity provider strategy, a throwaway axum server standing in for the
//! provider's validation endpoint.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ai-portal-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    Json, Router,
    extract::State,
    http::{
        HeaderMap, StatusCode,
        header::{CONTENT_TYPE, COOKIE},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use reqwest::{Client, cookie::Jar, redirect::Policy};
use serde_json::Value;
use url::Url;

use ai_portal_server::config::{ConfigError, PortalConfig};
use ai_portal_server::state::AppState;

/// Name of the provider session cookie the portal looks for.
pub const PROVIDER_COOKIE: &str = "KEYCLOAK_SESSION";

/// Base URL the test portals are configured with.
pub const PORTAL_BASE_URL: &str = "http://localhost:3000";

/// Build a portal configuration from `(name, value)` pairs.
///
/// `PORTAL_BASE_URL` is preset.
///
/// # Errors
///
/// Returns `ConfigError` if the pairs do not form a valid configuration.
pub fn portal_config(pairs: &[(&str, &str)]) -> Result<PortalConfig, ConfigError> {
    let mut vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    vars.entry("PORTAL_BASE_URL".to_string())
        .or_insert_with(|| PORTAL_BASE_URL.to_string());
    PortalConfig::from_source(&|key: &str| vars.get(key).cloned())
}

async fn serve(router: Router) -> std::io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(addr)
}

/// A running portal and a browser-like client for it.
pub struct TestPortal {
    pub base_url: Url,
    pub client: Client,
    pub jar: Arc<Jar>,
}

impl TestPortal {
    /// Start a portal for `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be built or the server cannot
    /// bind.
    pub async fn start(config: PortalConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let state = AppState::new(config)?;
        let addr = serve(ai_portal_server::app(state)).await?;
        let base_url = Url::parse(&format!("http://{addr}"))?;
        let (client, jar) = Self::browser()?;
        Ok(Self {
            base_url,
            client,
            jar,
        })
    }

    /// A fresh cookie jar and a client that does not follow redirects.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the client cannot be built.
    pub fn browser() -> Result<(Client, Arc<Jar>), reqwest::Error> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .redirect(Policy::none())
            .build()?;
        Ok((client, jar))
    }

    /// Absolute URL of `path` on this portal.
    #[must_use]
    pub fn url(&self, path: &str) -> Url {
        self.base_url.join(path).unwrap_or_else(|_| self.base_url.clone())
    }

    /// Store a provider session cookie for the portal's host.
    pub fn set_provider_cookie(&self, value: &str) {
        self.jar
            .add_cookie_str(&format!("{PROVIDER_COOKIE}={value}; Path=/"), &self.base_url);
    }
}

/// What the fake provider answers and what it has seen.
#[derive(Debug)]
pub struct ProviderState {
    response: Mutex<(StatusCode, Value)>,
    calls: AtomicUsize,
    last_cookie: Mutex<Option<String>>,
    last_content_type: Mutex<Option<String>>,
}

/// Throwaway identity provider validation endpoint at `/auth/me`.
pub struct FakeProvider {
    pub validation_url: Url,
    state: Arc<ProviderState>,
}

impl FakeProvider {
    /// Start a provider answering `status` with `body`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot bind.
    pub async fn start(status: StatusCode, body: Value) -> Result<Self, Box<dyn std::error::Error>> {
        let state = Arc::new(ProviderState {
            response: Mutex::new((status, body)),
            calls: AtomicUsize::new(0),
            last_cookie: Mutex::new(None),
            last_content_type: Mutex::new(None),
        });
        let router = Router::new()
            .route("/auth/me", get(validate))
            .with_state(Arc::clone(&state));
        let addr = serve(router).await?;
        let validation_url = Url::parse(&format!("http://{addr}/auth/me"))?;
        Ok(Self {
            validation_url,
            state,
        })
    }

    /// Change the answer for later calls.
    pub fn respond_with(&self, status: StatusCode, body: Value) {
        *self
            .state
            .response
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = (status, body);
    }

    /// Number of validation calls received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// `Cookie` header of the last validation call.
    #[must_use]
    pub fn last_cookie(&self) -> Option<String> {
        self.state
            .last_cookie
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `Content-Type` header of the last validation call.
    #[must_use]
    pub fn last_content_type(&self) -> Option<String> {
        self.state
            .last_content_type
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn header(headers: &HeaderMap, name: axum::http::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

async fn validate(State(state): State<Arc<ProviderState>>, headers: HeaderMap) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);
    *state
        .last_cookie
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = header(&headers, COOKIE);
    *state
        .last_content_type
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = header(&headers, CONTENT_TYPE);

    let (status, body) = state
        .response
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    (status, Json(body)).into_response()
}

/// Provider claims for a typical user.
#[must_use]
pub fn claims(sub: &str, role: &str, groups: &[&str]) -> Value {
    serde_json::json!({
        "sub": sub,
        "preferred_username": sub,
        "email": format!("{sub}@example.com"),
        "name": format!("User {sub}"),
        "role": role,
        "groups": groups,
    })
}

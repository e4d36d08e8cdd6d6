//! Portal configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PORTAL_BASE_URL` - Public URL of the portal (login/logout callback target)
//!
//! ## Optional
//! - `PORTAL_HOST` - Bind address (default: 127.0.0.1)
//! - `PORTAL_PORT` - Listen port (default: 3000)
//! - `PORTAL_LOG_JSON` - `true` for JSON log lines (default: text)
//! - `PORTAL_USE_KEYCLOAK_AUTH` - `true` selects the identity provider strategy,
//!   anything else the mock strategy
//! - `MOCK_AUTH_DELAY_MS` - Artificial latency of the mock strategy (default: 0)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (identity provider, read only when `PORTAL_USE_KEYCLOAK_AUTH=true`)
//! - `KEYCLOAK_URL` - Provider base URL (default: <http://localhost:8080>)
//! - `KEYCLOAK_REALM` - Realm (default: master)
//! - `KEYCLOAK_CLIENT_ID` - OAuth client id (default: portal-app)
//! - `AUTH_VALIDATION_URL` - Session validation endpoint
//!   (default: `{PORTAL_BASE_URL}/auth/me`)
//! - `AUTH_CACHE_TTL_SECS` - How long a validated identity is reused (default: 30)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_KEYCLOAK_URL: &str = "http://localhost:8080";
const DEFAULT_KEYCLOAK_REALM: &str = "master";
const DEFAULT_KEYCLOAK_CLIENT_ID: &str = "portal-app";
const DEFAULT_VALIDATION_PATH: &str = "/auth/me";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Portal application configuration.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the portal
    pub base_url: Url,
    /// Emit JSON log lines instead of human-readable text
    pub log_json: bool,
    /// Which session backend resolves identities
    pub auth: AuthConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Session backend selection, fixed at startup.
#[derive(Debug, Clone)]
pub enum AuthConfig {
    /// Static user directory, demo login marker in the browser session.
    Mock(MockAuthConfig),
    /// External identity provider.
    Keycloak(KeycloakConfig),
}

/// Mock strategy settings.
#[derive(Debug, Clone, Default)]
pub struct MockAuthConfig {
    /// Latency added to every resolution
    pub delay: Duration,
}

/// Identity provider settings.
#[derive(Debug, Clone)]
pub struct KeycloakConfig {
    /// Provider base URL
    pub url: Url,
    /// Realm name
    pub realm: String,
    /// OAuth client id of the portal
    pub client_id: String,
    /// Endpoint asserting the caller's session (cookies forwarded)
    pub validation_url: Url,
    /// Lifetime of a cached validated identity
    pub cache_ttl: Duration,
}

impl PortalConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_source(&|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_source(env: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(env);

        let host = vars
            .or_default("PORTAL_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORTAL_HOST".to_string(), e.to_string()))?;
        let port = vars
            .or_default("PORTAL_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORTAL_PORT".to_string(), e.to_string()))?;
        let base_url = vars.url("PORTAL_BASE_URL", None)?;
        let log_json = vars.flag("PORTAL_LOG_JSON");

        let auth = if vars.flag("PORTAL_USE_KEYCLOAK_AUTH") {
            AuthConfig::Keycloak(KeycloakConfig::from_vars(&vars, &base_url)?)
        } else {
            AuthConfig::Mock(MockAuthConfig {
                delay: Duration::from_millis(vars.number("MOCK_AUTH_DELAY_MS", 0)?),
            })
        };

        Ok(Self {
            host,
            port,
            base_url,
            log_json,
            auth,
            sentry_dsn: vars.optional("SENTRY_DSN"),
            sentry_environment: vars.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: vars
                .optional("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            sentry_traces_sample_rate: vars
                .optional("SENTRY_TRACES_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Origin of the portal, used as login/logout callback target.
    #[must_use]
    pub fn origin(&self) -> String {
        self.base_url.origin().ascii_serialization()
    }

    /// Whether cookies must carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

impl KeycloakConfig {
    fn from_vars(vars: &Vars<'_>, base_url: &Url) -> Result<Self, ConfigError> {
        let default_validation = base_url
            .join(DEFAULT_VALIDATION_PATH)
            .map_err(|e| ConfigError::InvalidEnvVar("PORTAL_BASE_URL".to_string(), e.to_string()))?;

        Ok(Self {
            url: vars.url("KEYCLOAK_URL", Some(DEFAULT_KEYCLOAK_URL))?,
            realm: vars.or_default("KEYCLOAK_REALM", DEFAULT_KEYCLOAK_REALM),
            client_id: vars.or_default("KEYCLOAK_CLIENT_ID", DEFAULT_KEYCLOAK_CLIENT_ID),
            validation_url: vars.url("AUTH_VALIDATION_URL", Some(default_validation.as_str()))?,
            cache_ttl: Duration::from_secs(vars.number("AUTH_CACHE_TTL_SECS", 30)?),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Typed accessors over a key lookup.
struct Vars<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Vars<'_> {
    /// Get an optional variable. Empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// `true` only for the literal string "true" (case-insensitive).
    fn flag(&self, key: &str) -> bool {
        self.optional(key)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    fn number(&self, key: &str, default: u64) -> Result<u64, ConfigError> {
        self.optional(key).map_or(Ok(default), |v| {
            v.trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    ConfigError::InvalidEnvVar(key.to_string(), e.to_string())
                })
        })
    }

    /// Parse an absolute http(s) URL. `default = None` makes the variable required.
    fn url(&self, key: &str, default: Option<&str>) -> Result<Url, ConfigError> {
        let raw = match (self.optional(key), default) {
            (Some(value), _) => value,
            (None, Some(default)) => default.to_string(),
            (None, None) => return Err(ConfigError::MissingEnvVar(key.to_string())),
        };
        let url = Url::parse(raw.trim())
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        Ok(url)
    }
}

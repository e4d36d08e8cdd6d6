//! Identity provider backend.
//!
//! The provider's session cookie marks a browser as possibly logged in. The
//! session is confirmed by calling the validation endpoint with the browser's
//! cookies forwarded; a 401 means "not logged in", anything else non-2xx is an
//! error.

use std::time::Duration;

use moka::future::Cache;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE};
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

use ai_portal_core::{Email, Identity, Role, UserId};

use super::{AuthBackend, AuthError, BrowserContext, Navigation};
use crate::config::KeycloakConfig;
use crate::storage::BrowserStorage;

/// Name of the provider session cookie. A realm-suffixed variant is accepted
/// too.
const SESSION_COOKIE: &str = "KEYCLOAK_SESSION";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Provider strategy backend.
#[derive(Debug)]
pub struct ProviderBackend {
    config: KeycloakConfig,
    client: reqwest::Client,
    /// Validated identities by session cookie value. `None` when the TTL is 0.
    cache: Option<Cache<String, Identity>>,
    authorization_url: Url,
    logout_url: Url,
}

impl ProviderBackend {
    /// `origin` is where the provider sends the browser back to.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the HTTP client cannot be built or the provider
    /// endpoints cannot be derived from the configured URL.
    pub fn new(config: KeycloakConfig, origin: &str) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let mut authorization_url = endpoint(&config, "auth")?;
        authorization_url
            .query_pairs_mut()
            .append_pair("client_id", &config.client_id)
            .append_pair("redirect_uri", origin)
            .append_pair("response_type", "code")
            .append_pair("scope", "openid");

        let mut logout_url = endpoint(&config, "logout")?;
        logout_url
            .query_pairs_mut()
            .append_pair("redirect_uri", origin);

        let cache = (!config.cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(10_000)
                .time_to_live(config.cache_ttl)
                .build()
        });

        Ok(Self {
            config,
            client,
            cache,
            authorization_url,
            logout_url,
        })
    }

    /// Where the browser goes to log in.
    #[must_use]
    pub const fn authorization_url(&self) -> &Url {
        &self.authorization_url
    }

    /// Where the browser goes to end the provider session.
    #[must_use]
    pub const fn logout_url(&self) -> &Url {
        &self.logout_url
    }

    /// Value of the provider session cookie in a `Cookie` header.
    fn session_marker<'a>(&self, cookies: &'a str) -> Option<&'a str> {
        let realm_cookie = format!("{SESSION_COOKIE}_{}", self.config.realm);
        cookies
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE || *name == realm_cookie)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }

    async fn validate(&self, cookies: &str) -> Result<Option<Identity>, AuthError> {
        let response = self
            .client
            .get(self.config.validation_url.clone())
            .header(COOKIE, cookies)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::debug!("Provider reports no active session");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AuthError::Validation(status));
        }

        let claims: ProviderClaims = response.json().await?;
        claims.into_identity().map(Some)
    }

    async fn cache_put(&self, marker: &str, identity: Option<&Identity>) {
        let Some(cache) = &self.cache else { return };
        match identity {
            Some(identity) => cache.insert(marker.to_string(), identity.clone()).await,
            None => cache.invalidate(marker).await,
        }
    }
}

/// Path `/realms/{realm}/protocol/openid-connect/{leaf}` under the provider URL.
fn endpoint(config: &KeycloakConfig, leaf: &str) -> Result<Url, AuthError> {
    let mut url = config.url.clone();
    url.path_segments_mut()
        .map_err(|()| AuthError::InvalidEndpoint(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
        .pop_if_empty()
        .extend(["realms", &config.realm, "protocol", "openid-connect", leaf]);
    url.set_query(None);
    Ok(url)
}

/// Claims returned by the validation endpoint. Both OIDC and portal field
/// names are accepted.
#[derive(Debug, Deserialize)]
struct ProviderClaims {
    sub: Option<String>,
    id: Option<String>,
    preferred_username: Option<String>,
    username: Option<String>,
    name: Option<String>,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    email: Option<String>,
    role: Option<String>,
    #[serde(default)]
    groups: Option<Vec<String>>,
    access_token: Option<String>,
}

/// Empty claims count as absent.
fn present(claim: Option<String>) -> Option<String> {
    claim.filter(|value| !value.trim().is_empty())
}

impl ProviderClaims {
    /// Only the subject is required. An unusable email is dropped.
    fn into_identity(self) -> Result<Identity, AuthError> {
        let id = present(self.sub)
            .or_else(|| present(self.id))
            .ok_or_else(|| AuthError::MalformedIdentity("missing subject".to_string()))?;
        let id = UserId::parse(&id).map_err(|e| AuthError::MalformedIdentity(e.to_string()))?;

        let email = present(self.email).and_then(|email| match Email::parse(&email) {
            Ok(email) => Some(email),
            Err(e) => {
                tracing::warn!(user_id = %id, error = %e, "Ignoring invalid email claim");
                None
            }
        });

        let username = present(self.preferred_username)
            .or_else(|| present(self.username))
            .unwrap_or_else(|| id.to_string());
        let display_name = present(self.name)
            .or_else(|| present(self.display_name))
            .unwrap_or_else(|| username.clone());

        Ok(Identity {
            id,
            username,
            display_name,
            email,
            role: Role::from_provider(self.role.as_deref()),
            groups: self.groups.unwrap_or_default().into_iter().collect(),
            access_token: self.access_token.map(SecretString::from),
        })
    }
}

impl AuthBackend for ProviderBackend {
    fn name(&self) -> &'static str {
        "keycloak"
    }

    async fn resolve<S: BrowserStorage>(
        &self,
        browser: &BrowserContext<'_, S>,
    ) -> Result<Option<Identity>, AuthError> {
        let Some(cookies) = browser.cookies else {
            return Ok(None);
        };
        let Some(marker) = self.session_marker(cookies) else {
            return Ok(None);
        };

        if let Some(cache) = &self.cache {
            if let Some(identity) = cache.get(marker).await {
                return Ok(Some(identity));
            }
        }

        let identity = self.validate(cookies).await?;
        self.cache_put(marker, identity.as_ref()).await;
        Ok(identity)
    }

    async fn login<S: BrowserStorage>(
        &self,
        _browser: &BrowserContext<'_, S>,
    ) -> Result<Navigation, AuthError> {
        Ok(Navigation::Redirect(self.authorization_url.clone()))
    }

    /// Forgets the cached identity and every per-browser key, then sends the
    /// browser to the provider.
    async fn logout<S: BrowserStorage>(
        &self,
        browser: &BrowserContext<'_, S>,
    ) -> Result<Navigation, AuthError> {
        if let Some(marker) = browser.cookies.and_then(|c| self.session_marker(c)) {
            self.cache_put(marker, None).await;
        }
        browser.storage.clear().await?;
        Ok(Navigation::Redirect(self.logout_url.clone()))
    }

    async fn refresh<S: BrowserStorage>(
        &self,
        browser: &BrowserContext<'_, S>,
        _current: Option<&Identity>,
    ) -> Result<Option<Identity>, AuthError> {
        let Some(cookies) = browser.cookies else {
            return Ok(None);
        };
        let Some(marker) = self.session_marker(cookies) else {
            return Ok(None);
        };
        let identity = match self.validate(cookies).await {
            Ok(identity) => identity,
            Err(e) => {
                self.cache_put(marker, None).await;
                return Err(e);
            }
        };
        self.cache_put(marker, identity.as_ref()).await;
        Ok(identity)
    }
}

//! Resolved identities and the session status built around them.

use std::collections::BTreeSet;

use secrecy::SecretString;
use serde::Serialize;

use super::{Email, Role, UserId};

/// Error message surfaced when session resolution fails unexpectedly.
pub const AUTHENTICATION_FAILED: &str = "Authentication failed";

/// A normalized, authenticated identity.
///
/// Built once by a session backend and never mutated afterwards. Implements
/// `Debug` manually to redact the provider access token, which is also never
/// serialized.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Stable subject identifier.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Human-readable name shown in the header and profile.
    pub display_name: String,
    /// Contact email. Providers may omit it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    /// Role as reported by the directory or provider.
    ///
    /// This is the *real* role, even while an admin is viewing the portal as
    /// a regular user.
    pub role: Role,
    /// Group memberships (sorted, deduplicated).
    pub groups: BTreeSet<String>,
    /// Provider access token, if the backend issued one.
    #[serde(skip)]
    pub access_token: Option<SecretString>,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("display_name", &self.display_name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("groups", &self.groups)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Identity {
    /// The single authorization primitive of the portal.
    ///
    /// True when `role` equals the identity's role name or when the identity
    /// belongs to a group named `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_str() == role || self.groups.contains(role)
    }

    /// Whether the real role unlocks the administrator overlays.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Outcome of session resolution.
///
/// Starts as `Loading`, moves exactly once to `Authenticated` or `Anonymous`,
/// and may be reset to `Anonymous` by a logout.
#[derive(Debug, Clone, Default)]
pub enum SessionStatus {
    /// Resolution has not finished yet.
    #[default]
    Loading,
    /// The caller is authenticated.
    Authenticated(Identity),
    /// The caller is not authenticated. `error` is set when resolution failed
    /// rather than simply finding no session.
    Anonymous {
        /// Failure message, if resolution failed.
        error: Option<String>,
    },
}

impl SessionStatus {
    /// An anonymous status without error.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self::Anonymous { error: None }
    }

    /// An anonymous status carrying a failure message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Anonymous {
            error: Some(message.into()),
        }
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// The authenticated identity, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    /// The resolution error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Anonymous { error } => error.as_deref(),
            _ => None,
        }
    }

    /// Flat JSON view consumed by the presentation layer.
    #[must_use]
    pub fn view(&self) -> SessionStatusView<'_> {
        SessionStatusView {
            is_authenticated: self.is_authenticated(),
            user: self.identity(),
            is_loading: self.is_loading(),
            error: self.error(),
        }
    }
}

/// Serialized form of [`SessionStatus`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusView<'a> {
    pub is_authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<&'a Identity>,
    pub is_loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
}

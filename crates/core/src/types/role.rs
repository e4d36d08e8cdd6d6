//! Portal roles.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role: {0}")]
pub struct UnknownRole(pub String);

/// Role carried by an [`Identity`](super::Identity).
///
/// Roles are flat: authorization checks go through
/// [`Identity::has_role`](super::Identity::has_role), which also accepts group
/// membership, rather than through an ordering of roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Browses the catalog, manages favorites.
    #[default]
    User,
    /// Can additionally publish catalog entries.
    Contributor,
    /// Manages feature flags and sees the usage dashboard.
    Admin,
    /// Same portal privileges as `Admin`.
    SuperAdmin,
}

impl Role {
    /// Wire name of the role (`"user"`, `"contributor"`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Contributor => "contributor",
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }

    /// Whether this role unlocks the administrator overlays (feature flags and
    /// the "view as user" toggle).
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }

    /// Map a role claim from the identity provider.
    ///
    /// A missing claim means `User`. An unrecognized claim also degrades to
    /// `User` so that a misconfigured realm can never grant privileges.
    #[must_use]
    pub fn from_provider(claim: Option<&str>) -> Self {
        match claim {
            None => Self::User,
            Some(raw) => raw.parse().unwrap_or_else(|e: UnknownRole| {
                tracing::warn!(error = %e, "Unrecognized role claim, treating as user");
                Self::User
            }),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "contributor" => Ok(Self::Contributor),
            "admin" => Ok(Self::Admin),
            "super_admin" => Ok(Self::SuperAdmin),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}

//! Static user directory of the mock strategy.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use ai_portal_core::{Email, Identity, Role, UserId};

use super::AuthError;

/// Directory shipped with the server.
const BUILTIN_DIRECTORY: &str = include_str!("../../../data/mock_users.json");

/// One demo account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockUser {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    pub email: Email,
    pub role: Role,
    #[serde(default)]
    pub groups: BTreeSet<String>,
}

impl MockUser {
    /// Identity built from this account. Demo accounts carry no access token.
    #[must_use]
    pub fn to_identity(&self) -> Identity {
        Identity {
            id: self.id.clone(),
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            email: Some(self.email.clone()),
            role: self.role,
            groups: self.groups.clone(),
            access_token: None,
        }
    }
}

#[derive(Deserialize)]
struct DirectoryFile {
    users: Vec<MockUser>,
}

/// Non-empty list of demo accounts. The first account is the fallback.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    fallback: MockUser,
    users: Vec<MockUser>,
}

impl UserDirectory {
    /// The directory embedded in the binary.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Directory` if the embedded file is invalid.
    pub fn builtin() -> Result<Self, AuthError> {
        Self::from_json(BUILTIN_DIRECTORY)
    }

    /// Parse a `{"users": [...]}` document.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Directory` if the document does not parse, lists no
    /// user, or lists the same id twice.
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let file: DirectoryFile =
            serde_json::from_str(json).map_err(|e| AuthError::Directory(e.to_string()))?;

        let mut seen = BTreeSet::new();
        for user in &file.users {
            if !seen.insert(user.id.as_str()) {
                return Err(AuthError::Directory(format!("duplicate user id {}", user.id)));
            }
        }

        let fallback = file
            .users
            .first()
            .cloned()
            .ok_or_else(|| AuthError::Directory("no users".to_string()))?;

        Ok(Self {
            fallback,
            users: file.users,
        })
    }

    /// All accounts, in directory order.
    #[must_use]
    pub fn users(&self) -> &[MockUser] {
        &self.users
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&MockUser> {
        self.users.iter().find(|u| u.id.as_str() == id)
    }

    /// The account for `id`, or the first account when `id` is missing or
    /// unknown.
    // TODO: surface an unknown persisted id to the caller instead of silently
    // switching accounts once the selector UI can display the error.
    #[must_use]
    pub fn find_or_first(&self, id: Option<&str>) -> &MockUser {
        match id {
            None => &self.fallback,
            Some(id) => self.find(id).unwrap_or_else(|| {
                tracing::warn!(
                    requested = id,
                    fallback = %self.fallback.id,
                    "Selected mock user not in directory, using first entry"
                );
                &self.fallback
            }),
        }
    }
}

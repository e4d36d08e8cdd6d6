//! Session resolution error types.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur while resolving or changing a session.
///
/// None of these escape [`SessionResolver::initialize`](super::SessionResolver::initialize):
/// they degrade the session to anonymous with an error message.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The validation endpoint could not be reached or its body was unreadable.
    #[error("identity provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The validation endpoint answered with an unexpected status.
    #[error("session validation failed with HTTP {0}")]
    Validation(reqwest::StatusCode),

    /// The provider payload could not be turned into an identity.
    #[error("malformed identity: {0}")]
    MalformedIdentity(String),

    /// A provider endpoint could not be built from the configured base URL.
    #[error("invalid provider endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// The mock user directory is unusable.
    #[error("invalid mock user directory: {0}")]
    Directory(String),

    /// No mock user has the requested id.
    #[error("unknown mock user: {0}")]
    UnknownMockUser(String),

    /// The operation only exists under the mock strategy.
    #[error("operation not supported by the {0} strategy")]
    Unsupported(&'static str),

    /// Per-browser storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

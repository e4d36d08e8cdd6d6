//! Session extractors.
//!
//! [`PortalSession`] runs the session pipeline for the calling browser:
//! resolve the identity, then load its capability gate. Handlers never read
//! the overlay keys of the session themselves.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{header::COOKIE, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use ai_portal_core::{Email, Identity};

use crate::error::{AppError, set_sentry_user};
use crate::services::SessionPipeline;
use crate::services::auth::AuthStrategy;
use crate::state::AppState;
use crate::storage::SessionStorage;

/// The pipeline as seen by a handler.
pub type Pipeline = SessionPipeline<AuthStrategy, SessionStorage>;

/// Extractor yielding the resolved session and capability gate.
///
/// Resolution failures do not reject the request: they show up as an
/// anonymous status with an error message.
pub struct PortalSession(pub Pipeline);

impl FromRequestParts<AppState> for PortalSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let cookies = parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
            .join("; ");
        let cookies = (!cookies.is_empty()).then_some(cookies);

        let pipeline = SessionPipeline::run(
            state.auth().clone(),
            SessionStorage::new(session),
            cookies,
        )
        .await;

        if let Some(identity) = pipeline.status().identity() {
            set_sentry_user(&identity.id, identity.email.as_ref().map(Email::as_str));
        }

        Ok(Self(pipeline))
    }
}

/// Extractor that requires an authenticated session.
///
/// Anonymous callers get `401` on `/api/*` and a redirect to the login route
/// elsewhere.
pub struct RequireIdentity(pub Pipeline);

impl RequireIdentity {
    /// The authenticated identity.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.0.status().identity()
    }
}

/// Rejection of [`RequireIdentity`].
pub enum IdentityRejection {
    /// Redirect to the login route (for page requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
    Failed(AppError),
}

impl IntoResponse for IdentityRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => {
                AppError::Unauthorized("login required".to_string()).into_response()
            }
            Self::Failed(err) => err.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireIdentity {
    type Rejection = IdentityRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let PortalSession(pipeline) = PortalSession::from_request_parts(parts, state)
            .await
            .map_err(IdentityRejection::Failed)?;

        if pipeline.status().is_authenticated() {
            return Ok(Self(pipeline));
        }

        // Nested routers see a stripped path.
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.path(), |uri| uri.0.path());
        if path.starts_with("/api/") {
            Err(IdentityRejection::Unauthorized)
        } else {
            Err(IdentityRejection::RedirectToLogin)
        }
    }
}

//! Session status and mock user selection.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use ai_portal_core::{Capabilities, SessionStatusView};

use crate::error::{AppError, Result};
use crate::middleware::{Pipeline, PortalSession};
use crate::services::auth::{AuthBackend, AuthError, MockUser};
use crate::state::AppState;

/// Session status with the capabilities derived from it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse<'a> {
    #[serde(flatten)]
    pub session: SessionStatusView<'a>,
    pub capabilities: Capabilities,
}

impl<'a> From<&'a Pipeline> for SessionResponse<'a> {
    fn from(pipeline: &'a Pipeline) -> Self {
        Self {
            session: pipeline.status().view(),
            capabilities: pipeline.gate.capabilities(),
        }
    }
}

pub async fn show(PortalSession(pipeline): PortalSession) -> Response {
    Json(SessionResponse::from(&pipeline)).into_response()
}

/// Re-validate the identity, bypassing the identity cache.
pub async fn refresh(PortalSession(mut pipeline): PortalSession) -> Response {
    pipeline.refresh_user().await;
    Json(SessionResponse::from(&pipeline)).into_response()
}

/// Accounts of the mock directory.
///
/// # Errors
///
/// Returns `AppError` (404) under the identity provider strategy.
pub async fn mock_users(State(state): State<AppState>) -> Result<Json<Vec<MockUser>>> {
    let auth = state.auth();
    let mock = auth
        .as_mock()
        .ok_or_else(|| AppError::Auth(AuthError::Unsupported(auth.name())))?;
    Ok(Json(mock.directory().users().to_vec()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectMockUser {
    pub user_id: String,
}

/// Persist the mock account used by the next login.
///
/// # Errors
///
/// Returns `AppError` (404) for an unknown id or under the identity provider
/// strategy.
pub async fn select_mock_user(
    State(state): State<AppState>,
    PortalSession(pipeline): PortalSession,
    Json(body): Json<SelectMockUser>,
) -> Result<Json<MockUser>> {
    let auth = state.auth();
    let mock = auth
        .as_mock()
        .ok_or_else(|| AppError::Auth(AuthError::Unsupported(auth.name())))?;
    let user = mock
        .select_user(pipeline.resolver.storage(), &body.user_id)
        .await?;
    Ok(Json(user.clone()))
}

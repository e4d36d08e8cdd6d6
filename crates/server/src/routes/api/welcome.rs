//! First-visit welcome marker.

use axum::{Json, http::StatusCode};
use serde::Serialize;

use crate::error::Result;
use crate::middleware::{PortalSession, RequireIdentity};
use crate::services::welcome;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeResponse {
    pub show_welcome: bool,
}

/// Whether the welcome message is due. Read-only.
///
/// # Errors
///
/// Returns `AppError` if the marker cannot be read.
pub async fn show(PortalSession(pipeline): PortalSession) -> Result<Json<WelcomeResponse>> {
    let show_welcome = welcome::pending(pipeline.resolver.storage(), pipeline.status()).await?;
    Ok(Json(WelcomeResponse { show_welcome }))
}

/// Whether to show the welcome message. Marks it seen.
///
/// # Errors
///
/// Returns `AppError` if the marker cannot be stored.
pub async fn check(PortalSession(pipeline): PortalSession) -> Result<Json<WelcomeResponse>> {
    let show_welcome = welcome::first_visit(pipeline.resolver.storage(), pipeline.status()).await?;
    Ok(Json(WelcomeResponse { show_welcome }))
}

/// Show the welcome message again next time.
///
/// # Errors
///
/// Returns `AppError` if the marker cannot be removed.
pub async fn reset(RequireIdentity(pipeline): RequireIdentity) -> Result<StatusCode> {
    welcome::reset(pipeline.resolver.storage()).await?;
    Ok(StatusCode::NO_CONTENT)
}

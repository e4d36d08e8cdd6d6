//! Admin overlays: feature flags and "view as user".
//!
//! Mutations from non-admins are refused without an error status; the body
//! reports `applied: false` and the unchanged state.

use axum::{
    Json,
    extract::Path,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use ai_portal_core::{Capabilities, CapabilityFlag, FeatureFlags};

use crate::error::{AppError, Result};
use crate::middleware::{Pipeline, PortalSession};
use crate::services::GateOutcome;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagsResponse {
    pub flags: FeatureFlags,
    pub is_admin: bool,
    pub viewing_as_user: bool,
    pub capabilities: Capabilities,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied: Option<bool>,
}

impl FlagsResponse {
    fn new(pipeline: &Pipeline, outcome: Option<GateOutcome>) -> Self {
        let gate = &pipeline.gate;
        Self {
            flags: gate.flags(),
            is_admin: gate.is_admin(),
            viewing_as_user: gate.is_viewing_as_user(),
            capabilities: gate.capabilities(),
            applied: outcome.map(|o| o == GateOutcome::Applied),
        }
    }
}

pub async fn show(PortalSession(pipeline): PortalSession) -> Response {
    Json(FlagsResponse::new(&pipeline, None)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct UpdateFlag {
    pub value: bool,
}

/// Set one flag.
///
/// # Errors
///
/// Returns `AppError` (400) for an unknown flag name, or (500) if the flags
/// cannot be stored.
pub async fn update(
    Path(flag): Path<String>,
    PortalSession(mut pipeline): PortalSession,
    Json(body): Json<UpdateFlag>,
) -> Result<Response> {
    let flag: CapabilityFlag = flag
        .parse()
        .map_err(|e: ai_portal_core::UnknownFlag| AppError::BadRequest(e.to_string()))?;
    let outcome = pipeline.gate.update_flag(flag, body.value).await?;
    Ok(Json(FlagsResponse::new(&pipeline, Some(outcome))).into_response())
}

/// Flip the "view as user" override.
///
/// # Errors
///
/// Returns `AppError` (500) if the override cannot be stored.
pub async fn toggle_admin_view(PortalSession(mut pipeline): PortalSession) -> Result<Response> {
    let outcome = pipeline.gate.toggle_admin_view().await?;
    Ok(Json(FlagsResponse::new(&pipeline, Some(outcome))).into_response())
}

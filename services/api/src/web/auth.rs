//! services/api/src/web/auth.rs
//!
//! Password gate endpoints: unlock the browser session, query it, end it.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use card_catalog_core::GateOutcome;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{rejected, ErrorPanel, HandlerError};
use crate::web::middleware::{expired_session_cookie, session_cookie, session_id};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct VerifyRequest {
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct GateStatus {
    pub verified: bool,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /gate - Whether this browser session is already unlocked
#[utoipa::path(
    get,
    path = "/gate",
    responses(
        (status = 200, description = "Current session flag", body = GateStatus)
    )
)]
pub async fn gate_status_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<GateStatus> {
    let verified = match session_id(&headers) {
        Some(id) => state.sessions.get(id).await.is_verified(),
        None => false,
    };
    Json(GateStatus { verified })
}

/// POST /gate/verify - Enter the admin password
#[utoipa::path(
    post,
    path = "/gate/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Session unlocked (or already unlocked)", body = GateStatus),
        (status = 401, description = "Wrong password; clear the input and flash the error", body = ErrorPanel)
    )
)]
pub async fn verify_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<VerifyRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    // 1. Reuse the browser's session, or start one
    let id = session_id(&headers).unwrap_or_else(Uuid::new_v4);

    // 2. Check the password against this session's flag
    match state.sessions.attempt(&state.gate, id, &req.password).await {
        GateOutcome::Rejected { flash } => Err(rejected(flash.as_millis() as u64)),
        outcome => {
            if outcome == GateOutcome::Unlocked {
                info!("Admin session {} unlocked", id);
            }
            // 3. Hand the session cookie back so later requests carry the flag
            Ok((
                StatusCode::OK,
                [(header::SET_COOKIE, session_cookie(id))],
                Json(GateStatus { verified: true }),
            ))
        }
    }
}

/// POST /gate/logout - Lock the session again
#[utoipa::path(
    post,
    path = "/gate/logout",
    responses(
        (status = 200, description = "Session ended", body = GateStatus)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Some(id) = session_id(&headers) {
        state.sessions.end(id).await;
        info!("Admin session {} ended", id);
    }
    (
        StatusCode::OK,
        [(header::SET_COOKIE, expired_session_cookie())],
        Json(GateStatus { verified: false }),
    )
}

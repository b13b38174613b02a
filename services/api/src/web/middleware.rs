//! services/api/src/web/middleware.rs
//!
//! Session cookie helpers and the middleware guarding privileged routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use card_catalog_core::{AdminSession, PrivilegedAction};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::error::{locked, HandlerError};
use crate::web::state::AppState;

const SESSION_COOKIE: &str = "session";

/// Reads the session id from the `session` cookie, if present and well formed.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))
        .and_then(|raw| Uuid::parse_str(raw).ok())
}

/// A session-scoped cookie: no `Max-Age`, so it ends with the browser session.
pub fn session_cookie(id: Uuid) -> String {
    format!("{}={}; HttpOnly; SameSite=Lax; Path=/", SESSION_COOKIE, id)
}

pub fn expired_session_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE)
}

/// The privileged action a guarded request performs.
pub fn action_for(method: &Method, path: &str) -> PrivilegedAction {
    if *method == Method::DELETE {
        PrivilegedAction::DeleteCard
    } else if *method == Method::PUT || path.ends_with("/edit") {
        PrivilegedAction::EditCard
    } else if path.ends_with("/import") {
        PrivilegedAction::ImportCsv
    } else {
        PrivilegedAction::EnterAddPage
    }
}

/// Middleware that lets the request through only when the caller's session
/// has been unlocked.
///
/// If unlocked, inserts the session id into request extensions for handlers to use.
/// Otherwise returns 401 and the client shows the password prompt.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, HandlerError> {
    let action = action_for(req.method(), req.uri().path());
    let id = session_id(req.headers());
    let session = match id {
        Some(id) => state.sessions.get(id).await,
        None => AdminSession::default(),
    };

    if let Err(e) = state.gate.authorize(&session, action) {
        warn!("Blocked locked session from trying to {}", action);
        return Err(locked(e));
    }

    if let Some(id) = id {
        req.extensions_mut().insert(id);
    }
    Ok(next.run(req).await)
}

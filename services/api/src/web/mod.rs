pub mod auth;
pub mod middleware;
pub mod query;
pub mod rest;
pub mod state;

use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

pub use middleware::require_admin;
pub use state::AppState;

/// Builds the full router: public pages, the gate, and the admin routes
/// behind `require_admin`.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    // Public routes (no password required)
    let public_routes = Router::new()
        .route("/health", get(rest::health_handler))
        .route("/gate", get(auth::gate_status_handler))
        .route("/gate/verify", post(auth::verify_handler))
        .route("/gate/logout", post(auth::logout_handler))
        .route("/cards", get(rest::list_cards_handler))
        .route("/cards/export", get(rest::export_handler))
        .route("/dashboard", get(rest::dashboard_handler));

    // Admin routes (unlocked session required)
    let admin_routes = Router::new()
        .route("/admin/cards", post(rest::create_card_handler))
        .route("/admin/cards/new", get(rest::new_card_form_handler))
        .route("/admin/cards/import", post(rest::import_handler))
        .route(
            "/admin/cards/{id}",
            put(rest::update_card_handler).delete(rest::delete_card_handler),
        )
        .route("/admin/cards/{id}/edit", get(rest::edit_card_form_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_admin,
        ));

    let mut cors = CorsLayer::new()
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);
    match app_state.config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) if origin != "*" => cors = cors.allow_origin(origin),
        _ => warn!(
            "CORS_ORIGIN '{}' is not usable as a credentialed origin; cross-origin requests will be refused",
            app_state.config.cors_origin
        ),
    }

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

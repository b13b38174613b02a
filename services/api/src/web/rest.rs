//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the catalog pages and card writes, and the
//! master definition for the OpenAPI specification.
//!
//! Every page handler fetches the whole collection, applies the view state
//! from the query string and renders. Nothing is cached between requests.

use crate::error::{
    bad_request, csv_failure, invalid_card, store_failure, ErrorPanel, HandlerError,
};
use crate::web::auth::{GateStatus, VerifyRequest};
use crate::web::middleware::session_id;
use crate::web::query::ViewQuery;
use crate::web::state::AppState;
use axum::{
    extract::{Extension, Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use card_catalog_core::{
    export_csv, import_csv, render_dashboard, render_form, render_list, CardForm, Collection,
    DashboardView, FormView, ImportReport, ListView,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        list_cards_handler,
        dashboard_handler,
        export_handler,
        new_card_form_handler,
        edit_card_form_handler,
        create_card_handler,
        update_card_handler,
        delete_card_handler,
        import_handler,
        crate::web::auth::gate_status_handler,
        crate::web::auth::verify_handler,
        crate::web::auth::logout_handler,
    ),
    components(
        schemas(CardSaved, ErrorPanel, GateStatus, VerifyRequest)
    ),
    tags(
        (name = "Card Catalog API", description = "Collection pages, admin writes and CSV transfer for the card catalog.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response Structs
//=========================================================================================

/// The response payload sent after a card is created or replaced.
#[derive(Serialize, ToSchema)]
pub struct CardSaved {
    id: Uuid,
}

//=========================================================================================
// Helpers
//=========================================================================================

async fn load_collection(state: &AppState, query: ViewQuery) -> Result<Collection, HandlerError> {
    let records = state.store.list_all().await.map_err(store_failure)?;
    Ok(Collection::with_view(records, query.into_view_state()))
}

async fn is_admin(state: &AppState, headers: &HeaderMap) -> bool {
    match session_id(headers) {
        Some(id) => state.sessions.get(id).await.is_verified(),
        None => false,
    }
}

//=========================================================================================
// Page Handlers
//=========================================================================================

/// Liveness probe.
#[utoipa::path(get, path = "/health", responses((status = 200, description = "Service is up")))]
pub async fn health_handler() -> &'static str {
    "ok"
}

/// The collection listing: one page of the filtered and sorted collection.
///
/// Filters, `sort`, `dir` and `page` come from the query string.
#[utoipa::path(
    get,
    path = "/cards",
    responses(
        (status = 200, description = "One page of the collection"),
        (status = 400, description = "Malformed query"),
        (status = 503, description = "The store could not be reached", body = ErrorPanel)
    )
)]
pub async fn list_cards_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ViewQuery>,
) -> Result<Json<ListView>, HandlerError> {
    let collection = load_collection(&state, query).await?;
    let admin = is_admin(&state, &headers).await;
    Ok(Json(render_list(&collection, admin)))
}

/// Aggregate statistics over the whole filtered collection.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Collection statistics"),
        (status = 503, description = "The store could not be reached", body = ErrorPanel)
    )
)]
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<DashboardView>, HandlerError> {
    let collection = load_collection(&state, query).await?;
    let last_export = *state.last_export.lock().await;
    Ok(Json(render_dashboard(&collection, last_export)))
}

/// Downloads the full collection as CSV.
#[utoipa::path(
    get,
    path = "/cards/export",
    responses(
        (status = 200, description = "CSV file", body = String, content_type = "text/csv"),
        (status = 503, description = "The store could not be reached", body = ErrorPanel)
    )
)]
pub async fn export_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let cards = state.store.list_all().await.map_err(store_failure)?;
    let export = export_csv(&cards, Utc::now()).map_err(csv_failure)?;
    *state.last_export.lock().await = Some(export.exported_at);
    info!("Exported {} cards to {}", cards.len(), export.filename);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.filename),
            ),
        ],
        export.body,
    ))
}

//=========================================================================================
// Admin Handlers (behind `require_admin`)
//=========================================================================================

/// The empty add form.
#[utoipa::path(
    get,
    path = "/admin/cards/new",
    responses(
        (status = 200, description = "Empty form"),
        (status = 401, description = "Session is locked", body = ErrorPanel)
    )
)]
pub async fn new_card_form_handler() -> Json<FormView> {
    Json(render_form(None))
}

/// The edit form, filled from the stored card.
#[utoipa::path(
    get,
    path = "/admin/cards/{id}/edit",
    params(("id" = Uuid, Path, description = "Card id")),
    responses(
        (status = 200, description = "Pre-populated form"),
        (status = 401, description = "Session is locked", body = ErrorPanel),
        (status = 404, description = "No such card", body = ErrorPanel)
    )
)]
pub async fn edit_card_form_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<FormView>, HandlerError> {
    let card = state.store.get(id).await.map_err(store_failure)?;
    Ok(Json(render_form(Some(&card))))
}

/// Adds a card from the submitted form.
#[utoipa::path(
    post,
    path = "/admin/cards",
    request_body(content_type = "application/json", description = "The add form."),
    responses(
        (status = 201, description = "Card created", body = CardSaved),
        (status = 401, description = "Session is locked", body = ErrorPanel),
        (status = 422, description = "Form did not validate", body = ErrorPanel),
        (status = 503, description = "The store could not be reached", body = ErrorPanel)
    )
)]
pub async fn create_card_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Uuid>,
    Json(form): Json<CardForm>,
) -> Result<impl IntoResponse, HandlerError> {
    let details = form.into_details().map_err(invalid_card)?;
    let id = state.store.insert(details).await.map_err(store_failure)?;
    info!("Session {} added card {}", session, id);
    Ok((StatusCode::CREATED, Json(CardSaved { id })))
}

/// Replaces every field of an existing card.
#[utoipa::path(
    put,
    path = "/admin/cards/{id}",
    params(("id" = Uuid, Path, description = "Card id")),
    request_body(content_type = "application/json", description = "The edit form."),
    responses(
        (status = 200, description = "Card replaced", body = CardSaved),
        (status = 401, description = "Session is locked", body = ErrorPanel),
        (status = 404, description = "No such card", body = ErrorPanel),
        (status = 422, description = "Form did not validate", body = ErrorPanel)
    )
)]
pub async fn update_card_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Uuid>,
    Path(id): Path<Uuid>,
    Json(form): Json<CardForm>,
) -> Result<Json<CardSaved>, HandlerError> {
    let details = form.into_details().map_err(invalid_card)?;
    state.store.update(id, details).await.map_err(store_failure)?;
    info!("Session {} replaced card {}", session, id);
    Ok(Json(CardSaved { id }))
}

/// Deletes a card.
#[utoipa::path(
    delete,
    path = "/admin/cards/{id}",
    params(("id" = Uuid, Path, description = "Card id")),
    responses(
        (status = 204, description = "Card deleted"),
        (status = 401, description = "Session is locked", body = ErrorPanel),
        (status = 404, description = "No such card", body = ErrorPanel)
    )
)]
pub async fn delete_card_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Uuid>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HandlerError> {
    state.store.delete(id).await.map_err(store_failure)?;
    info!("Session {} deleted card {}", session, id);
    Ok(StatusCode::NO_CONTENT)
}

/// Bulk-inserts the cards of an uploaded CSV file.
///
/// Accepts a multipart/form-data request whose first file part is the CSV.
/// Rows that fail are listed in the report; the rest are still inserted.
#[utoipa::path(
    post,
    path = "/admin/cards/import",
    request_body(content_type = "multipart/form-data", description = "The CSV file to import."),
    responses(
        (status = 200, description = "Import report"),
        (status = 400, description = "Missing file or wrong header", body = ErrorPanel),
        (status = 401, description = "Session is locked", body = ErrorPanel)
    )
)]
pub async fn import_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<ImportReport>, HandlerError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Failed to read multipart data: {}", e)))?
        .ok_or_else(|| bad_request("Multipart form must include a file"))?;
    let data = field
        .bytes()
        .await
        .map_err(|e| bad_request(format!("Failed to read file bytes: {}", e)))?;
    let text = String::from_utf8(data.to_vec())
        .map_err(|e| bad_request(format!("Uploaded file is not valid UTF-8 text: {}", e)))?;

    let report = import_csv(state.store.as_ref(), &text)
        .await
        .map_err(csv_failure)?;
    info!(
        "Session {} imported {} of {} rows",
        session,
        report.inserted.len(),
        report.rows
    );
    Ok(Json(report))
}

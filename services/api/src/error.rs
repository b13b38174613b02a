//! services/api/src/error.rs
//!
//! Defines the primary error type for the service and the error panel that
//! handlers return to the browser.

use axum::{http::StatusCode, Json};
use card_catalog_core::{CsvError, GateError, PortError, ValidationError};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the store port.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure to apply the embedded migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//=========================================================================================
// Handler-facing errors
//=========================================================================================

/// The inline error panel shown in place of a view.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorPanel {
    pub error: String,
    pub code: String,
    /// Whether offering a "retry" button makes sense.
    pub retryable: bool,
    /// How long the client flashes the password error, for gate rejections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash_ms: Option<u64>,
}

pub type HandlerError = (StatusCode, Json<ErrorPanel>);

fn panel(status: StatusCode, error: String, code: &str, retryable: bool) -> HandlerError {
    (
        status,
        Json(ErrorPanel {
            error,
            code: code.to_string(),
            retryable,
            flash_ms: None,
        }),
    )
}

/// Maps a store failure to the error panel. `NotFound` is a 404, an
/// `Unexpected` failure is a 500 that retrying will not fix, and a backend
/// failure is an outage the user may retry.
pub fn store_failure(e: PortError) -> HandlerError {
    match e {
        PortError::NotFound(what) => panel(StatusCode::NOT_FOUND, what, "NOT_FOUND", false),
        PortError::Unexpected(what) => {
            error!("Store call failed unexpectedly: {}", what);
            panel(StatusCode::INTERNAL_SERVER_ERROR, what, "UNEXPECTED", false)
        }
        other => {
            error!("Store call failed: {}", other);
            let code = other.code().unwrap_or("BACKEND_UNAVAILABLE").to_string();
            panel(StatusCode::SERVICE_UNAVAILABLE, other.to_string(), &code, true)
        }
    }
}

pub fn invalid_card(e: ValidationError) -> HandlerError {
    panel(StatusCode::UNPROCESSABLE_ENTITY, e.to_string(), "VALIDATION", false)
}

pub fn bad_request(message: impl Into<String>) -> HandlerError {
    panel(StatusCode::BAD_REQUEST, message.into(), "BAD_REQUEST", false)
}

pub fn locked(e: GateError) -> HandlerError {
    panel(StatusCode::UNAUTHORIZED, e.to_string(), "LOCKED", false)
}

/// A wrong password: the client clears the input and flashes for `flash_ms`.
pub fn rejected(flash_ms: u64) -> HandlerError {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorPanel {
            error: "Incorrect password".to_string(),
            code: "WRONG_PASSWORD".to_string(),
            retryable: true,
            flash_ms: Some(flash_ms),
        }),
    )
}

pub fn csv_failure(e: CsvError) -> HandlerError {
    match e {
        CsvError::Header { .. } => panel(StatusCode::BAD_REQUEST, e.to_string(), "BAD_HEADER", false),
        other => {
            error!("CSV processing failed: {}", other);
            panel(StatusCode::INTERNAL_SERVER_ERROR, other.to_string(), "CSV", false)
        }
    }
}

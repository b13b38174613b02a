//! crates/card_catalog_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the catalog's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete record store behind it.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Card, CardDetails};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The backend rejected or failed the call. `code` carries whatever
    /// identifier the backend reported, if any.
    #[error("Backend error: {message}")]
    Backend {
        message: String,
        code: Option<String>,
    },
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    pub fn backend(message: impl Into<String>, code: Option<String>) -> Self {
        PortError::Backend {
            message: message.into(),
            code,
        }
    }

    /// The backend-provided code, when there is one.
    pub fn code(&self) -> Option<&str> {
        match self {
            PortError::Backend { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The record store holding the card collection.
///
/// Every call is single-shot: no retries and no caching happen behind it.
/// Concurrent writers are not coordinated, the last write wins.
#[async_trait]
pub trait CardStore: Send + Sync {
    /// Returns every card, most recently inserted first.
    async fn list_all(&self) -> PortResult<Vec<Card>>;

    async fn get(&self, id: Uuid) -> PortResult<Card>;

    /// Stores a new card and returns the identifier the store assigned to it.
    async fn insert(&self, details: CardDetails) -> PortResult<Uuid>;

    /// Replaces every editable field of an existing card.
    async fn update(&self, id: Uuid, details: CardDetails) -> PortResult<()>;

    async fn delete(&self, id: Uuid) -> PortResult<()>;
}

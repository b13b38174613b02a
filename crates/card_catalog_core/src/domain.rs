//! crates/card_catalog_core/src/domain.rs
//!
//! Defines the pure, core data structures for the catalog.
//! These structs are independent of any database or wire format; serde derives
//! exist only so the view layer can hand them out as JSON.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog entry as it exists in the store.
///
/// `id` and `created_at` are assigned by the store on insert and never change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub details: CardDetails,
    pub created_at: DateTime<Utc>,
}

/// The user-editable part of a card: what the add/edit form and CSV files carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDetails {
    pub player: String,
    pub year: i32,
    pub sport: String,
    pub card_number: String,
    /// `None` for a base card, otherwise the parallel's name.
    pub parallel: Option<String>,
    /// `None` when the card is not serial-numbered, otherwise the print run.
    pub print_run: Option<u32>,
    pub grading: Grading,
    /// `None` means the value is unknown.
    pub estimated_value: Option<f64>,
    /// `None` means the acquisition cost is unknown.
    pub purchase_price: Option<f64>,
    /// `None` means the acquisition date is unknown.
    pub purchase_date: Option<NaiveDate>,
    pub quantity: u32,
    pub notes: String,
}

/// Grading status of a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Grading {
    #[default]
    Ungraded,
    Graded { company: String, grade: String },
}

impl Grading {
    pub fn company(&self) -> Option<&str> {
        match self {
            Grading::Ungraded => None,
            Grading::Graded { company, .. } => Some(company),
        }
    }

    pub fn grade(&self) -> Option<&str> {
        match self {
            Grading::Ungraded => None,
            Grading::Graded { grade, .. } => Some(grade),
        }
    }

    pub fn is_graded(&self) -> bool {
        matches!(self, Grading::Graded { .. })
    }
}

/// Largest accepted quantity or print run.
pub const MAX_COUNT: u32 = i32::MAX as u32;

/// Reasons a set of card details cannot be stored.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Quantity must be at least 1")]
    ZeroQuantity,
    #[error("Print run must be at least 1")]
    ZeroPrintRun,
    #[error("{field} must not be negative")]
    NegativeAmount { field: &'static str },
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

impl CardDetails {
    /// Creates details with the required fields set and everything else empty,
    /// unknown, or ungraded.
    pub fn new(player: impl Into<String>, year: i32, sport: impl Into<String>) -> Self {
        Self {
            player: player.into(),
            year,
            sport: sport.into(),
            card_number: String::new(),
            parallel: None,
            print_run: None,
            grading: Grading::Ungraded,
            estimated_value: None,
            purchase_price: None,
            purchase_date: None,
            quantity: 1,
            notes: String::new(),
        }
    }

    /// Checks the invariants every stored card must satisfy.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.player.trim().is_empty() {
            return Err(ValidationError::MissingField("Player"));
        }
        if self.sport.trim().is_empty() {
            return Err(ValidationError::MissingField("Sport"));
        }
        if self.quantity < 1 {
            return Err(ValidationError::ZeroQuantity);
        }
        if self.print_run == Some(0) {
            return Err(ValidationError::ZeroPrintRun);
        }
        // Counts are stored as 32-bit signed integers.
        for (field, count) in [("Quantity", Some(self.quantity)), ("Print Run", self.print_run)] {
            if let Some(n) = count.filter(|&n| n > MAX_COUNT) {
                return Err(ValidationError::InvalidValue {
                    field,
                    value: n.to_string(),
                });
            }
        }
        if let Grading::Graded { company, grade } = &self.grading {
            if company.trim().is_empty() {
                return Err(ValidationError::MissingField("Grading Company"));
            }
            if grade.trim().is_empty() {
                return Err(ValidationError::MissingField("Grade"));
            }
        }
        for (field, amount) in [
            ("Estimated Value", self.estimated_value),
            ("Purchase Price", self.purchase_price),
        ] {
            match amount {
                Some(v) if !v.is_finite() => {
                    return Err(ValidationError::InvalidValue {
                        field,
                        value: v.to_string(),
                    })
                }
                Some(v) if v < 0.0 => return Err(ValidationError::NegativeAmount { field }),
                _ => {}
            }
        }
        Ok(())
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel.is_some()
    }

    pub fn is_numbered(&self) -> bool {
        self.print_run.is_some()
    }
}

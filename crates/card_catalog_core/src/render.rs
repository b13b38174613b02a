//! crates/card_catalog_core/src/render.rs
//!
//! View models for the three pages: the collection list, the dashboard and the
//! add/edit form. Each renderer is a pure function of the collection and its
//! view state; nothing here touches the store.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Card, CardDetails, Grading, ValidationError};
use crate::view::{CardFilter, Collection, CollectionStatus, SortKey, PAGE_SIZE};

const UNKNOWN: &str = "Unknown";
const TOP_CARDS: usize = 5;

fn money(amount: Option<f64>) -> String {
    amount.map_or_else(|| UNKNOWN.to_string(), |v| format!("${:.2}", v))
}

fn date(day: Option<NaiveDate>) -> String {
    day.map_or_else(|| UNKNOWN.to_string(), |d| d.format("%Y-%m-%d").to_string())
}

//=========================================================================================
// List view
//=========================================================================================

/// What the row's buttons may do for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowActions {
    pub edit: bool,
    pub delete: bool,
    /// True when pressing either button must go through the password prompt first.
    pub requires_unlock: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListRow {
    pub id: Uuid,
    pub player: String,
    pub year: i32,
    pub sport: String,
    pub card_number: String,
    pub parallel: Option<String>,
    pub print_run: Option<String>,
    pub grade: String,
    pub estimated_value: String,
    pub purchase_price: String,
    pub purchase_date: String,
    pub quantity: u32,
    pub notes: String,
    pub added: DateTime<Utc>,
    pub actions: RowActions,
}

impl ListRow {
    fn from_card(card: &Card, admin: bool) -> Self {
        let d = &card.details;
        let grade = match &d.grading {
            Grading::Ungraded => "Ungraded".to_string(),
            Grading::Graded { company, grade } => format!("{} {}", company, grade),
        };
        Self {
            id: card.id,
            player: d.player.clone(),
            year: d.year,
            sport: d.sport.clone(),
            card_number: d.card_number.clone(),
            parallel: d.parallel.clone(),
            print_run: d.print_run.map(|n| format!("/{}", n)),
            grade,
            estimated_value: money(d.estimated_value),
            purchase_price: money(d.purchase_price),
            purchase_date: date(d.purchase_date),
            quantity: d.quantity,
            notes: d.notes.clone(),
            added: card.created_at,
            actions: RowActions {
                edit: true,
                delete: true,
                requires_unlock: !admin,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListView {
    pub status: CollectionStatus,
    pub rows: Vec<ListRow>,
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
    /// Length of the filtered and sorted sequence.
    pub matching: usize,
    /// Size of the whole collection.
    pub total: usize,
    pub sort: Option<SortKey>,
    pub filter: CardFilter,
}

/// Renders the current page of the collection. `admin` reports whether the
/// session is already unlocked.
pub fn render_list(collection: &Collection, admin: bool) -> ListView {
    let view = collection.view();
    ListView {
        status: collection.status(),
        rows: collection
            .page_window()
            .into_iter()
            .map(|card| ListRow::from_card(card, admin))
            .collect(),
        page: view.page,
        page_count: collection.page_count(),
        page_size: PAGE_SIZE,
        matching: collection.derived_len(),
        total: collection.records().len(),
        sort: view.sort,
        filter: view.filter.clone(),
    }
}

//=========================================================================================
// Dashboard
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SportSummary {
    pub sport: String,
    pub records: usize,
    pub quantity: u64,
    pub estimated_value: f64,
}

/// Aggregates over the whole filtered collection, not just one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub status: CollectionStatus,
    pub record_count: usize,
    pub total_quantity: u64,
    pub graded_count: usize,
    pub parallel_count: usize,
    pub numbered_count: usize,
    /// Sum of value x quantity over cards with a known value.
    pub total_estimated_value: f64,
    pub unknown_value_count: usize,
    /// Sum of price x quantity over cards with a known price.
    pub total_purchase_cost: f64,
    pub unknown_cost_count: usize,
    pub by_sport: Vec<SportSummary>,
    pub top_cards: Vec<ListRow>,
    pub last_export: Option<DateTime<Utc>>,
}

pub fn render_dashboard(collection: &Collection, last_export: Option<DateTime<Utc>>) -> DashboardView {
    let cards = collection.derived();

    let mut total_quantity = 0u64;
    let mut total_estimated_value = 0.0;
    let mut unknown_value_count = 0;
    let mut total_purchase_cost = 0.0;
    let mut unknown_cost_count = 0;
    // Keyed case-insensitively, displayed with the first spelling seen.
    let mut sports: BTreeMap<String, SportSummary> = BTreeMap::new();

    for card in &cards {
        let d = &card.details;
        let qty = u64::from(d.quantity);
        total_quantity += qty;
        match d.estimated_value {
            Some(v) => total_estimated_value += v * qty as f64,
            None => unknown_value_count += 1,
        }
        match d.purchase_price {
            Some(p) => total_purchase_cost += p * qty as f64,
            None => unknown_cost_count += 1,
        }
        let entry = sports
            .entry(d.sport.trim().to_lowercase())
            .or_insert_with(|| SportSummary {
                sport: d.sport.trim().to_string(),
                records: 0,
                quantity: 0,
                estimated_value: 0.0,
            });
        entry.records += 1;
        entry.quantity += qty;
        entry.estimated_value += d.estimated_value.unwrap_or(0.0) * qty as f64;
    }

    let mut by_sport: Vec<SportSummary> = sports.into_values().collect();
    by_sport.sort_by(|a, b| b.records.cmp(&a.records));

    let mut valued: Vec<&Card> = cards
        .iter()
        .copied()
        .filter(|c| c.details.estimated_value.is_some())
        .collect();
    valued.sort_by(|a, b| {
        b.details
            .estimated_value
            .partial_cmp(&a.details.estimated_value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let top_cards = valued
        .into_iter()
        .take(TOP_CARDS)
        .map(|c| ListRow::from_card(c, false))
        .collect();

    DashboardView {
        status: collection.status(),
        record_count: cards.len(),
        total_quantity,
        graded_count: cards.iter().filter(|c| c.details.grading.is_graded()).count(),
        parallel_count: cards.iter().filter(|c| c.details.is_parallel()).count(),
        numbered_count: cards.iter().filter(|c| c.details.is_numbered()).count(),
        total_estimated_value,
        unknown_value_count,
        total_purchase_cost,
        unknown_cost_count,
        by_sport,
        top_cards,
        last_export,
    }
}

//=========================================================================================
// Add / edit form
//=========================================================================================

/// The add/edit form as submitted. Each checkbox decides whether its paired
/// input is used at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardForm {
    pub player: String,
    pub year: Option<i32>,
    pub sport: String,
    pub card_number: String,
    pub is_parallel: bool,
    pub parallel_name: String,
    pub is_numbered: bool,
    pub print_run: Option<u32>,
    pub is_graded: bool,
    pub grading_company: String,
    pub grade: String,
    pub value_unknown: bool,
    pub estimated_value: Option<f64>,
    pub price_unknown: bool,
    pub purchase_price: Option<f64>,
    pub date_unknown: bool,
    pub purchase_date: Option<NaiveDate>,
    pub quantity: u32,
    pub notes: String,
}

impl Default for CardForm {
    fn default() -> Self {
        Self {
            player: String::new(),
            year: None,
            sport: String::new(),
            card_number: String::new(),
            is_parallel: false,
            parallel_name: String::new(),
            is_numbered: false,
            print_run: None,
            is_graded: false,
            grading_company: String::new(),
            grade: String::new(),
            value_unknown: true,
            estimated_value: None,
            price_unknown: true,
            purchase_price: None,
            date_unknown: true,
            purchase_date: None,
            quantity: 1,
            notes: String::new(),
        }
    }
}

impl CardForm {
    pub fn from_details(d: &CardDetails) -> Self {
        Self {
            player: d.player.clone(),
            year: Some(d.year),
            sport: d.sport.clone(),
            card_number: d.card_number.clone(),
            is_parallel: d.parallel.is_some(),
            parallel_name: d.parallel.clone().unwrap_or_default(),
            is_numbered: d.print_run.is_some(),
            print_run: d.print_run,
            is_graded: d.grading.is_graded(),
            grading_company: d.grading.company().unwrap_or_default().to_string(),
            grade: d.grading.grade().unwrap_or_default().to_string(),
            value_unknown: d.estimated_value.is_none(),
            estimated_value: d.estimated_value,
            price_unknown: d.purchase_price.is_none(),
            purchase_price: d.purchase_price,
            date_unknown: d.purchase_date.is_none(),
            purchase_date: d.purchase_date,
            quantity: d.quantity,
            notes: d.notes.clone(),
        }
    }

    /// Turns the submitted form into storable details. Inputs whose checkbox
    /// says "unknown", "ungraded" or "not numbered" are dropped.
    pub fn into_details(self) -> Result<CardDetails, ValidationError> {
        let year = self.year.ok_or(ValidationError::MissingField("Year"))?;

        let parallel = if self.is_parallel {
            let name = self.parallel_name.trim();
            if name.is_empty() {
                return Err(ValidationError::MissingField("Parallel Name"));
            }
            Some(name.to_string())
        } else {
            None
        };

        let print_run = if self.is_numbered {
            Some(self.print_run.ok_or(ValidationError::MissingField("Print Run"))?)
        } else {
            None
        };

        let grading = if self.is_graded {
            Grading::Graded {
                company: self.grading_company.trim().to_string(),
                grade: self.grade.trim().to_string(),
            }
        } else {
            Grading::Ungraded
        };

        let estimated_value = if self.value_unknown {
            None
        } else {
            Some(self.estimated_value.ok_or(ValidationError::MissingField("Estimated Value"))?)
        };
        let purchase_price = if self.price_unknown {
            None
        } else {
            Some(self.purchase_price.ok_or(ValidationError::MissingField("Purchase Price"))?)
        };
        let purchase_date = if self.date_unknown {
            None
        } else {
            Some(self.purchase_date.ok_or(ValidationError::MissingField("Purchase Date"))?)
        };

        let details = CardDetails {
            player: self.player.trim().to_string(),
            year,
            sport: self.sport.trim().to_string(),
            card_number: self.card_number.trim().to_string(),
            parallel,
            print_run,
            grading,
            estimated_value,
            purchase_price,
            purchase_date,
            quantity: self.quantity,
            notes: self.notes.trim().to_string(),
        };
        details.validate()?;
        Ok(details)
    }
}

/// Which paired inputs the form shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldVisibility {
    pub parallel_name: bool,
    pub print_run: bool,
    pub grading: bool,
    pub estimated_value: bool,
    pub purchase_price: bool,
    pub purchase_date: bool,
}

impl FieldVisibility {
    pub fn for_form(form: &CardForm) -> Self {
        Self {
            parallel_name: form.is_parallel,
            print_run: form.is_numbered,
            grading: form.is_graded,
            estimated_value: !form.value_unknown,
            purchase_price: !form.price_unknown,
            purchase_date: !form.date_unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FormMode {
    Add,
    Edit { id: Uuid },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormView {
    pub mode: FormMode,
    pub values: CardForm,
    pub visibility: FieldVisibility,
}

/// An empty form when adding, or one filled from `card` when editing.
pub fn render_form(card: Option<&Card>) -> FormView {
    let (mode, values) = match card {
        Some(card) => (FormMode::Edit { id: card.id }, CardForm::from_details(&card.details)),
        None => (FormMode::Add, CardForm::default()),
    };
    FormView {
        mode,
        visibility: FieldVisibility::for_form(&values),
        values,
    }
}

//! crates/card_catalog_core/src/view.rs
//!
//! The in-memory collection and its derived view: filtering, sorting and
//! pagination over the records fetched for one page view.
//!
//! A `Collection` owns the records in fetch order (newest first) together with
//! the `ViewState` applied to them. Every change to the filter or the sort
//! recomputes the derived sequence in full and returns to page 1; changing
//! the page only moves the window.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::Card;

/// Number of records per page.
pub const PAGE_SIZE: usize = 50;

//=========================================================================================
// Filters
//=========================================================================================

/// Active filter values. Every `None` (or blank text) field is inactive;
/// active fields are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardFilter {
    pub player: Option<String>,
    pub sport: Option<String>,
    pub card_number: Option<String>,
    pub grading_company: Option<String>,
    pub notes: Option<String>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub value_min: Option<f64>,
    pub value_max: Option<f64>,
    pub purchased_from: Option<NaiveDate>,
    pub purchased_to: Option<NaiveDate>,
    pub graded: Option<bool>,
    pub parallel: Option<bool>,
    pub numbered: Option<bool>,
}

fn contains_ci(haystack: &str, needle: &Option<String>) -> bool {
    match needle.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(n) => haystack.to_lowercase().contains(&n.to_lowercase()),
    }
}

fn in_range<T: PartialOrd + Copy>(value: Option<T>, min: Option<T>, max: Option<T>) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }
    let Some(v) = value else {
        return false;
    };
    min.map_or(true, |m| v >= m) && max.map_or(true, |m| v <= m)
}

fn flag_matches(actual: bool, wanted: Option<bool>) -> bool {
    wanted.map_or(true, |w| w == actual)
}

impl CardFilter {
    pub fn is_empty(&self) -> bool {
        self.text_fields()
            .iter()
            .all(|t| t.map_or(true, |s| s.trim().is_empty()))
            && self.year_min.is_none()
            && self.year_max.is_none()
            && self.value_min.is_none()
            && self.value_max.is_none()
            && self.purchased_from.is_none()
            && self.purchased_to.is_none()
            && self.graded.is_none()
            && self.parallel.is_none()
            && self.numbered.is_none()
    }

    fn text_fields(&self) -> [Option<&String>; 5] {
        [
            self.player.as_ref(),
            self.sport.as_ref(),
            self.card_number.as_ref(),
            self.grading_company.as_ref(),
            self.notes.as_ref(),
        ]
    }

    /// Whether `card` satisfies every active predicate.
    pub fn matches(&self, card: &Card) -> bool {
        let d = &card.details;
        contains_ci(&d.player, &self.player)
            && contains_ci(&d.sport, &self.sport)
            && contains_ci(&d.card_number, &self.card_number)
            && contains_ci(d.grading.company().unwrap_or(""), &self.grading_company)
            && contains_ci(&d.notes, &self.notes)
            && in_range(Some(d.year), self.year_min, self.year_max)
            && in_range(d.estimated_value, self.value_min, self.value_max)
            && in_range(d.purchase_date, self.purchased_from, self.purchased_to)
            && flag_matches(d.grading.is_graded(), self.graded)
            && flag_matches(d.is_parallel(), self.parallel)
            && flag_matches(d.is_numbered(), self.numbered)
    }
}

//=========================================================================================
// Sorting
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Player,
    Year,
    Sport,
    CardNumber,
    GradingCompany,
    Grade,
    EstimatedValue,
    PurchasePrice,
    PurchaseDate,
    Quantity,
    CreatedAt,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "player" => SortField::Player,
            "year" => SortField::Year,
            "sport" | "category" => SortField::Sport,
            "card_number" => SortField::CardNumber,
            "grading_company" => SortField::GradingCompany,
            "grade" => SortField::Grade,
            "estimated_value" | "value" => SortField::EstimatedValue,
            "purchase_price" | "cost" => SortField::PurchasePrice,
            "purchase_date" => SortField::PurchaseDate,
            "quantity" => SortField::Quantity,
            "created_at" | "date_added" => SortField::CreatedAt,
            other => return Err(format!("'{}' is not a sortable field", other)),
        };
        Ok(field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(format!("'{}' is not a sort direction", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }
}

/// Free text that usually holds a number, like a grade or a card number.
/// Numeric labels compare as numbers and come before the rest, which
/// compare as lowercase text.
#[derive(Debug)]
struct Label {
    text: String,
    number: Option<f64>,
}

impl Label {
    fn new(raw: &str) -> Self {
        let raw = raw.trim();
        Self {
            text: raw.to_lowercase(),
            number: raw.parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.number, other.number) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            (Some(_), None) => Some(Ordering::Less),
            (None, Some(_)) => Some(Ordering::Greater),
            (None, None) => self.text.partial_cmp(&other.text),
        }
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

/// A sortable projection of one field. `None` stands for an unknown value.
#[derive(Debug, PartialEq, PartialOrd)]
enum SortValue {
    Text(String),
    Label(Label),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
}

fn sort_value(card: &Card, field: SortField) -> Option<SortValue> {
    let d = &card.details;
    match field {
        SortField::Player => Some(SortValue::Text(d.player.to_lowercase())),
        SortField::Year => Some(SortValue::Int(i64::from(d.year))),
        SortField::Sport => Some(SortValue::Text(d.sport.to_lowercase())),
        SortField::CardNumber => Some(SortValue::Label(Label::new(&d.card_number))),
        SortField::GradingCompany => d.grading.company().map(|c| SortValue::Text(c.to_lowercase())),
        SortField::Grade => d.grading.grade().map(|g| SortValue::Label(Label::new(g))),
        SortField::EstimatedValue => d.estimated_value.map(SortValue::Float),
        SortField::PurchasePrice => d.purchase_price.map(SortValue::Float),
        SortField::PurchaseDate => d.purchase_date.map(SortValue::Date),
        SortField::Quantity => Some(SortValue::Int(i64::from(d.quantity))),
        SortField::CreatedAt => Some(SortValue::Int(card.created_at.timestamp_micros())),
    }
}

/// Orders two cards by `key`. Unknown values go last in either direction;
/// equal values compare `Equal` so a stable sort keeps fetch order.
fn compare(a: &Card, b: &Card, key: SortKey) -> Ordering {
    match (sort_value(a, key.field), sort_value(b, key.field)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            match key.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
    }
}

//=========================================================================================
// View state and the collection
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub sort: Option<SortKey>,
    pub filter: CardFilter,
    /// 1-based.
    pub page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            sort: None,
            filter: CardFilter::default(),
            page: 1,
        }
    }
}

/// Whether there is anything to show, and why not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    /// The store holds no cards at all.
    Empty,
    /// There are cards, but the active filter excludes all of them.
    NoResults,
    Ready,
}

/// The records of one page view plus the view state applied to them.
#[derive(Debug, Clone)]
pub struct Collection {
    records: Vec<Card>,
    view: ViewState,
    /// Indexes into `records`, filtered and sorted.
    derived: Vec<usize>,
}

impl Collection {
    /// Wraps records in fetch order, with no filter and no sort.
    pub fn new(records: Vec<Card>) -> Self {
        Self::with_view(records, ViewState::default())
    }

    /// Wraps records and applies `view` in one step. The requested page is
    /// kept, clamped to the pages that exist.
    pub fn with_view(records: Vec<Card>, view: ViewState) -> Self {
        let page = view.page;
        let mut collection = Self {
            records,
            view,
            derived: Vec::new(),
        };
        collection.recompute();
        collection.set_page(page);
        collection
    }

    pub fn records(&self) -> &[Card] {
        &self.records
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn set_filter(&mut self, filter: CardFilter) {
        self.view.filter = filter;
        self.recompute();
    }

    pub fn set_sort(&mut self, sort: Option<SortKey>) {
        self.view.sort = sort;
        self.recompute();
    }

    /// Header-click behaviour: the same field flips direction, a new field
    /// starts ascending.
    pub fn toggle_sort(&mut self, field: SortField) {
        let next = match self.view.sort {
            Some(key) if key.field == field => SortKey {
                field,
                direction: key.direction.flipped(),
            },
            _ => SortKey::asc(field),
        };
        self.set_sort(Some(next));
    }

    /// Moves the window without recomputing the derived sequence.
    pub fn set_page(&mut self, page: usize) {
        self.view.page = page.clamp(1, self.page_count());
    }

    fn recompute(&mut self) {
        let filter = &self.view.filter;
        let mut derived: Vec<usize> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, card)| filter.matches(card))
            .map(|(i, _)| i)
            .collect();
        if let Some(key) = self.view.sort {
            // `sort_by` is stable, so ties stay in fetch order.
            derived.sort_by(|&a, &b| compare(&self.records[a], &self.records[b], key));
        }
        self.derived = derived;
        self.view.page = 1;
    }

    /// The filtered and sorted records.
    pub fn derived(&self) -> Vec<&Card> {
        self.derived.iter().map(|&i| &self.records[i]).collect()
    }

    pub fn derived_len(&self) -> usize {
        self.derived.len()
    }

    /// Always at least 1, so an empty result still has a first page.
    pub fn page_count(&self) -> usize {
        self.derived.len().div_ceil(PAGE_SIZE).max(1)
    }

    /// The records on the current page.
    pub fn page_window(&self) -> Vec<&Card> {
        paginate(&self.derived, self.view.page, PAGE_SIZE)
            .iter()
            .map(|&i| &self.records[i])
            .collect()
    }

    pub fn status(&self) -> CollectionStatus {
        if self.records.is_empty() {
            CollectionStatus::Empty
        } else if self.derived.is_empty() {
            CollectionStatus::NoResults
        } else {
            CollectionStatus::Ready
        }
    }
}

/// Returns page `page` (1-based) of `items` in windows of `size`. Pages past
/// the end are empty.
pub fn paginate<T>(items: &[T], page: usize, size: usize) -> &[T] {
    if size == 0 {
        return &[];
    }
    let start = page.saturating_sub(1).saturating_mul(size);
    if start >= items.len() {
        return &[];
    }
    let end = (start + size).min(items.len());
    &items[start..end]
}

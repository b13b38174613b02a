//! services/api/src/web/query.rs
//!
//! Query-string form of the view state used by the list and dashboard pages.
//!
//! HTML forms submit untouched inputs as empty strings, so every optional
//! parameter treats `""` as absent.

use std::fmt::Display;
use std::str::FromStr;

use card_catalog_core::{CardFilter, SortDirection, SortField, SortKey, ViewState};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub player: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub sport: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub card_number: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub grading_company: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub year_min: Option<i32>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub year_max: Option<i32>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub value_min: Option<f64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub value_max: Option<f64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub purchased_from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub purchased_to: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub graded: Option<bool>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub parallel: Option<bool>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub numbered: Option<bool>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub sort: Option<SortField>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub dir: Option<SortDirection>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<usize>,
}

impl ViewQuery {
    pub fn into_view_state(self) -> ViewState {
        let sort = self.sort.map(|field| SortKey {
            field,
            direction: self.dir.unwrap_or_default(),
        });
        ViewState {
            sort,
            filter: CardFilter {
                player: self.player,
                sport: self.sport,
                card_number: self.card_number,
                grading_company: self.grading_company,
                notes: self.notes,
                year_min: self.year_min,
                year_max: self.year_max,
                value_min: self.value_min,
                value_max: self.value_max,
                purchased_from: self.purchased_from,
                purchased_to: self.purchased_to,
                graded: self.graded,
                parallel: self.parallel,
                numbered: self.numbered,
            },
            page: self.page.unwrap_or(1),
        }
    }
}

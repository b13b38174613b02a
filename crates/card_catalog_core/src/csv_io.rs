//! crates/card_catalog_core/src/csv_io.rs
//!
//! CSV export of the whole collection and bulk import of an uploaded file.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Card, CardDetails, Grading};
use crate::ports::CardStore;

/// Column order of every exported file, and the header an import must carry.
pub const HEADER: [&str; 17] = [
    "Player",
    "Year",
    "Sport",
    "Card Number",
    "Parallel",
    "Parallel Name",
    "Numbered",
    "Print Run",
    "Graded",
    "Grading Company",
    "Grade",
    "Estimated Value",
    "Purchase Price",
    "Purchase Date",
    "Quantity",
    "Notes",
    "Date Added",
];

const UNKNOWN: &str = "Unknown";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, thiserror::Error)]
pub enum CsvError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Unexpected CSV header: expected \"{expected}\", found \"{found}\"")]
    Header { expected: String, found: String },
    #[error("CSV output is not valid UTF-8: {0}")]
    Encoding(String),
}

//=========================================================================================
// Export
//=========================================================================================

/// A rendered export, ready to be offered as a download.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CsvExport {
    pub filename: String,
    pub body: String,
    pub exported_at: DateTime<Utc>,
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn or_unknown<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| UNKNOWN.to_string(), |v| v.to_string())
}

fn to_row(card: &Card) -> [String; 17] {
    let d = &card.details;
    [
        d.player.clone(),
        d.year.to_string(),
        d.sport.clone(),
        d.card_number.clone(),
        yes_no(d.is_parallel()).to_string(),
        d.parallel.clone().unwrap_or_default(),
        yes_no(d.is_numbered()).to_string(),
        d.print_run.map(|n| n.to_string()).unwrap_or_default(),
        yes_no(d.grading.is_graded()).to_string(),
        d.grading.company().unwrap_or_default().to_string(),
        d.grading.grade().unwrap_or_default().to_string(),
        or_unknown(d.estimated_value),
        or_unknown(d.purchase_price),
        or_unknown(d.purchase_date.map(|day| day.format(DATE_FORMAT).to_string())),
        d.quantity.to_string(),
        d.notes.clone(),
        card.created_at.to_rfc3339(),
    ]
}

/// Serializes every card, in the order given, one row per card.
pub fn export_csv(cards: &[Card], now: DateTime<Utc>) -> Result<CsvExport, CsvError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;
    for card in cards {
        writer.write_record(to_row(card))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| CsvError::Encoding(e.to_string()))?;
    let body = String::from_utf8(bytes).map_err(|e| CsvError::Encoding(e.to_string()))?;

    Ok(CsvExport {
        filename: format!("card-collection-{}.csv", now.format(DATE_FORMAT)),
        body,
        exported_at: now,
    })
}

//=========================================================================================
// Import
//=========================================================================================

/// A data row that could not be turned into a card, or could not be stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    /// 1-based line number in the uploaded file.
    pub line: u64,
    pub message: String,
}

/// A data row with its 1-based line number, or the reason it was rejected.
pub type ParsedRow = Result<(u64, CardDetails), RowError>;

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub rows: usize,
    pub inserted: Vec<Uuid>,
    pub failures: Vec<RowError>,
}

fn cell<'a>(record: &'a csv::StringRecord, column: usize) -> &'a str {
    record.get(column).map(str::trim).unwrap_or("")
}

fn parse_flag(raw: &str, column: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "" | "no" | "n" | "false" | "0" => Ok(false),
        "yes" | "y" | "true" | "1" => Ok(true),
        _ => Err(format!("{column}: expected Yes or No, found \"{raw}\"")),
    }
}

fn is_unknown(raw: &str) -> bool {
    raw.is_empty() || raw.eq_ignore_ascii_case(UNKNOWN)
}

fn parse_amount(raw: &str, column: &str) -> Result<Option<f64>, String> {
    if is_unknown(raw) {
        return Ok(None);
    }
    let cleaned: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
    cleaned
        .parse::<f64>()
        .map(Some)
        .map_err(|_| format!("{column}: \"{raw}\" is not a number"))
}

fn required<'a>(raw: &'a str, column: &str) -> Result<&'a str, String> {
    if raw.is_empty() {
        Err(format!("{column} is required"))
    } else {
        Ok(raw)
    }
}

fn parse_record(record: &csv::StringRecord) -> Result<CardDetails, String> {
    let player = required(cell(record, 0), "Player")?;
    let year = required(cell(record, 1), "Year")?
        .parse::<i32>()
        .map_err(|_| format!("Year: \"{}\" is not a year", cell(record, 1)))?;
    let sport = required(cell(record, 2), "Sport")?;

    let parallel = if parse_flag(cell(record, 4), "Parallel")? {
        Some(required(cell(record, 5), "Parallel Name")?.to_string())
    } else {
        None
    };

    let print_run = if parse_flag(cell(record, 6), "Numbered")? {
        let raw = required(cell(record, 7), "Print Run")?;
        Some(
            raw.trim_start_matches('/')
                .parse::<u32>()
                .map_err(|_| format!("Print Run: \"{raw}\" is not a number"))?,
        )
    } else {
        None
    };

    let grading = if parse_flag(cell(record, 8), "Graded")? {
        Grading::Graded {
            company: required(cell(record, 9), "Grading Company")?.to_string(),
            grade: required(cell(record, 10), "Grade")?.to_string(),
        }
    } else {
        Grading::Ungraded
    };

    let purchase_date = match cell(record, 13) {
        raw if is_unknown(raw) => None,
        raw => Some(
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map_err(|_| format!("Purchase Date: \"{raw}\" is not a YYYY-MM-DD date"))?,
        ),
    };

    let quantity = match cell(record, 14) {
        "" => 1,
        raw => raw
            .parse::<u32>()
            .map_err(|_| format!("Quantity: \"{raw}\" is not a whole number"))?,
    };

    let details = CardDetails {
        player: player.to_string(),
        year,
        sport: sport.to_string(),
        card_number: cell(record, 3).to_string(),
        parallel,
        print_run,
        grading,
        estimated_value: parse_amount(cell(record, 11), "Estimated Value")?,
        purchase_price: parse_amount(cell(record, 12), "Purchase Price")?,
        purchase_date,
        quantity,
        notes: cell(record, 15).to_string(),
    };
    details.validate().map_err(|e| e.to_string())?;
    Ok(details)
}

/// Parses an uploaded file. A wrong header fails the whole file; a bad data
/// row only fails that row.
pub fn parse_csv(text: &str) -> Result<Vec<ParsedRow>, CsvError> {
    let text = text.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let found: Vec<&str> = headers.iter().map(str::trim).collect();
    if found != HEADER {
        return Err(CsvError::Header {
            expected: HEADER.join(","),
            found: found.join(","),
        });
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let row = match result {
            Ok(record) => {
                let line = record.position().map_or(0, |p| p.line());
                if record.iter().all(|c| c.trim().is_empty()) {
                    continue;
                }
                parse_record(&record)
                    .map(|details| (line, details))
                    .map_err(|message| RowError { line, message })
            }
            Err(e) => Err(RowError {
                line: e.position().map_or(0, |p| p.line()),
                message: e.to_string(),
            }),
        };
        rows.push(row);
    }
    Ok(rows)
}

/// Parses `text` and inserts every valid row, one at a time. Rows that fail
/// to parse or to insert are reported and the rest carry on.
pub async fn import_csv(store: &dyn CardStore, text: &str) -> Result<ImportReport, CsvError> {
    let rows = parse_csv(text)?;
    let mut report = ImportReport {
        rows: rows.len(),
        ..ImportReport::default()
    };

    for row in rows {
        match row {
            Ok((line, details)) => match store.insert(details).await {
                Ok(id) => report.inserted.push(id),
                Err(e) => {
                    warn!("Import row at line {} failed to insert: {}", line, e);
                    report.failures.push(RowError {
                        line,
                        message: e.to_string(),
                    });
                }
            },
            Err(row_error) => {
                warn!("Import row rejected at line {}: {}", row_error.line, row_error.message);
                report.failures.push(row_error);
            }
        }
    }

    info!(
        "CSV import finished: {} inserted, {} failed",
        report.inserted.len(),
        report.failures.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn header_line() -> String {
        HEADER.join(",")
    }

    #[test]
    fn export_quotes_fields_with_commas_and_quotes() {
        let mut details = CardDetails::new("Griffey, Ken \"The Kid\"", 1989, "Baseball");
        details.notes = "line one\nline two".to_string();
        let card = Card {
            id: Uuid::new_v4(),
            details,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        };
        let export = export_csv(&[card], Utc.with_ymd_and_hms(2024, 6, 2, 8, 0, 0).unwrap()).unwrap();
        assert_eq!(export.filename, "card-collection-2024-06-02.csv");
        assert!(export.body.starts_with(&header_line()));
        assert!(export.body.contains("\"Griffey, Ken \"\"The Kid\"\"\""));
        assert!(export.body.contains("\"line one\nline two\""));
    }

    #[test]
    fn wrong_header_fails_the_whole_file() {
        let err = parse_csv("Name,Year\nA,2000\n").unwrap_err();
        assert!(matches!(err, CsvError::Header { .. }));
    }

    #[test]
    fn bad_rows_are_reported_with_their_line() {
        let text = format!(
            "{}\n\
             Mike Trout,2011,Baseball,US175,No,,No,,No,,,Unknown,Unknown,Unknown,1,,\n\
             ,2011,Baseball,,No,,No,,No,,,,,,,,\n\
             Wayne Gretzky,1979,Hockey,18,No,,Yes,,No,,,,,,,,\n",
            header_line()
        );
        let rows = parse_csv(&text).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_ok());
        let missing_player = rows[1].as_ref().unwrap_err();
        assert_eq!(missing_player.line, 3);
        assert_eq!(missing_player.message, "Player is required");
        let missing_run = rows[2].as_ref().unwrap_err();
        assert_eq!(missing_run.line, 4);
        assert!(missing_run.message.contains("Print Run"));
    }

    #[test]
    fn blank_cells_fall_back_to_defaults() {
        let text = format!("{}\nLeBron James,2003,Basketball,,,,,,,,,,,,,,\n", header_line());
        let rows = parse_csv(&text).unwrap();
        let (line, details) = rows[0].as_ref().unwrap();
        assert_eq!(*line, 2);
        assert_eq!(details.quantity, 1);
        assert_eq!(details.grading, Grading::Ungraded);
        assert_eq!(details.estimated_value, None);
    }

    #[test]
    fn amounts_accept_currency_formatting() {
        assert_eq!(parse_amount("$1,250.50", "Estimated Value"), Ok(Some(1250.5)));
        assert_eq!(parse_amount("unknown", "Estimated Value"), Ok(None));
        assert!(parse_amount("lots", "Estimated Value").is_err());
    }

    #[test]
    fn zero_quantity_row_is_rejected() {
        let text = format!("{}\nLeBron James,2003,Basketball,,,,,,,,,,,,0,,\n", header_line());
        let rows = parse_csv(&text).unwrap();
        assert_eq!(
            rows[0].as_ref().unwrap_err().message,
            "Quantity must be at least 1"
        );
    }
}

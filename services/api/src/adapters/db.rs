//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `CardStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use card_catalog_core::domain::{Card, CardDetails, Grading};
use card_catalog_core::ports::{CardStore, PortError, PortResult};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

const CARD_COLUMNS: &str = "id, player, year, sport, card_number, parallel_name, print_run, \
     grading_company, grade, estimated_value, purchase_price, purchase_date, quantity, notes, created_at";

/// Newest first; `seq` breaks ties between rows inserted in the same instant.
const LISTING_ORDER: &str = "ORDER BY created_at DESC, seq DESC";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `CardStore` port.
#[derive(Clone)]
pub struct PgCardStore {
    pool: PgPool,
}

impl PgCardStore {
    /// Creates a new `PgCardStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// Turns a driver error into the port's opaque backend error, keeping the
/// SQLSTATE code when the database reported one.
fn backend_error(e: sqlx::Error) -> PortError {
    let code = match &e {
        sqlx::Error::Database(db) => db.code().map(|c| c.into_owned()),
        _ => None,
    };
    PortError::backend(e.to_string(), code)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct CardRecord {
    id: Uuid,
    player: String,
    year: i32,
    sport: String,
    card_number: String,
    parallel_name: Option<String>,
    print_run: Option<i32>,
    grading_company: Option<String>,
    grade: Option<String>,
    estimated_value: Option<f64>,
    purchase_price: Option<f64>,
    purchase_date: Option<NaiveDate>,
    quantity: i32,
    notes: String,
    created_at: DateTime<Utc>,
}

impl CardRecord {
    fn to_domain(self) -> Card {
        let grading = match (self.grading_company, self.grade) {
            (Some(company), Some(grade)) => Grading::Graded { company, grade },
            _ => Grading::Ungraded,
        };
        Card {
            id: self.id,
            details: CardDetails {
                player: self.player,
                year: self.year,
                sport: self.sport,
                card_number: self.card_number,
                parallel: self.parallel_name,
                print_run: self.print_run.map(|n| n.max(1) as u32),
                grading,
                estimated_value: self.estimated_value,
                purchase_price: self.purchase_price,
                purchase_date: self.purchase_date,
                quantity: self.quantity.max(1) as u32,
                notes: self.notes,
            },
            created_at: self.created_at,
        }
    }
}

fn to_i32(value: u32, field: &str) -> PortResult<i32> {
    i32::try_from(value).map_err(|_| PortError::Unexpected(format!("{} {} is out of range", field, value)))
}

//=========================================================================================
// `CardStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CardStore for PgCardStore {
    async fn list_all(&self) -> PortResult<Vec<Card>> {
        let records = sqlx::query_as::<_, CardRecord>(&format!(
            "SELECT {} FROM cards {}",
            CARD_COLUMNS, LISTING_ORDER
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get(&self, id: Uuid) -> PortResult<Card> {
        let record = sqlx::query_as::<_, CardRecord>(&format!(
            "SELECT {} FROM cards WHERE id = $1",
            CARD_COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Card {} not found", id)),
            other => backend_error(other),
        })?;
        Ok(record.to_domain())
    }

    async fn insert(&self, details: CardDetails) -> PortResult<Uuid> {
        let id = Uuid::new_v4();
        let print_run = details.print_run.map(|n| to_i32(n, "Print run")).transpose()?;
        let quantity = to_i32(details.quantity, "Quantity")?;
        sqlx::query(
            "INSERT INTO cards (id, player, year, sport, card_number, parallel_name, print_run, \
             grading_company, grade, estimated_value, purchase_price, purchase_date, quantity, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(id)
        .bind(&details.player)
        .bind(details.year)
        .bind(&details.sport)
        .bind(&details.card_number)
        .bind(&details.parallel)
        .bind(print_run)
        .bind(details.grading.company())
        .bind(details.grading.grade())
        .bind(details.estimated_value)
        .bind(details.purchase_price)
        .bind(details.purchase_date)
        .bind(quantity)
        .bind(&details.notes)
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        info!("Inserted card {}", id);
        Ok(id)
    }

    async fn update(&self, id: Uuid, details: CardDetails) -> PortResult<()> {
        let print_run = details.print_run.map(|n| to_i32(n, "Print run")).transpose()?;
        let quantity = to_i32(details.quantity, "Quantity")?;
        let result = sqlx::query(
            "UPDATE cards SET player = $2, year = $3, sport = $4, card_number = $5, \
             parallel_name = $6, print_run = $7, grading_company = $8, grade = $9, \
             estimated_value = $10, purchase_price = $11, purchase_date = $12, \
             quantity = $13, notes = $14 WHERE id = $1",
        )
        .bind(id)
        .bind(&details.player)
        .bind(details.year)
        .bind(&details.sport)
        .bind(&details.card_number)
        .bind(&details.parallel)
        .bind(print_run)
        .bind(details.grading.company())
        .bind(details.grading.grade())
        .bind(details.estimated_value)
        .bind(details.purchase_price)
        .bind(details.purchase_date)
        .bind(quantity)
        .bind(&details.notes)
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Card {} not found", id)));
        }
        info!("Updated card {}", id);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend_error)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Card {} not found", id)));
        }
        info!("Deleted card {}", id);
        Ok(())
    }
}

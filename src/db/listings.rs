use crate::db::connection::Database;
use crate::db::sink::{InsertOutcome, KeyedSink, SinkError};
use crate::domain::CleanedListingRecord;
use rusqlite::{ffi, params, ErrorCode, OptionalExtension};
use tracing::info;

const SQL_CREATE_LISTINGS: &str = include_str!("../../sql/create_listings_table.sql");

/// Table name for an area, e.g. "kelowna" -> "kijiji_kelowna_real_estate_listings".
/// The area ends up inside SQL, so only `[a-z0-9_]` is allowed.
pub fn listings_table_name(city: &str) -> Result<String, SinkError> {
    let city = city.trim().to_lowercase().replace([' ', '-'], "_");

    if city.is_empty() || !city.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(SinkError::Schema(format!("invalid area name for table: {city:?}")));
    }

    Ok(format!("kijiji_{city}_real_estate_listings"))
}

/// SQLite-backed listings table keyed by canonical address.
pub struct SqliteSink {
    db: Database,
    table: String,
}

impl SqliteSink {
    pub fn new(db: Database, city: &str) -> Result<Self, SinkError> {
        Ok(Self {
            db,
            table: listings_table_name(city)?,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn row_count(&self) -> Result<i64, SinkError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        self.db.with_conn(|conn| {
            conn.query_row(&sql, [], |row| row.get(0))
                .map_err(classify_error)
        })
    }

    /// Reads one persisted row back.
    pub fn get(&self, address: &str) -> Result<Option<CleanedListingRecord>, SinkError> {
        let sql = format!(
            "SELECT address, price, date, bedrooms, bathrooms, size, latitude, longitude
             FROM {} WHERE address = ?1",
            self.table
        );

        self.db.with_conn(|conn| {
            conn.query_row(&sql, params![address], |row| {
                Ok(CleanedListingRecord {
                    address: row.get(0)?,
                    price: row.get(1)?,
                    date: row.get(2)?,
                    bedrooms: row.get(3)?,
                    bathrooms: row.get(4)?,
                    size: row.get(5)?,
                    latitude: row.get(6)?,
                    longitude: row.get(7)?,
                })
            })
            .optional()
            .map_err(classify_error)
        })
    }
}

impl KeyedSink for SqliteSink {
    fn ensure_schema(&mut self) -> Result<(), SinkError> {
        let ddl = SQL_CREATE_LISTINGS.replace("{table}", &self.table);

        self.db.with_conn(|conn| {
            conn.execute_batch(&ddl)
                .map_err(|e| SinkError::Schema(format!("Failed to apply schema: {e}")))
        })?;

        info!(table = %self.table, "listings table ready");
        Ok(())
    }

    fn exists(&self, address: &str) -> Result<bool, SinkError> {
        let sql = format!("SELECT 1 FROM {} WHERE address = ?1", self.table);
        self.db.with_conn(|conn| {
            conn.query_row(&sql, params![address], |_| Ok(()))
                .optional()
                .map(|found| found.is_some())
                .map_err(classify_error)
        })
    }

    fn insert_if_absent(&mut self, row: &CleanedListingRecord) -> Result<InsertOutcome, SinkError> {
        let sql = format!(
            "INSERT INTO {} (address, price, date, bedrooms, bathrooms, size, latitude, longitude)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            self.table
        );

        self.db.with_conn(|conn| {
            let inserted = conn.execute(
                &sql,
                params![
                    row.address,
                    row.price,
                    row.date,
                    row.bedrooms,
                    row.bathrooms,
                    row.size,
                    row.latitude,
                    row.longitude,
                ],
            );

            match inserted {
                Ok(_) => Ok(InsertOutcome::Inserted),
                Err(e) if is_primary_key_conflict(&e) => Ok(InsertOutcome::AlreadyExists),
                Err(e) => Err(classify_error(e)),
            }
        })
    }
}

fn is_primary_key_conflict(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == ErrorCode::ConstraintViolation
                && (e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE)
        }
        _ => false,
    }
}

/// Splits SQLite errors into "the store is in trouble" and "this row is bad".
fn classify_error(err: rusqlite::Error) -> SinkError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) => match e.code {
            ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::CannotOpen
            | ErrorCode::SystemIoFailure
            | ErrorCode::NotADatabase
            | ErrorCode::DatabaseCorrupt
            | ErrorCode::ReadOnly
            | ErrorCode::DiskFull => SinkError::Unavailable(err.to_string()),
            _ => SinkError::Rejected(err.to_string()),
        },
        _ => SinkError::Rejected(err.to_string()),
    }
}

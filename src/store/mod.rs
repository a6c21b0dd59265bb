//! SQLite Persistence Layer
//! Mission: One shared connection, explicit transactions, typed rows out
//!
//! The whole agency database lives in a single SQLite file. A single
//! connection behind a `parking_lot::Mutex` plus a per-mutation transaction
//! gives the serialization the reconciliation engine needs: "read all
//! payments for a pilgrim → compute sum → write pilgrim row" can never
//! interleave with another writer.

pub mod audit;
pub mod ledger;
pub mod payments;
pub mod pilgrims;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, Row, Transaction};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use crate::error::ServiceError;

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS pilgrims (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    passport_no TEXT,
    package_id TEXT,
    final_price TEXT NOT NULL,
    amount_paid TEXT NOT NULL DEFAULT '0',
    payment_status TEXT NOT NULL DEFAULT 'belum_lunas',
    status TEXT NOT NULL DEFAULT 'active',
    visa_status TEXT,
    equipment_status TEXT,
    created_at TEXT NOT NULL
) WITHOUT ROWID;

CREATE TABLE IF NOT EXISTS payments (
    id TEXT PRIMARY KEY,
    pilgrim_id TEXT NOT NULL REFERENCES pilgrims(id),
    amount TEXT NOT NULL,
    payment_date TEXT NOT NULL,
    method TEXT,
    state TEXT NOT NULL DEFAULT 'verified',
    proof_url TEXT,
    notes TEXT,
    recorded_by TEXT NOT NULL,
    created_at TEXT NOT NULL
) WITHOUT ROWID;

CREATE INDEX IF NOT EXISTS idx_payments_pilgrim
    ON payments(pilgrim_id, created_at);

-- Append-only: no UPDATE/DELETE path exists anywhere in the codebase.
CREATE TABLE IF NOT EXISTS ledger (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entry_type TEXT NOT NULL,
    amount TEXT NOT NULL,
    description TEXT NOT NULL,
    pilgrim_id TEXT,
    user_id TEXT,
    entry_date TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ledger_type
    ON ledger(entry_type, created_at DESC);

CREATE TABLE IF NOT EXISTS audit_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    actor_id TEXT NOT NULL,
    action TEXT NOT NULL,
    object_id TEXT,
    detail TEXT NOT NULL,
    ip TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_audit_created
    ON audit_log(created_at DESC);
"#;

/// Handle to the agency database.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database and apply the schema.
    pub fn open(db_path: &str) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX; // We handle our own locking

        let conn = Connection::open_with_flags(db_path, flags)
            .with_context(|| format!("Failed to open database at {}", db_path))?;

        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize database schema")?;

        info!("📒 Agency database ready at: {}", db_path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a read-only closure against the connection.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Run a closure inside a transaction. Any error rolls the whole
    /// mutation back, so a payment write and its reconciliation commit
    /// together or not at all.
    pub fn with_tx<T>(
        &self,
        f: impl FnOnce(&Transaction) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(ServiceError::from)?;
        let out = f(&tx)?;
        tx.commit().map_err(ServiceError::from)?;
        Ok(out)
    }
}

/// Parse a required TEXT column into any `FromStr` type (Decimal, Uuid,
/// dates). Keeps row mappers free of unwraps.
pub(crate) fn parse_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Optional-column variant of [`parse_col`].
pub(crate) fn parse_col_opt<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = row.get(idx)?;
    match raw {
        Some(s) => parse_col_str(idx, &s).map(Some),
        None => Ok(None),
    }
}

fn parse_col_str<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Map an unknown enum tag in a stored row to a conversion error.
pub(crate) fn bad_enum_col(idx: usize, raw: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("unknown enum tag: {}", raw).into(),
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Database;
    use tempfile::NamedTempFile;

    /// Fresh database backed by a throwaway file.
    pub fn open_test_db() -> (Database, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db = Database::open(temp_file.path().to_str().unwrap()).unwrap();
        (db, temp_file)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::open_test_db;
    use crate::error::ServiceError;

    #[test]
    fn test_schema_applies_cleanly() {
        let (db, _temp) = open_test_db();

        let tables: Vec<String> = db
            .with_conn(|conn| {
                let mut stmt = conn
                    .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
                    .map_err(ServiceError::from)?;
                let names = stmt
                    .query_map([], |row| row.get(0))
                    .map_err(ServiceError::from)?
                    .collect::<Result<Vec<String>, _>>()
                    .map_err(ServiceError::from)?;
                Ok(names)
            })
            .unwrap();

        for table in ["pilgrims", "payments", "ledger", "audit_log"] {
            assert!(tables.iter().any(|t| t == table), "missing table {}", table);
        }
    }

    #[test]
    fn test_failed_tx_rolls_back() {
        let (db, _temp) = open_test_db();

        let result: Result<(), ServiceError> = db.with_tx(|tx| {
            tx.execute(
                "INSERT INTO audit_log (actor_id, action, detail, created_at)
                 VALUES ('u1', 'test', 'will roll back', '2026-01-01T00:00:00Z')",
                [],
            )
            .map_err(ServiceError::from)?;
            Err(ServiceError::invalid("forced failure"))
        });
        assert!(result.is_err());

        let count: i64 = db
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))
                    .map_err(ServiceError::from)
            })
            .unwrap();
        assert_eq!(count, 0);
    }
}

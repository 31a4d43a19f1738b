//! Database layer for medmatch.
//!
//! SQLite-backed product catalog and therapeutic reference collection. Text
//! search goes through a `regexp(pattern, text)` SQL function backed by the
//! `regex` crate.

mod products;
mod reference;
mod schema;

pub use schema::*;

use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Record not found: {0}")]
    NotFound(String),
}

pub type DbResult<T> = Result<T, DbError>;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Register SQL functions and initialize schema.
    fn initialize(&self) -> DbResult<()> {
        register_regexp(&self.conn)?;
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// `regexp(pattern, text)`; the compiled pattern is cached per statement.
fn register_regexp(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let pattern: Arc<Regex> = ctx.get_or_create_aux(0, |vr| -> Result<_, BoxError> {
                Ok(Regex::new(vr.as_str()?)?)
            })?;
            let text = ctx
                .get_raw(1)
                .as_str()
                .map_err(|e| rusqlite::Error::UserFunctionError(e.into()))?;
            Ok(pattern.is_match(text))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_schema_initialized() {
        let db = Database::open_in_memory().unwrap();

        let tables: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"products".to_string()));
        assert!(tables.contains(&"therapeutic_reference".to_string()));
    }

    #[test]
    fn test_regexp_function() {
        let db = Database::open_in_memory().unwrap();

        let matched: bool = db
            .conn()
            .query_row("SELECT regexp('(?i)^vitamin[\\s_+]+c', 'VITAMIN_C')", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert!(matched);

        let matched: bool = db
            .conn()
            .query_row("SELECT regexp('^c', 'vitamin c')", [], |row| row.get(0))
            .unwrap();
        assert!(!matched);
    }

    #[test]
    fn test_regexp_invalid_pattern_is_error() {
        let db = Database::open_in_memory().unwrap();
        let result: rusqlite::Result<bool> =
            db.conn()
                .query_row("SELECT regexp('(unclosed', 'x')", [], |row| row.get(0));
        assert!(result.is_err());
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");

        {
            let db = Database::open(&path).unwrap();
            db.upsert_product(&crate::models::Product::new(
                "P001".into(),
                "Paracetamol_500mg".into(),
            ))
            .unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert!(db.get_product("P001").unwrap().is_some());
    }
}

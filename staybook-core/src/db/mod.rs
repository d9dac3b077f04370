//! SQLite storage for StayBook
//!
//! Two kinds of database share the helpers in this module:
//! - [`AccountDatabase`]: the administrator and branch accounts (`accounts.db`)
//! - [`HotelDatabase`]: one per branch, holding its rooms and reservations

mod accounts;
mod hotel;
mod schema;

pub use accounts::{AccountDatabase, BranchChange, PendingBranch};
pub use hotel::HotelDatabase;
pub use schema::SCHEMA_VERSION;

use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::error::{HotelError, Result};

/// Opens a database file, creating parent directories and the given schema
pub(crate) fn open_connection(path: &Path, schema_sql: &str) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    init_schema(&conn, schema_sql)?;

    tracing::debug!(path = %path.display(), "opened database");
    Ok(conn)
}

/// Opens an in-memory database with the given schema
#[cfg(test)]
pub(crate) fn open_in_memory(schema_sql: &str) -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    init_schema(&conn, schema_sql)?;
    Ok(conn)
}

/// Creates missing tables and stamps the schema version.
///
/// Files created before versioning have the tables but no version row;
/// they are stamped as version 1.
fn init_schema(conn: &Connection, schema_sql: &str) -> Result<()> {
    conn.execute_batch(schema::VERSION_TABLE)?;

    let current_version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()?;

    match current_version {
        Some(found) if found > SCHEMA_VERSION => {
            return Err(HotelError::SchemaVersion {
                found,
                supported: SCHEMA_VERSION,
            })
        }
        Some(_) => conn.execute_batch(schema_sql)?,
        None => {
            conn.execute_batch(schema_sql)?;
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_parent_dirs_and_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("branch_database").join("iloilo.db");

        let conn = open_connection(&path, schema::HOTEL_SCHEMA).unwrap();
        assert!(path.exists());

        let version: i32 = conn
            .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_reopen_keeps_single_version_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("accounts.db");

        drop(open_connection(&path, schema::ACCOUNTS_SCHEMA).unwrap());
        let conn = open_connection(&path, schema::ACCOUNTS_SCHEMA).unwrap();

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("future.db");

        let conn = open_connection(&path, schema::HOTEL_SCHEMA).unwrap();
        conn.execute("UPDATE schema_version SET version = 99", []).unwrap();
        drop(conn);

        let err = open_connection(&path, schema::HOTEL_SCHEMA).unwrap_err();
        assert!(matches!(
            err,
            HotelError::SchemaVersion { found: 99, supported: 1 }
        ));
    }
}

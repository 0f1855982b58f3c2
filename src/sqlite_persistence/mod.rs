//! Shared versioned-schema machinery for the SQLite stores.

use anyhow::{bail, Context, Result};
use rusqlite::Connection;

/// Offset added to the schema version before it is written to
/// `PRAGMA user_version`, so a database created by an unrelated tool
/// (user_version 0 by default) is not mistaken for one of ours.
pub const BASE_DB_VERSION: i64 = 151;

pub struct Table {
    pub name: &'static str,
    pub schema: &'static str,
    pub indices: &'static [&'static str],
}

pub struct VersionedSchema {
    pub version: i64,
    pub tables: &'static [Table],
}

impl VersionedSchema {
    fn create(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            conn.execute(table.schema, [])
                .with_context(|| format!("Failed to create table {}", table.name))?;
            for index in table.indices {
                conn.execute(index, [])
                    .with_context(|| format!("Failed to create index on {}", table.name))?;
            }
        }
        conn.pragma_update(None, "user_version", BASE_DB_VERSION + self.version)?;
        Ok(())
    }
}

/// Create the latest schema on an empty database, or verify that an existing
/// database is at the latest version. Unknown versions are rejected rather
/// than migrated blindly.
pub fn initialize_schema(conn: &Connection, schemas: &[VersionedSchema]) -> Result<()> {
    let latest = schemas.last().context("No schema versions defined")?;

    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;

    if table_count == 0 {
        conn.execute("PRAGMA foreign_keys = ON;", [])?;
        return latest.create(conn);
    }

    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if db_version != BASE_DB_VERSION + latest.version {
        bail!(
            "Unknown database version {} (expected {})",
            db_version,
            BASE_DB_VERSION + latest.version
        );
    }
    conn.execute("PRAGMA foreign_keys = ON;", [])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
        version: 0,
        tables: &[Table {
            name: "thing",
            schema: "CREATE TABLE thing (id INTEGER PRIMARY KEY, name TEXT NOT NULL);",
            indices: &["CREATE INDEX thing_name_index ON thing (name);"],
        }],
    }];

    #[test]
    fn creates_schema_on_empty_database() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn, TEST_SCHEMAS).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM thing", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);

        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, BASE_DB_VERSION);
    }

    #[test]
    fn accepts_existing_database_at_latest_version() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn, TEST_SCHEMAS).unwrap();
        initialize_schema(&conn, TEST_SCHEMAS).unwrap();
    }

    #[test]
    fn rejects_unknown_version() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn, TEST_SCHEMAS).unwrap();
        conn.pragma_update(None, "user_version", 7).unwrap();

        assert!(initialize_schema(&conn, TEST_SCHEMAS).is_err());
    }
}

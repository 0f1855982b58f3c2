//! SQLite-backed token store implementation.

use super::models::AuthToken;
use super::schema::TOKEN_VERSIONED_SCHEMAS;
use super::trait_def::TokenStore;
use crate::sqlite_persistence::initialize_schema;
use anyhow::{anyhow, Context, Result};
use chrono::DateTime;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub struct SqliteTokenStore {
    conn: Mutex<Connection>,
}

impl SqliteTokenStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path).context("Failed to open token database")?;
        initialize_schema(&conn, TOKEN_VERSIONED_SCHEMAS)?;

        let has_token: bool = conn
            .query_row("SELECT 1 FROM auth_token LIMIT 1", [], |_| Ok(()))
            .optional()?
            .is_some();
        info!(
            "Token store ready, credential {}",
            if has_token { "present" } else { "absent" }
        );

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl TokenStore for SqliteTokenStore {
    fn replace(&self, token: &AuthToken) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM auth_token", [])?;
        tx.execute(
            "INSERT INTO auth_token (access_token, refresh_token, expires_in, scope, token_type, created)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                token.access_token,
                token.refresh_token,
                token.expires_in,
                token.scope,
                token.token_type,
                token.created.timestamp(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get(&self) -> Result<Option<AuthToken>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT access_token, refresh_token, expires_in, scope, token_type, created
                 FROM auth_token ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((access_token, refresh_token, expires_in, scope, token_type, created)) => {
                let created = DateTime::from_timestamp(created, 0)
                    .ok_or_else(|| anyhow!("Invalid created timestamp {} in auth_token", created))?;
                Ok(Some(AuthToken {
                    access_token,
                    refresh_token,
                    expires_in,
                    scope,
                    token_type,
                    created,
                }))
            }
        }
    }
}

use crate::sqlite_persistence::{Table, VersionedSchema};

const AUTH_TOKEN_TABLE: Table = Table {
    name: "auth_token",
    schema: "CREATE TABLE auth_token (id INTEGER PRIMARY KEY, access_token TEXT NOT NULL, refresh_token TEXT NOT NULL, expires_in INTEGER NOT NULL, scope TEXT NOT NULL, token_type TEXT NOT NULL, created INTEGER NOT NULL);",
    indices: &[],
};

pub const TOKEN_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[AUTH_TOKEN_TABLE],
}];

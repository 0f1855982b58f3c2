use crate::sqlite_persistence::{Table, VersionedSchema};

const ARTIST_TABLE: Table = Table {
    name: "artist",
    schema: "CREATE TABLE artist (id TEXT PRIMARY KEY, kind TEXT NOT NULL, href TEXT NOT NULL, name TEXT NOT NULL, popularity INTEGER NOT NULL DEFAULT 0, uri TEXT NOT NULL, modified_manually INTEGER NOT NULL DEFAULT 0);",
    indices: &[],
};

const GENRE_TABLE: Table = Table {
    name: "genre",
    schema: "CREATE TABLE genre (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE);",
    indices: &[],
};

const ARTIST_GENRE_TABLE: Table = Table {
    name: "artist_genre",
    schema: "CREATE TABLE artist_genre (artist_id TEXT NOT NULL REFERENCES artist (id), genre_id INTEGER NOT NULL REFERENCES genre (id), PRIMARY KEY (artist_id, genre_id));",
    indices: &[],
};

const IMAGE_TABLE: Table = Table {
    name: "image",
    schema: "CREATE TABLE image (id INTEGER PRIMARY KEY, artist_id TEXT NOT NULL REFERENCES artist (id), url TEXT NOT NULL, height INTEGER NOT NULL DEFAULT 0, width INTEGER NOT NULL DEFAULT 0);",
    indices: &["CREATE INDEX image_artist_id_index ON image (artist_id);"],
};

const EXTERNAL_URLS_TABLE: Table = Table {
    name: "external_urls",
    schema: "CREATE TABLE external_urls (artist_id TEXT PRIMARY KEY REFERENCES artist (id), spotify TEXT NOT NULL);",
    indices: &[],
};

const FOLLOWERS_TABLE: Table = Table {
    name: "followers",
    schema: "CREATE TABLE followers (artist_id TEXT PRIMARY KEY REFERENCES artist (id), href TEXT, total INTEGER NOT NULL DEFAULT 0);",
    indices: &[],
};

pub const ARTIST_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        ARTIST_TABLE,
        GENRE_TABLE,
        ARTIST_GENRE_TABLE,
        IMAGE_TABLE,
        EXTERNAL_URLS_TABLE,
        FOLLOWERS_TABLE,
    ],
}];

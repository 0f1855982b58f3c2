//! SQLite-backed artist store and reconciliation.

use super::models::{Artist, ExternalUrls, Followers, Image};
use super::schema::ARTIST_VERSIONED_SCHEMAS;
use super::trait_def::ArtistStore;
use crate::sqlite_persistence::initialize_schema;
use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub struct SqliteArtistStore {
    conn: Mutex<Connection>,
}

impl SqliteArtistStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path).context("Failed to open artist database")?;
        initialize_schema(&conn, ARTIST_VERSIONED_SCHEMAS)?;

        let artist_count: i64 = conn.query_row("SELECT COUNT(*) FROM artist", [], |r| r.get(0))?;
        info!("Artist store ready, {} artist(s) tracked", artist_count);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

/// Make sure every referenced genre name exists in the shared pool.
///
/// Runs before any artist row is touched (the join table references genre
/// ids) and tolerates a concurrent insert of the same name.
fn ensure_genres<'a>(conn: &Connection, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut stmt = conn.prepare_cached("INSERT OR IGNORE INTO genre (name) VALUES (?1)")?;
    for name in names {
        stmt.execute(params![name])?;
    }
    Ok(())
}

fn insert_artist_row(conn: &Connection, artist: &Artist, manual: bool) -> Result<()> {
    conn.execute(
        "INSERT INTO artist (id, kind, href, name, popularity, uri, modified_manually)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            artist.id,
            artist.kind,
            artist.href,
            artist.name,
            artist.popularity,
            artist.uri,
            manual,
        ],
    )?;
    Ok(())
}

fn update_artist_row(conn: &Connection, artist: &Artist, manual: bool) -> Result<()> {
    conn.execute(
        "UPDATE artist SET kind = ?2, href = ?3, name = ?4, popularity = ?5, uri = ?6, modified_manually = ?7
         WHERE id = ?1",
        params![
            artist.id,
            artist.kind,
            artist.href,
            artist.name,
            artist.popularity,
            artist.uri,
            manual,
        ],
    )?;
    Ok(())
}

fn replace_genre_links(conn: &Connection, artist: &Artist) -> Result<()> {
    conn.execute(
        "DELETE FROM artist_genre WHERE artist_id = ?1",
        params![artist.id],
    )?;
    let mut stmt = conn.prepare_cached(
        "INSERT OR IGNORE INTO artist_genre (artist_id, genre_id)
         SELECT ?1, id FROM genre WHERE name = ?2",
    )?;
    for name in &artist.genres {
        stmt.execute(params![artist.id, name])?;
    }
    Ok(())
}

fn replace_side_records(conn: &Connection, artist: &Artist) -> Result<()> {
    conn.execute(
        "DELETE FROM external_urls WHERE artist_id = ?1",
        params![artist.id],
    )?;
    conn.execute(
        "INSERT INTO external_urls (artist_id, spotify) VALUES (?1, ?2)",
        params![artist.id, artist.external_urls.spotify],
    )?;
    conn.execute(
        "DELETE FROM followers WHERE artist_id = ?1",
        params![artist.id],
    )?;
    conn.execute(
        "INSERT INTO followers (artist_id, href, total) VALUES (?1, ?2, ?3)",
        params![artist.id, artist.followers.href, artist.followers.total],
    )?;
    Ok(())
}

fn insert_images(conn: &Connection, artist: &Artist) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO image (artist_id, url, height, width) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for image in &artist.images {
        stmt.execute(params![artist.id, image.url, image.height, image.width])?;
    }
    Ok(())
}

/// Merge incoming images into the stored set, matching by URL: unmatched old
/// rows are dropped, unmatched new ones created, matched ones kept untouched
/// so they retain their row identity.
fn merge_images(conn: &Connection, artist: &Artist) -> Result<()> {
    let old_urls: Vec<String> = {
        let mut stmt =
            conn.prepare_cached("SELECT url FROM image WHERE artist_id = ?1 ORDER BY id")?;
        let urls = stmt
            .query_map(params![artist.id], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        urls
    };
    let new_urls: HashSet<&str> = artist.images.iter().map(|i| i.url.as_str()).collect();

    let mut delete_stmt =
        conn.prepare_cached("DELETE FROM image WHERE artist_id = ?1 AND url = ?2")?;
    for url in old_urls.iter().filter(|url| !new_urls.contains(url.as_str())) {
        delete_stmt.execute(params![artist.id, url])?;
    }

    let old_urls: HashSet<&str> = old_urls.iter().map(String::as_str).collect();
    let mut insert_stmt = conn.prepare_cached(
        "INSERT INTO image (artist_id, url, height, width) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for image in artist
        .images
        .iter()
        .filter(|image| !old_urls.contains(image.url.as_str()))
    {
        insert_stmt.execute(params![artist.id, image.url, image.height, image.width])?;
    }
    Ok(())
}

fn read_artist(conn: &Connection, artist_id: &str) -> Result<Option<Artist>> {
    let row = conn
        .query_row(
            "SELECT id, kind, href, name, popularity, uri, modified_manually
             FROM artist WHERE id = ?1",
            params![artist_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, bool>(6)?,
                ))
            },
        )
        .optional()?;
    let Some((id, kind, href, name, popularity, uri, modified_manually)) = row else {
        return Ok(None);
    };

    let genres: Vec<String> = {
        let mut stmt = conn.prepare_cached(
            "SELECT g.name FROM genre g
             JOIN artist_genre ag ON ag.genre_id = g.id
             WHERE ag.artist_id = ?1 ORDER BY g.name",
        )?;
        let genres = stmt
            .query_map(params![artist_id], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        genres
    };

    let external_urls = conn
        .query_row(
            "SELECT spotify FROM external_urls WHERE artist_id = ?1",
            params![artist_id],
            |row| row.get(0),
        )
        .optional()?
        .map(|spotify| ExternalUrls { spotify })
        .unwrap_or(ExternalUrls {
            spotify: String::new(),
        });

    let followers = conn
        .query_row(
            "SELECT href, total FROM followers WHERE artist_id = ?1",
            params![artist_id],
            |row| {
                Ok(Followers {
                    href: row.get(0)?,
                    total: row.get(1)?,
                })
            },
        )
        .optional()?
        .unwrap_or(Followers {
            href: None,
            total: 0,
        });

    let images: Vec<Image> = {
        let mut stmt = conn.prepare_cached(
            "SELECT url, height, width FROM image WHERE artist_id = ?1 ORDER BY id",
        )?;
        let images = stmt
            .query_map(params![artist_id], |row| {
                Ok(Image {
                    url: row.get(0)?,
                    height: row.get(1)?,
                    width: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<_>>()?;
        images
    };

    Ok(Some(Artist {
        id,
        kind,
        href,
        name,
        popularity,
        uri,
        genres,
        external_urls,
        followers,
        images,
        modified_manually,
    }))
}

/// Read every artist whose id is in `artist_ids`, in storage-query order.
fn read_artists_in(conn: &Connection, artist_ids: &[&str]) -> Result<Vec<Artist>> {
    if artist_ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; artist_ids.len()].join(", ");
    let ids: Vec<String> = {
        let mut stmt = conn.prepare(&format!(
            "SELECT id FROM artist WHERE id IN ({}) ORDER BY id",
            placeholders
        ))?;
        let ids = stmt
            .query_map(params_from_iter(artist_ids.iter()), |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        ids
    };

    let mut artists = Vec::with_capacity(ids.len());
    for id in &ids {
        if let Some(artist) = read_artist(conn, id)? {
            artists.push(artist);
        }
    }
    Ok(artists)
}

fn delete_owned_rows(conn: &Connection, artist_id: &str) -> Result<()> {
    conn.execute("DELETE FROM image WHERE artist_id = ?1", params![artist_id])?;
    conn.execute(
        "DELETE FROM external_urls WHERE artist_id = ?1",
        params![artist_id],
    )?;
    conn.execute(
        "DELETE FROM followers WHERE artist_id = ?1",
        params![artist_id],
    )?;
    conn.execute(
        "DELETE FROM artist_genre WHERE artist_id = ?1",
        params![artist_id],
    )?;
    Ok(())
}

impl ArtistStore for SqliteArtistStore {
    fn upsert_artists(
        &self,
        artists: &[Artist],
        skip_manual: bool,
        force_manual: bool,
    ) -> Result<Vec<Artist>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        ensure_genres(
            &tx,
            artists.iter().flat_map(|a| a.genres.iter()).map(String::as_str),
        )?;

        for artist in artists {
            let stored_manual: Option<bool> = tx
                .query_row(
                    "SELECT modified_manually FROM artist WHERE id = ?1",
                    params![artist.id],
                    |row| row.get(0),
                )
                .optional()?;

            match stored_manual {
                None => {
                    insert_artist_row(&tx, artist, force_manual)?;
                    replace_genre_links(&tx, artist)?;
                    replace_side_records(&tx, artist)?;
                    insert_images(&tx, artist)?;
                }
                Some(stored_manual) => {
                    if !force_manual && skip_manual && stored_manual {
                        continue;
                    }
                    update_artist_row(&tx, artist, force_manual)?;
                    replace_genre_links(&tx, artist)?;
                    replace_side_records(&tx, artist)?;
                    merge_images(&tx, artist)?;
                }
            }
        }

        let requested: Vec<&str> = artists.iter().map(|a| a.id.as_str()).collect();
        let result = read_artists_in(&tx, &requested)?;
        tx.commit()?;
        Ok(result)
    }

    fn upsert_artist(
        &self,
        artist: &Artist,
        skip_manual: bool,
        force_manual: bool,
    ) -> Result<Option<Artist>> {
        let mut result = self.upsert_artists(std::slice::from_ref(artist), skip_manual, force_manual)?;
        Ok(if result.is_empty() {
            None
        } else {
            Some(result.swap_remove(0))
        })
    }

    fn get_artist(&self, artist_id: &str) -> Result<Option<Artist>> {
        let conn = self.conn.lock().unwrap();
        read_artist(&conn, artist_id)
    }

    fn create_artist(&self, artist: &Artist) -> Result<Artist> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        ensure_genres(&tx, artist.genres.iter().map(String::as_str))?;
        insert_artist_row(&tx, artist, true)?;
        replace_genre_links(&tx, artist)?;
        replace_side_records(&tx, artist)?;
        insert_images(&tx, artist)?;

        let created = read_artist(&tx, &artist.id)?
            .with_context(|| format!("Artist {} missing right after create", artist.id))?;
        tx.commit()?;
        Ok(created)
    }

    fn delete_artist(&self, artist_id: &str) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        delete_owned_rows(&tx, artist_id)?;
        tx.execute("DELETE FROM artist WHERE id = ?1", params![artist_id])?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_tmp_store() -> (SqliteArtistStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteArtistStore::new(temp_dir.path().join("artist.db")).unwrap();
        (store, temp_dir)
    }

    fn make_artist(id: &str, popularity: i64) -> Artist {
        Artist {
            id: id.to_string(),
            kind: "artist".to_string(),
            href: format!("http://example.com/{}", id),
            name: format!("test artist {}", id),
            popularity,
            uri: format!("spotify:artist:{}", id),
            genres: vec!["test genre".to_string()],
            external_urls: ExternalUrls {
                spotify: format!("http://example.com/{}", id),
            },
            followers: Followers {
                href: None,
                total: 1,
            },
            images: vec![Image {
                url: format!("http://example.com/{}/image", id),
                height: 10,
                width: 20,
            }],
            modified_manually: false,
        }
    }

    fn image_ids(store: &SqliteArtistStore, artist_id: &str) -> Vec<(i64, String)> {
        let conn = store.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT id, url FROM image WHERE artist_id = ?1 ORDER BY id")
            .unwrap();
        let rows = stmt
            .query_map(params![artist_id], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        rows
    }

    fn genre_rows(store: &SqliteArtistStore) -> Vec<String> {
        let conn = store.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT name FROM genre ORDER BY name").unwrap();
        let rows = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        rows
    }

    #[test]
    fn upsert_creates_missing_artist() {
        let (store, _tmp) = create_tmp_store();
        let artist = make_artist("a", 1);

        let returned = store.upsert_artists(&[artist.clone()], true, false).unwrap();

        assert_eq!(returned, vec![artist.clone()]);
        assert_eq!(store.get_artist("a").unwrap().unwrap(), artist);
    }

    #[test]
    fn manual_artist_survives_background_sync() {
        let (store, _tmp) = create_tmp_store();
        let mut artist = make_artist("a", 1);
        store.upsert_artist(&artist, false, true).unwrap();

        artist.popularity = 100;
        let returned = store.upsert_artist(&artist, true, false).unwrap().unwrap();

        assert_eq!(returned.popularity, 1);
        assert_eq!(store.get_artist("a").unwrap().unwrap().popularity, 1);
    }

    #[test]
    fn forced_update_overwrites_manual_artist() {
        let (store, _tmp) = create_tmp_store();
        let mut artist = make_artist("a", 1);
        store.upsert_artist(&artist, false, true).unwrap();

        artist.popularity = 100;
        let returned = store.upsert_artist(&artist, false, true).unwrap().unwrap();

        assert_eq!(returned.popularity, 100);
        assert!(returned.modified_manually);
    }

    #[test]
    fn unforced_overwrite_clears_the_manual_flag() {
        let (store, _tmp) = create_tmp_store();
        let mut artist = make_artist("a", 1);
        store.upsert_artist(&artist, false, true).unwrap();

        artist.popularity = 50;
        let returned = store.upsert_artist(&artist, false, false).unwrap().unwrap();

        assert_eq!(returned.popularity, 50);
        assert!(!returned.modified_manually);
    }

    #[test]
    fn skipped_artists_are_still_returned_with_old_values() {
        let (store, _tmp) = create_tmp_store();
        store.upsert_artist(&make_artist("a", 1), false, true).unwrap();
        store.upsert_artist(&make_artist("b", 2), true, false).unwrap();

        let snapshots = vec![make_artist("a", 100), make_artist("b", 200)];
        let returned = store.upsert_artists(&snapshots, true, false).unwrap();

        assert_eq!(returned.len(), 2);
        assert_eq!(returned[0].id, "a");
        assert_eq!(returned[0].popularity, 1);
        assert_eq!(returned[1].id, "b");
        assert_eq!(returned[1].popularity, 200);
    }

    #[test]
    fn result_comes_back_in_storage_query_order() {
        let (store, _tmp) = create_tmp_store();
        let snapshots = vec![make_artist("b", 2), make_artist("a", 1)];

        let returned = store.upsert_artists(&snapshots, true, false).unwrap();

        let ids: Vec<&str> = returned.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn images_merge_by_url_and_keep_row_identity() {
        let (store, _tmp) = create_tmp_store();
        let mut artist = make_artist("a", 1);
        artist.images = vec![
            Image {
                url: "http://example.com/a".to_string(),
                height: 1,
                width: 1,
            },
            Image {
                url: "http://example.com/b".to_string(),
                height: 2,
                width: 2,
            },
        ];
        store.upsert_artist(&artist, true, false).unwrap();

        let before = image_ids(&store, "a");
        let kept_row_id = before
            .iter()
            .find(|(_, url)| url == "http://example.com/b")
            .unwrap()
            .0;

        artist.images = vec![
            Image {
                url: "http://example.com/b".to_string(),
                height: 2,
                width: 2,
            },
            Image {
                url: "http://example.com/c".to_string(),
                height: 3,
                width: 3,
            },
        ];
        let returned = store.upsert_artist(&artist, true, false).unwrap().unwrap();

        let urls: Vec<&str> = returned.images.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, vec!["http://example.com/b", "http://example.com/c"]);

        let after = image_ids(&store, "a");
        assert_eq!(after.len(), 2);
        assert_eq!(after[0], (kept_row_id, "http://example.com/b".to_string()));
    }

    #[test]
    fn genre_pool_is_deduplicated_across_a_batch() {
        let (store, _tmp) = create_tmp_store();
        let mut first = make_artist("a", 1);
        first.genres = vec!["rock".to_string()];
        let mut second = make_artist("b", 2);
        second.genres = vec!["rock".to_string()];

        let returned = store.upsert_artists(&[first, second], true, false).unwrap();

        assert_eq!(genre_rows(&store), vec!["rock"]);
        assert_eq!(returned[0].genres, vec!["rock"]);
        assert_eq!(returned[1].genres, vec!["rock"]);
    }

    #[test]
    fn genres_are_never_deleted_from_the_pool() {
        let (store, _tmp) = create_tmp_store();
        let mut artist = make_artist("a", 1);
        artist.genres = vec!["rock".to_string()];
        store.upsert_artist(&artist, true, false).unwrap();

        artist.genres = vec!["jazz".to_string()];
        let returned = store.upsert_artist(&artist, true, false).unwrap().unwrap();

        assert_eq!(returned.genres, vec!["jazz"]);
        assert_eq!(genre_rows(&store), vec!["jazz", "rock"]);
    }

    #[test]
    fn reconciling_the_same_snapshot_twice_is_idempotent() {
        let (store, _tmp) = create_tmp_store();
        let artist = make_artist("a", 42);

        let first = store.upsert_artists(&[artist.clone()], true, false).unwrap();
        let ids_after_first = image_ids(&store, "a");

        let second = store.upsert_artists(&[artist], true, false).unwrap();
        let ids_after_second = image_ids(&store, "a");

        assert_eq!(first, second);
        assert_eq!(ids_after_first, ids_after_second);
    }

    #[test]
    fn side_records_are_replaced_wholesale() {
        let (store, _tmp) = create_tmp_store();
        let mut artist = make_artist("a", 1);
        store.upsert_artist(&artist, true, false).unwrap();

        artist.followers = Followers {
            href: Some("http://example.com/followers".to_string()),
            total: 999,
        };
        artist.external_urls = ExternalUrls {
            spotify: "http://example.com/updated".to_string(),
        };
        let returned = store.upsert_artist(&artist, true, false).unwrap().unwrap();

        assert_eq!(returned.followers, artist.followers);
        assert_eq!(returned.external_urls, artist.external_urls);
    }

    #[test]
    fn create_artist_flags_the_record_as_manual() {
        let (store, _tmp) = create_tmp_store();
        let created = store.create_artist(&make_artist("a", 1)).unwrap();

        assert!(created.modified_manually);
        assert!(store.get_artist("a").unwrap().unwrap().modified_manually);
    }

    #[test]
    fn creating_a_duplicate_artist_fails() {
        let (store, _tmp) = create_tmp_store();
        store.create_artist(&make_artist("a", 1)).unwrap();

        assert!(store.create_artist(&make_artist("a", 2)).is_err());
    }

    #[test]
    fn delete_removes_owned_rows_but_keeps_genres() {
        let (store, _tmp) = create_tmp_store();
        store.upsert_artist(&make_artist("a", 1), true, false).unwrap();

        store.delete_artist("a").unwrap();

        assert!(store.get_artist("a").unwrap().is_none());
        assert_eq!(genre_rows(&store), vec!["test genre"]);

        let conn = store.conn.lock().unwrap();
        for table in ["image", "external_urls", "followers", "artist_genre"] {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
                .unwrap();
            assert_eq!(count, 0, "leftover rows in {}", table);
        }
    }

    #[test]
    fn get_artist_returns_none_for_unknown_id() {
        let (store, _tmp) = create_tmp_store();
        assert!(store.get_artist("missing").unwrap().is_none());
    }
}

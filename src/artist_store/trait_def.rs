//! ArtistStore trait definition.

use super::models::Artist;
use anyhow::Result;

/// Storage and reconciliation for tracked artists.
///
/// The tie-break rule for `upsert_artists`/`upsert_artist` is "manual wins
/// unless the caller forces": background syncs pass `skip_manual = true,
/// force_manual = false`, direct user edits pass `skip_manual = false,
/// force_manual = true`.
pub trait ArtistStore: Send + Sync {
    /// Reconcile a batch of snapshots against stored state in a single
    /// transaction. Missing artists are created, existing ones overwritten
    /// (unless protected by the manual flag), images merged by URL, genre
    /// associations and the 1:1 side records replaced wholesale.
    ///
    /// Returns the post-merge state of every requested id, in storage-query
    /// order rather than snapshot order.
    fn upsert_artists(
        &self,
        artists: &[Artist],
        skip_manual: bool,
        force_manual: bool,
    ) -> Result<Vec<Artist>>;

    /// Single-snapshot convenience over the same reconcile path.
    fn upsert_artist(
        &self,
        artist: &Artist,
        skip_manual: bool,
        force_manual: bool,
    ) -> Result<Option<Artist>>;

    fn get_artist(&self, artist_id: &str) -> Result<Option<Artist>>;

    /// Insert a brand-new artist. The create path is only reachable through
    /// the direct edit surface, so the record is flagged as manually modified.
    fn create_artist(&self, artist: &Artist) -> Result<Artist>;

    /// Delete the artist and its owned images, external_urls and followers
    /// rows in one transaction. Genres persist in the shared pool.
    fn delete_artist(&self, artist_id: &str) -> Result<()>;
}

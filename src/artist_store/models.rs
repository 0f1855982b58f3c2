//! The tracked artist aggregate and its owned sub-records.
//!
//! The JSON shape matches the remote catalog wire format, so the same types
//! deserialize API snapshots and HTTP request bodies.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalUrls {
    pub spotify: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Followers {
    pub href: Option<String>,
    #[serde(default)]
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub height: i64,
    #[serde(default)]
    pub width: i64,
}

/// A tracked catalog artist. `id` is the remote identifier and stays stable
/// across syncs. Genres reference a shared pool deduplicated by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub href: String,
    pub name: String,
    #[serde(default)]
    pub popularity: i64,
    pub uri: String,
    #[serde(default)]
    pub genres: Vec<String>,
    pub external_urls: ExternalUrls,
    pub followers: Followers,
    #[serde(default)]
    pub images: Vec<Image>,
    /// Set by the direct update path; snapshots from the remote API never
    /// carry it, so it defaults to false on deserialization.
    #[serde(default)]
    pub modified_manually: bool,
}

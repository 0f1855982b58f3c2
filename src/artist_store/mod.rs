mod models;
mod schema;
mod store;
mod trait_def;

pub use models::{Artist, ExternalUrls, Followers, Image};
pub use store::SqliteArtistStore;
pub use trait_def::ArtistStore;

mod models;
mod schema;
mod store;
mod trait_def;

pub use models::AuthToken;
pub use store::SqliteTokenStore;
pub use trait_def::TokenStore;

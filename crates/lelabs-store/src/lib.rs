// SQLite-backed local storage
// Holds the user's preferences between runs, one JSON record per key

pub mod migrations;
pub mod store;

pub use store::{RecordStore, StoreError};

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

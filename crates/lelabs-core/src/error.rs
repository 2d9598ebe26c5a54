use thiserror::Error;

/// Everything that can go wrong in the LE LABS domain layer
#[derive(Error, Debug)]
pub enum Error {
    #[error("Catalog unavailable: {0}")]
    Catalog(#[from] crate::catalog::CatalogError),

    #[error("Invalid catalog document: {0}")]
    InvalidCatalog(String),

    #[error("Catalog fetch failed: {0}")]
    Fetch(#[from] lelabs_api::CatalogFetchError),

    #[error("Preference storage failed: {0}")]
    Storage(#[from] lelabs_store::StoreError),

    #[error("Billing request failed: {0}")]
    Billing(#[from] lelabs_api::BillingError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

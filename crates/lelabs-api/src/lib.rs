// HTTP clients for the services LE LABS talks to
pub mod billing;
pub mod catalog;
pub mod retry;

// Re-export common types
pub use billing::{
    BillingClient, BillingError, CheckoutSession, PriceKind, Product, ProductMetadata, ProductPrice,
};
pub use catalog::{CatalogClient, CatalogFetchError};
pub use retry::RetryConfig;

pub(crate) const USER_AGENT: &str = concat!("LeLabs/", env!("CARGO_PKG_VERSION"));

// Domain layer for the LE LABS showcase: catalog, follows, notifications, tiles
pub mod billing;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod gallery;
pub mod hash;
pub mod models;
pub mod notifications;
pub mod preferences;
pub mod routes;
pub mod theme;
pub mod tile;

// Re-export common types
pub use billing::{BillingService, ProductListing};
pub use catalog::{
    CatalogError, CatalogProvider, CatalogSource, EmbeddedCatalogSource, FileCatalogSource,
    HttpCatalogSource, SnapshotSource,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::Error;
pub use gallery::{NewsEntry, ProjectFilter, YourNews};
pub use models::{LabsData, NewsItem, Project, ProjectStatus, ProjectUpdate, TileSize, TileStyles};
pub use notifications::{DismissPolicy, Notification, NotificationCenter};
pub use preferences::{
    FollowedProject, MemoryBackend, PreferenceBackend, PreferenceStore, ThemePreference,
    UserPreferences,
};
pub use routes::{PageView, Route};
pub use theme::Theme;
pub use tile::{ClickOutcome, Face, Tile, TileSpec, Transition};

/// Result type alias for the domain layer
pub type Result<T> = std::result::Result<T, Error>;

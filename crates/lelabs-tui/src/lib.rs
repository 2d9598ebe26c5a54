// Terminal front-end: the tile gallery, project pages and the notification panel

pub mod app;
pub mod panel_ui;
pub mod runner;
pub mod ui;

pub use app::{Activation, App, GalleryTile, InputMode, NewsTile, View};
pub use runner::run_tui;

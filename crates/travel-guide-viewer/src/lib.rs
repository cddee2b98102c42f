//! Travel Guide Viewer - Application Library
//!
//! Desktop shell around `travel-guide-lib`: fetches the published guide
//! document, shows countries and cities with their maps, and hosts the
//! admin panel that edits, imports and exports the guide tree.

mod app;
mod entrypoint;

pub use app::TravelGuideApp;
pub use entrypoint::{log_version_info, native_main, setup_logging, short_version_info};

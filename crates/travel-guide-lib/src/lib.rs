//! Travel Guide Library - Core of the travel guide viewer
//!
//! This library holds everything that does not depend on a UI toolkit: the
//! guide tree (countries, cities, places) with its admin operations, the
//! one-time loader for the external map library, and the geo projection
//! engine that turns guide data into map overlays.
//!
//! # Architecture
//!
//! - **[`GuideStore`]**: In-memory guide tree, CRUD operations, JSON import/export
//! - **[`ScriptLoader`]**: Process-wide, at-most-once initialization of a [`MapLibrary`]
//! - **[`GeoEngine`]**: Destroy-and-rebuild projection of [`MapInputs`] onto a [`MapBackend`]
//! - **[`Navigator`]**: Fragment-based navigation between list, detail and admin pages
//!
//! The map backend, the directions service and the map library are traits so
//! the viewer can plug in its real implementations and the tests can plug in
//! in-memory fakes.

pub mod engine;
pub mod geometry;
pub mod guide;
pub mod i18n;
pub mod loader;
pub mod navigation;
pub mod store;

// Public API exports
pub use engine::{
    DirectionsError, Directions, EngineConfig, GeoEngine, MapBackend, MapInputs, MapStatus,
    OverlayError, PlaceMarker, RenderOutcome, TransitRoute, TransitStop,
};
pub use geometry::{Bounds, GeoPoint};
pub use guide::{Category, City, Country, Place};
pub use i18n::Language;
pub use loader::{LoadError, LoaderState, MapLibrary, ScriptLoader};
pub use navigation::{Navigator, Page};
pub use store::{
    CityDraft, CountryDraft, GuideStore, PlaceDraft, RequiredFieldPolicy, RoutePoints,
};

/// Error types for guide data handling
#[derive(Debug, thiserror::Error)]
pub enum GuideError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Country not found: {0}")]
    CountryNotFound(String),

    #[error("City not found: {0}")]
    CityNotFound(String),

    #[error("Place not found: {0}")]
    PlaceNotFound(String),

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

pub type Result<T> = std::result::Result<T, GuideError>;

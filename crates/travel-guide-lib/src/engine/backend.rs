//! Seams between the engine and the outside world
//!
//! [`MapBackend`] is the imperative overlay API of whatever draws the map.
//! [`Directions`] resolves a routed path between two points. Both hand out
//! plain ids so the engine can keep handles without borrowing the backend.

use super::style::{LineStyle, PinStyle};
use crate::geometry::{Bounds, GeoPoint};
use std::fmt;
use std::future::Future;

/// Handle of a map surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapId(pub u64);

/// Handle of a pin, line, segment or popup on a map surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OverlayError {
    #[error("Unknown map surface {0:?}")]
    UnknownMap(MapId),

    #[error("Unknown overlay {0:?}")]
    UnknownOverlay(OverlayId),

    #[error("Map backend error: {0}")]
    Backend(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DirectionsError {
    #[error("No route between {origin:?} and {destination:?}")]
    NoRoute {
        origin: GeoPoint,
        destination: GeoPoint,
    },

    #[error("Directions request failed: {0}")]
    Request(String),

    #[error("Invalid directions response: {0}")]
    InvalidResponse(String),
}

/// Text drawn inside a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinLabel {
    /// 1-based position of the marker in the input
    Index(usize),
    Glyph(&'static str),
}

impl fmt::Display for PinLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinLabel::Index(index) => write!(f, "{index}"),
            PinLabel::Glyph(glyph) => f.write_str(glyph),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    pub marker_id: String,
    pub position: GeoPoint,
    pub title: String,
    pub label: PinLabel,
    pub style: PinStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryTag {
    pub glyph: &'static str,
    pub label: &'static str,
}

/// Content of the info popup opened on a pin
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub thumbnail: Option<String>,
    pub title: String,
    pub tag: Option<CategoryTag>,
}

/// Imperative map surface
///
/// Every call may fail independently; the engine logs failures and carries
/// on with the next overlay.
pub trait MapBackend: Send + Sync + 'static {
    fn create_map(&self, center: GeoPoint, zoom: f64) -> Result<MapId, OverlayError>;

    fn place_pin(&self, map: MapId, pin: &Pin) -> Result<OverlayId, OverlayError>;

    fn draw_polyline(
        &self,
        map: MapId,
        path: &[GeoPoint],
        style: &LineStyle,
    ) -> Result<OverlayId, OverlayError>;

    /// Create an empty routed segment; its path arrives later
    fn create_segment(&self, map: MapId, style: &LineStyle) -> Result<OverlayId, OverlayError>;

    fn set_segment_path(&self, segment: OverlayId, path: &[GeoPoint]) -> Result<(), OverlayError>;

    fn fit_bounds(&self, map: MapId, bounds: &Bounds) -> Result<(), OverlayError>;

    fn open_popup(
        &self,
        map: MapId,
        anchor: OverlayId,
        popup: &Popup,
    ) -> Result<OverlayId, OverlayError>;

    fn close_popup(&self, popup: OverlayId) -> Result<(), OverlayError>;

    fn remove_overlay(&self, overlay: OverlayId) -> Result<(), OverlayError>;

    fn release_map(&self, map: MapId) -> Result<(), OverlayError>;
}

/// Routed driving directions
pub trait Directions: Send + Sync + 'static {
    fn route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> impl Future<Output = Result<Vec<GeoPoint>, DirectionsError>> + Send;
}

//! Geo projection engine
//!
//! Turns [`MapInputs`] into overlays on a [`MapBackend`]. Each call to
//! [`GeoEngine::render`] tears the previous map down completely and builds
//! a fresh one: seed viewport at the centroid of the focus points, pins for
//! markers (or a polyline for a bare route), then one routed segment per
//! transit leg. Segments are filled in by background tasks as directions
//! arrive; a task that finishes after its pass was torn down drops its
//! result.
//!
//! The engine never fails outward. Problems are logged and summarized in a
//! [`RenderOutcome`] and in the shared [`MapStatus`].

mod backend;
mod inputs;
mod style;

pub use backend::{
    CategoryTag, Directions, DirectionsError, MapBackend, MapId, OverlayError, OverlayId, Pin,
    PinLabel, Popup,
};
pub use inputs::{MapInputs, PlaceMarker, TransitRoute, TransitStop};
pub use style::{
    DEFAULT_SEGMENT_COLORS, EngineConfig, LineStyle, PinStyle, Rgb, SegmentPalette,
};

use crate::geometry::{Bounds, centroid};
use crate::i18n::{Language, category_label};
use crate::loader::{LoadError, MapLibrary, ScriptLoader};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::task::JoinHandle;

/// What the map view should show, shared with the UI thread
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MapStatus {
    #[default]
    Idle,
    /// Waiting for the map library
    Loading,
    Loaded,
    Failed(String),
    /// Nothing to show; no surface exists
    Suppressed,
}

/// Result of one render pass
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Suppressed,
    Rendered {
        markers: usize,
        route_drawn: bool,
        segments: usize,
    },
    LoadFailed(LoadError),
    SurfaceFailed(OverlayError),
}

struct RenderedMarker {
    id: String,
    overlay: OverlayId,
    popup: Popup,
}

/// Handles owned by one render pass
struct RenderPass {
    map: MapId,
    markers: Vec<RenderedMarker>,
    polyline: Option<OverlayId>,
    segments: Vec<OverlayId>,
    segment_tasks: Vec<JoinHandle<()>>,
    popup: Option<(OverlayId, String)>,
    mounted: Arc<AtomicBool>,
}

impl RenderPass {
    fn new(map: MapId) -> Self {
        Self {
            map,
            markers: Vec::new(),
            polyline: None,
            segments: Vec::new(),
            segment_tasks: Vec::new(),
            popup: None,
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }
}

pub struct GeoEngine<B: MapBackend, D: Directions, L: MapLibrary> {
    backend: Arc<B>,
    directions: Arc<D>,
    loader: ScriptLoader<L>,
    config: EngineConfig,
    language: Language,
    pass: Option<RenderPass>,
    rendered: Option<MapInputs>,
    status: Arc<RwLock<MapStatus>>,
}

impl<B: MapBackend, D: Directions, L: MapLibrary> GeoEngine<B, D, L> {
    pub fn new(
        backend: Arc<B>,
        directions: Arc<D>,
        loader: ScriptLoader<L>,
        config: EngineConfig,
    ) -> Self {
        Self {
            backend,
            directions,
            loader,
            config,
            language: Language::default(),
            pass: None,
            rendered: None,
            status: Arc::new(RwLock::new(MapStatus::Idle)),
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Change the popup language; the next frame re-renders if it differs
    pub fn set_language(&mut self, language: Language) {
        if self.language != language {
            self.language = language;
            self.rendered = None;
        }
    }

    pub fn status(&self) -> MapStatus {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn status_handle(&self) -> Arc<RwLock<MapStatus>> {
        Arc::clone(&self.status)
    }

    fn set_status(&self, status: MapStatus) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = status;
    }

    /// Whether `inputs` differ from what was last rendered
    pub fn needs_render(&self, inputs: &MapInputs) -> bool {
        self.rendered.as_ref() != Some(inputs)
    }

    /// Destroy the current map and project `inputs` onto a new one
    pub async fn render(&mut self, inputs: &MapInputs) -> RenderOutcome {
        profiling::scope!("GeoEngine::render");
        self.teardown();
        self.rendered = Some(inputs.clone());

        if !inputs.is_renderable() {
            tracing::debug!("No markers, route or transit to show; skipping map");
            self.set_status(MapStatus::Suppressed);
            return RenderOutcome::Suppressed;
        }

        self.set_status(MapStatus::Loading);
        if let Err(err) = self.loader.ensure_ready().await {
            tracing::error!("Failed to initialize map: {err}");
            self.set_status(MapStatus::Failed(err.to_string()));
            return RenderOutcome::LoadFailed(err);
        }

        let Some(center) = centroid(&inputs.focus_points()) else {
            self.set_status(MapStatus::Suppressed);
            return RenderOutcome::Suppressed;
        };

        let map = match self.backend.create_map(center, self.config.seed_zoom) {
            Ok(map) => map,
            Err(err) => {
                tracing::error!("Failed to create map surface: {err}");
                self.set_status(MapStatus::Failed(err.to_string()));
                return RenderOutcome::SurfaceFailed(err);
            }
        };
        let mut pass = RenderPass::new(map);

        self.place_markers(&mut pass, inputs);
        if pass.markers.is_empty() && inputs.shows_route() {
            self.draw_route(&mut pass, inputs);
        }

        if let Some(transit) = inputs.renderable_transit() {
            self.start_segments(&mut pass, transit);
            if pass.markers.is_empty() && pass.polyline.is_none() {
                let cities = transit.cities.iter().map(|c| c.position);
                self.fit(map, Bounds::from_points(cities));
            }
        }

        let outcome = RenderOutcome::Rendered {
            markers: pass.markers.len(),
            route_drawn: pass.polyline.is_some(),
            segments: pass.segments.len(),
        };
        tracing::debug!("Rendered map {map:?}: {outcome:?}");
        self.pass = Some(pass);
        self.set_status(MapStatus::Loaded);
        outcome
    }

    fn place_markers(&self, pass: &mut RenderPass, inputs: &MapInputs) {
        let mut seen = HashSet::new();
        let mut bounds: Option<Bounds> = None;

        for (index, marker) in inputs.markers.iter().enumerate() {
            if !seen.insert(marker.id.as_str()) {
                tracing::warn!("Skipping duplicate marker id {}", marker.id);
                continue;
            }

            let pin = Pin {
                marker_id: marker.id.clone(),
                position: marker.position,
                title: marker.name.clone(),
                label: marker
                    .category
                    .and_then(|c| c.glyph())
                    .map(PinLabel::Glyph)
                    .unwrap_or(PinLabel::Index(index + 1)),
                style: self.config.pin,
            };

            match self.backend.place_pin(pass.map, &pin) {
                Ok(overlay) => {
                    pass.markers.push(RenderedMarker {
                        id: marker.id.clone(),
                        overlay,
                        popup: self.popup_for(marker),
                    });
                    match bounds.as_mut() {
                        Some(bounds) => bounds.extend(marker.position),
                        None => bounds = Some(Bounds::around(marker.position)),
                    }
                }
                Err(err) => tracing::warn!("Failed to place marker {}: {err}", marker.id),
            }
        }

        self.fit(pass.map, bounds);
    }

    fn popup_for(&self, marker: &PlaceMarker) -> Popup {
        let tag = marker.category.and_then(|category| {
            Some(CategoryTag {
                glyph: category.glyph()?,
                label: category_label(category, self.language)?,
            })
        });
        Popup {
            thumbnail: marker.first_photo().map(str::to_string),
            title: marker.name.clone(),
            tag,
        }
    }

    fn draw_route(&self, pass: &mut RenderPass, inputs: &MapInputs) {
        match self
            .backend
            .draw_polyline(pass.map, &inputs.route, &self.config.route_line)
        {
            Ok(overlay) => {
                pass.polyline = Some(overlay);
                self.fit(pass.map, Bounds::from_points(inputs.route.iter().copied()));
            }
            Err(err) => tracing::warn!("Failed to draw route: {err}"),
        }
    }

    fn start_segments(&self, pass: &mut RenderPass, transit: &TransitRoute) {
        for (index, (origin, destination)) in transit.legs().enumerate() {
            let style = self.config.segments.style_for(index);
            let segment = match self.backend.create_segment(pass.map, &style) {
                Ok(segment) => segment,
                Err(err) => {
                    tracing::warn!("Failed to create route segment {index}: {err}");
                    continue;
                }
            };
            pass.segments.push(segment);

            let backend = Arc::clone(&self.backend);
            let directions = Arc::clone(&self.directions);
            let mounted = Arc::clone(&pass.mounted);
            let leg = format!("{} → {}", origin.name, destination.name);
            let (from, to) = (origin.position, destination.position);

            pass.segment_tasks.push(tokio::spawn(async move {
                let result = directions.route(from, to).await;
                if !mounted.load(Ordering::SeqCst) {
                    tracing::trace!("Map gone, dropping route segment {index} ({leg})");
                    return;
                }
                match result {
                    Ok(path) => match backend.set_segment_path(segment, &path) {
                        Ok(()) => tracing::debug!(
                            "Route segment {index} ({leg}) displayed with color {}",
                            style.color
                        ),
                        Err(err) => tracing::warn!("Failed to show route segment {index}: {err}"),
                    },
                    Err(err) => tracing::error!("Route segment {index} ({leg}) failed: {err}"),
                }
            }));
        }
    }

    fn fit(&self, map: MapId, bounds: Option<Bounds>) {
        if let Some(bounds) = bounds
            && let Err(err) = self.backend.fit_bounds(map, &bounds)
        {
            tracing::warn!("Failed to fit map to bounds: {err}");
        }
    }

    /// Open the popup of a marker, closing any other; false if the marker
    /// is not on the current map
    pub fn click_marker(&mut self, marker_id: &str) -> bool {
        let Some(pass) = self.pass.as_mut() else {
            return false;
        };
        let Some(marker) = pass.markers.iter().find(|m| m.id == marker_id) else {
            tracing::debug!("Click on unknown marker {marker_id}");
            return false;
        };

        if let Some((popup, _)) = pass.popup.take()
            && let Err(err) = self.backend.close_popup(popup)
        {
            tracing::warn!("Failed to close popup: {err}");
        }

        match self
            .backend
            .open_popup(pass.map, marker.overlay, &marker.popup)
        {
            Ok(popup) => {
                pass.popup = Some((popup, marker.id.clone()));
                true
            }
            Err(err) => {
                tracing::warn!("Failed to open popup for {marker_id}: {err}");
                false
            }
        }
    }

    pub fn close_popup(&mut self) {
        if let Some(pass) = self.pass.as_mut()
            && let Some((popup, _)) = pass.popup.take()
            && let Err(err) = self.backend.close_popup(popup)
        {
            tracing::warn!("Failed to close popup: {err}");
        }
    }

    /// Marker whose popup is open
    pub fn open_marker(&self) -> Option<&str> {
        self.pass.as_ref()?.popup.as_ref().map(|(_, id)| id.as_str())
    }

    /// Wait until every routed segment of the current pass has resolved
    pub async fn settle(&mut self) {
        let tasks = match self.pass.as_mut() {
            Some(pass) => std::mem::take(&mut pass.segment_tasks),
            None => return,
        };
        for task in tasks {
            if let Err(err) = task.await {
                tracing::warn!("Route segment task ended abnormally: {err}");
            }
        }
    }

    /// Remove every overlay and release the map surface
    pub fn teardown(&mut self) {
        let Some(pass) = self.pass.take() else {
            return;
        };
        pass.mounted.store(false, Ordering::SeqCst);

        if let Some((popup, _)) = pass.popup
            && let Err(err) = self.backend.close_popup(popup)
        {
            tracing::warn!("Failed to close popup during teardown: {err}");
        }

        let overlays = pass
            .markers
            .iter()
            .map(|m| m.overlay)
            .chain(pass.polyline)
            .chain(pass.segments.iter().copied());
        for overlay in overlays {
            if let Err(err) = self.backend.remove_overlay(overlay) {
                tracing::warn!("Failed to remove overlay during teardown: {err}");
            }
        }

        if let Err(err) = self.backend.release_map(pass.map) {
            tracing::warn!("Failed to release map during teardown: {err}");
        }
        tracing::debug!("Tore down map {:?}", pass.map);
    }
}

impl<B: MapBackend, D: Directions, L: MapLibrary> Drop for GeoEngine<B, D, L> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeoPoint;
    use crate::guide::{Category, City};
    use std::future::Future;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicU64;
    use tokio::sync::Semaphore;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        CreateMap { center: GeoPoint, zoom: f64 },
        PlacePin { marker_id: String, label: String },
        Polyline { points: usize },
        Segment { id: OverlayId, color: Rgb },
        SegmentPath { id: OverlayId, points: usize },
        Fit { south_west: GeoPoint, north_east: GeoPoint },
        OpenPopup { id: OverlayId, title: String, tag: Option<CategoryTag> },
        ClosePopup(OverlayId),
        Remove(OverlayId),
        Release(MapId),
    }

    #[derive(Default)]
    struct FakeBackend {
        ops: Mutex<Vec<Op>>,
        next_id: AtomicU64,
        fail_removals: bool,
    }

    impl FakeBackend {
        fn next(&self) -> u64 {
            self.next_id.fetch_add(1, Ordering::SeqCst) + 1
        }

        fn record(&self, op: Op) {
            self.ops.lock().unwrap().push(op);
        }

        fn ops(&self) -> Vec<Op> {
            self.ops.lock().unwrap().clone()
        }

        fn count(&self, matches: impl Fn(&Op) -> bool) -> usize {
            self.ops().iter().filter(|op| matches(op)).count()
        }
    }

    impl MapBackend for FakeBackend {
        fn create_map(&self, center: GeoPoint, zoom: f64) -> Result<MapId, OverlayError> {
            self.record(Op::CreateMap { center, zoom });
            Ok(MapId(self.next()))
        }

        fn place_pin(&self, _map: MapId, pin: &Pin) -> Result<OverlayId, OverlayError> {
            self.record(Op::PlacePin {
                marker_id: pin.marker_id.clone(),
                label: pin.label.to_string(),
            });
            Ok(OverlayId(self.next()))
        }

        fn draw_polyline(
            &self,
            _map: MapId,
            path: &[GeoPoint],
            _style: &LineStyle,
        ) -> Result<OverlayId, OverlayError> {
            self.record(Op::Polyline { points: path.len() });
            Ok(OverlayId(self.next()))
        }

        fn create_segment(&self, _map: MapId, style: &LineStyle) -> Result<OverlayId, OverlayError> {
            let id = OverlayId(self.next());
            self.record(Op::Segment {
                id,
                color: style.color,
            });
            Ok(id)
        }

        fn set_segment_path(&self, id: OverlayId, path: &[GeoPoint]) -> Result<(), OverlayError> {
            self.record(Op::SegmentPath {
                id,
                points: path.len(),
            });
            Ok(())
        }

        fn fit_bounds(&self, _map: MapId, bounds: &Bounds) -> Result<(), OverlayError> {
            self.record(Op::Fit {
                south_west: bounds.south_west(),
                north_east: bounds.north_east(),
            });
            Ok(())
        }

        fn open_popup(
            &self,
            _map: MapId,
            _anchor: OverlayId,
            popup: &Popup,
        ) -> Result<OverlayId, OverlayError> {
            let id = OverlayId(self.next());
            self.record(Op::OpenPopup {
                id,
                title: popup.title.clone(),
                tag: popup.tag,
            });
            Ok(id)
        }

        fn close_popup(&self, popup: OverlayId) -> Result<(), OverlayError> {
            self.record(Op::ClosePopup(popup));
            Ok(())
        }

        fn remove_overlay(&self, overlay: OverlayId) -> Result<(), OverlayError> {
            self.record(Op::Remove(overlay));
            if self.fail_removals {
                return Err(OverlayError::UnknownOverlay(overlay));
            }
            Ok(())
        }

        fn release_map(&self, map: MapId) -> Result<(), OverlayError> {
            self.record(Op::Release(map));
            Ok(())
        }
    }

    /// Straight-line directions, optionally held back by a gate
    struct FakeDirections {
        gate: Semaphore,
        unreachable: Option<GeoPoint>,
    }

    impl FakeDirections {
        fn open() -> Self {
            Self {
                gate: Semaphore::new(Semaphore::MAX_PERMITS),
                unreachable: None,
            }
        }

        fn gated() -> Self {
            Self {
                gate: Semaphore::new(0),
                unreachable: None,
            }
        }
    }

    impl Directions for FakeDirections {
        fn route(
            &self,
            origin: GeoPoint,
            destination: GeoPoint,
        ) -> impl Future<Output = Result<Vec<GeoPoint>, DirectionsError>> + Send {
            async move {
                let _permit = self
                    .gate
                    .acquire()
                    .await
                    .map_err(|err| DirectionsError::Request(err.to_string()))?;
                if self.unreachable == Some(destination) {
                    return Err(DirectionsError::NoRoute {
                        origin,
                        destination,
                    });
                }
                let midpoint = GeoPoint::new(
                    (origin.lat + destination.lat) / 2.0,
                    (origin.lng + destination.lng) / 2.0,
                );
                Ok(vec![origin, midpoint, destination])
            }
        }
    }

    struct FakeLibrary {
        fail: bool,
    }

    impl MapLibrary for FakeLibrary {
        fn load(&self) -> impl Future<Output = Result<(), LoadError>> + Send {
            let fail = self.fail;
            async move {
                if fail {
                    Err(LoadError::Failed("tiles unreachable".into()))
                } else {
                    Ok(())
                }
            }
        }

        fn discard(&self) {}
    }

    type TestEngine = GeoEngine<FakeBackend, FakeDirections, FakeLibrary>;

    fn engine_with(backend: FakeBackend, directions: FakeDirections) -> (TestEngine, Arc<FakeBackend>) {
        let backend = Arc::new(backend);
        let engine = GeoEngine::new(
            Arc::clone(&backend),
            Arc::new(directions),
            ScriptLoader::new(FakeLibrary { fail: false }),
            EngineConfig::default(),
        );
        (engine, backend)
    }

    fn engine() -> (TestEngine, Arc<FakeBackend>) {
        engine_with(FakeBackend::default(), FakeDirections::open())
    }

    fn marker(id: &str, lat: f64, lng: f64, category: Option<Category>) -> PlaceMarker {
        PlaceMarker {
            id: id.into(),
            name: format!("Marker {id}"),
            position: GeoPoint::new(lat, lng),
            category,
            photos: None,
        }
    }

    fn transit(count: usize) -> TransitRoute {
        TransitRoute {
            cities: (0..count)
                .map(|i| TransitStop {
                    name: format!("City {i}"),
                    position: GeoPoint::new(40.0 + i as f64, 10.0 + i as f64),
                })
                .collect(),
        }
    }

    fn tokyo() -> City {
        City {
            id: "tokyo".into(),
            name: "Tokyo".into(),
            lat: 35.6762,
            lng: 139.6503,
            route: vec![GeoPoint::new(35.6762, 139.6503), GeoPoint::new(35.66, 139.70)],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_city_route_renders_polyline() {
        let (mut engine, backend) = engine();
        let outcome = engine.render(&MapInputs::for_city(&tokyo())).await;

        assert_eq!(
            outcome,
            RenderOutcome::Rendered {
                markers: 0,
                route_drawn: true,
                segments: 0
            }
        );
        let ops = backend.ops();
        match &ops[0] {
            Op::CreateMap { center, zoom } => {
                assert!((center.lat - (35.6762 + 35.66) / 2.0).abs() < 1e-9);
                assert!((center.lng - (139.6503 + 139.70) / 2.0).abs() < 1e-9);
                assert_eq!(*zoom, 8.0);
            }
            other => panic!("expected map creation first, got {other:?}"),
        }
        assert_eq!(ops[1], Op::Polyline { points: 2 });
        assert_eq!(
            ops[2],
            Op::Fit {
                south_west: GeoPoint::new(35.66, 139.6503),
                north_east: GeoPoint::new(35.6762, 139.70),
            }
        );
        assert_eq!(engine.status(), MapStatus::Loaded);
    }

    #[tokio::test]
    async fn test_markers_suppress_route_polyline() {
        let (mut engine, backend) = engine();
        let inputs = MapInputs {
            route: vec![GeoPoint::new(1.0, 1.0), GeoPoint::new(2.0, 2.0)],
            markers: vec![marker("a", 5.0, 5.0, None)],
            transit: None,
        };
        engine.render(&inputs).await;

        assert_eq!(backend.count(|op| matches!(op, Op::Polyline { .. })), 0);
        assert_eq!(backend.count(|op| matches!(op, Op::PlacePin { .. })), 1);
        // Viewport follows the markers, not the route
        assert!(backend.ops().contains(&Op::Fit {
            south_west: GeoPoint::new(5.0, 5.0),
            north_east: GeoPoint::new(5.0, 5.0),
        }));
    }

    #[tokio::test]
    async fn test_empty_inputs_create_no_surface() {
        let (mut engine, backend) = engine();
        let inputs = MapInputs {
            route: vec![GeoPoint::new(1.0, 1.0)],
            markers: Vec::new(),
            transit: Some(transit(1)),
        };
        let outcome = engine.render(&inputs).await;

        assert_eq!(outcome, RenderOutcome::Suppressed);
        assert_eq!(engine.status(), MapStatus::Suppressed);
        assert!(backend.ops().is_empty());
        assert_eq!(engine.loader.loads_started(), 0);
    }

    #[tokio::test]
    async fn test_pin_labels() {
        let (mut engine, backend) = engine();
        let inputs = MapInputs {
            markers: vec![
                marker("a", 1.0, 1.0, Some(Category::Sightseeing)),
                marker("b", 2.0, 2.0, None),
                marker("c", 3.0, 3.0, Some(Category::Coffee)),
                marker("d", 4.0, 4.0, None),
            ],
            ..Default::default()
        };
        engine.render(&inputs).await;

        let labels: Vec<String> = backend
            .ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::PlacePin { label, .. } => Some(label),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec!["🏛️", "2", "☕", "4"]);
    }

    #[tokio::test]
    async fn test_duplicate_marker_ids_are_skipped() {
        let (mut engine, backend) = engine();
        let inputs = MapInputs {
            markers: vec![
                marker("a", 1.0, 1.0, None),
                marker("a", 2.0, 2.0, None),
                marker("b", 3.0, 3.0, None),
            ],
            ..Default::default()
        };
        let outcome = engine.render(&inputs).await;

        assert_eq!(
            outcome,
            RenderOutcome::Rendered {
                markers: 2,
                route_drawn: false,
                segments: 0
            }
        );
        assert_eq!(backend.count(|op| matches!(op, Op::PlacePin { .. })), 2);
    }

    #[tokio::test]
    async fn test_single_open_popup() {
        let (mut engine, backend) = engine();
        let inputs = MapInputs {
            markers: vec![
                marker("a", 1.0, 1.0, Some(Category::Food)),
                marker("b", 2.0, 2.0, None),
            ],
            ..Default::default()
        };
        engine.render(&inputs).await;

        assert!(engine.click_marker("a"));
        assert!(engine.click_marker("b"));
        assert!(!engine.click_marker("missing"));
        assert_eq!(engine.open_marker(), Some("b"));

        let ops = backend.ops();
        let opened: Vec<OverlayId> = ops
            .iter()
            .filter_map(|op| match op {
                Op::OpenPopup { id, .. } => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(opened.len(), 2);

        // The first popup is closed before the second one opens
        let close_first = ops.iter().position(|op| *op == Op::ClosePopup(opened[0]));
        let open_second = ops
            .iter()
            .position(|op| matches!(op, Op::OpenPopup { id, .. } if *id == opened[1]));
        assert!(close_first.unwrap() < open_second.unwrap());

        match &ops[ops.len() - 1] {
            Op::OpenPopup { tag, title, .. } => {
                assert_eq!(title, "Marker b");
                assert!(tag.is_none());
            }
            other => panic!("expected popup, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_popup_tag_follows_language() {
        let (engine, backend) = engine();
        let mut engine = engine.with_language(Language::En);
        let inputs = MapInputs {
            markers: vec![marker("a", 1.0, 1.0, Some(Category::Coffee))],
            ..Default::default()
        };
        engine.render(&inputs).await;
        engine.click_marker("a");

        assert!(backend.ops().contains(&Op::OpenPopup {
            id: OverlayId(3),
            title: "Marker a".into(),
            tag: Some(CategoryTag {
                glyph: "☕",
                label: "Drink Coffee"
            }),
        }));

        engine.set_language(Language::Ru);
        assert!(engine.needs_render(&inputs));
    }

    #[tokio::test]
    async fn test_segment_colors_cycle_through_palette() {
        let (mut engine, backend) = engine();
        let inputs = MapInputs {
            transit: Some(transit(10)),
            ..Default::default()
        };
        let outcome = engine.render(&inputs).await;
        engine.settle().await;

        assert_eq!(
            outcome,
            RenderOutcome::Rendered {
                markers: 0,
                route_drawn: false,
                segments: 9
            }
        );
        let colors: Vec<Rgb> = backend
            .ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Segment { color, .. } => Some(color),
                _ => None,
            })
            .collect();
        assert_eq!(colors.len(), 9);
        assert_eq!(colors[8], DEFAULT_SEGMENT_COLORS[0]);
        assert_eq!(&colors[..8], &DEFAULT_SEGMENT_COLORS[..]);
        assert_eq!(
            backend.count(|op| matches!(op, Op::SegmentPath { points: 3, .. })),
            9
        );
        // Transit-only maps fit the cities
        assert!(backend.ops().contains(&Op::Fit {
            south_west: GeoPoint::new(40.0, 10.0),
            north_east: GeoPoint::new(49.0, 19.0),
        }));
    }

    #[tokio::test]
    async fn test_markers_combine_with_transit() {
        let (mut engine, backend) = engine();
        let inputs = MapInputs {
            markers: vec![
                marker("tokyo-p1", 35.0, 139.0, Some(Category::Food)),
                marker("tokyo-p2", 36.0, 140.0, None),
                marker("kyoto-p1", 34.0, 138.0, Some(Category::Sightseeing)),
            ],
            transit: Some(transit(3)),
            ..Default::default()
        };
        let outcome = engine.render(&inputs).await;
        engine.settle().await;

        assert_eq!(
            outcome,
            RenderOutcome::Rendered {
                markers: 3,
                route_drawn: false,
                segments: 2
            }
        );
        assert_eq!(backend.count(|op| matches!(op, Op::PlacePin { .. })), 3);
        assert_eq!(backend.count(|op| matches!(op, Op::Segment { .. })), 2);
        assert_eq!(
            backend.count(|op| matches!(op, Op::SegmentPath { points: 3, .. })),
            2
        );
        assert_eq!(backend.count(|op| matches!(op, Op::Polyline { .. })), 0);

        // Seeded on the markers and fitted to them, not to the cities
        assert_eq!(
            backend.ops()[0],
            Op::CreateMap {
                center: GeoPoint::new(35.0, 139.0),
                zoom: 8.0
            }
        );
        let fits: Vec<Op> = backend
            .ops()
            .into_iter()
            .filter(|op| matches!(op, Op::Fit { .. }))
            .collect();
        assert_eq!(
            fits,
            vec![Op::Fit {
                south_west: GeoPoint::new(34.0, 138.0),
                north_east: GeoPoint::new(36.0, 140.0),
            }]
        );
    }

    #[tokio::test]
    async fn test_failed_segment_leaves_others_intact() {
        let directions = FakeDirections {
            unreachable: Some(GeoPoint::new(41.0, 11.0)),
            ..FakeDirections::open()
        };
        let (mut engine, backend) = engine_with(FakeBackend::default(), directions);
        let inputs = MapInputs {
            transit: Some(transit(3)),
            ..Default::default()
        };
        engine.render(&inputs).await;
        engine.settle().await;

        assert_eq!(backend.count(|op| matches!(op, Op::Segment { .. })), 2);
        assert_eq!(backend.count(|op| matches!(op, Op::SegmentPath { .. })), 1);
        assert_eq!(engine.status(), MapStatus::Loaded);
    }

    #[tokio::test]
    async fn test_late_segments_are_dropped_after_teardown() {
        let (mut engine, backend) = engine_with(FakeBackend::default(), FakeDirections::gated());
        let inputs = MapInputs {
            transit: Some(transit(2)),
            ..Default::default()
        };
        engine.render(&inputs).await;
        engine.teardown();

        engine.directions.gate.add_permits(1);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(backend.count(|op| matches!(op, Op::SegmentPath { .. })), 0);
    }

    #[tokio::test]
    async fn test_teardown_continues_past_failures() {
        let backend = FakeBackend {
            fail_removals: true,
            ..Default::default()
        };
        let (mut engine, backend) = engine_with(backend, FakeDirections::open());
        let inputs = MapInputs {
            route: vec![GeoPoint::new(1.0, 1.0), GeoPoint::new(2.0, 2.0)],
            markers: Vec::new(),
            transit: Some(transit(3)),
        };
        engine.render(&inputs).await;
        engine.settle().await;
        engine.teardown();

        // Polyline plus two segments, each removal failing
        assert_eq!(backend.count(|op| matches!(op, Op::Remove(_))), 3);
        assert_eq!(backend.count(|op| matches!(op, Op::Release(_))), 1);
    }

    #[tokio::test]
    async fn test_rerender_tears_down_previous_map() {
        let (mut engine, backend) = engine();
        let inputs = MapInputs {
            markers: vec![marker("a", 1.0, 1.0, None)],
            ..Default::default()
        };
        engine.render(&inputs).await;
        engine.click_marker("a");
        assert!(!engine.needs_render(&inputs));

        engine.render(&MapInputs::for_city(&tokyo())).await;
        let ops = backend.ops();
        let release = ops.iter().position(|op| matches!(op, Op::Release(_)));
        let second_map = ops
            .iter()
            .rposition(|op| matches!(op, Op::CreateMap { .. }));
        assert!(release.unwrap() < second_map.unwrap());
        assert_eq!(backend.count(|op| matches!(op, Op::ClosePopup(_))), 1);
        assert_eq!(engine.open_marker(), None);
    }

    #[tokio::test]
    async fn test_load_failure_draws_nothing() {
        let backend = Arc::new(FakeBackend::default());
        let mut engine = GeoEngine::new(
            Arc::clone(&backend),
            Arc::new(FakeDirections::open()),
            ScriptLoader::new(FakeLibrary { fail: true }),
            EngineConfig::default(),
        );
        let outcome = engine.render(&MapInputs::for_city(&tokyo())).await;

        assert!(matches!(outcome, RenderOutcome::LoadFailed(_)));
        assert!(matches!(engine.status(), MapStatus::Failed(_)));
        assert!(backend.ops().is_empty());
    }

    #[tokio::test]
    async fn test_drop_releases_map() {
        let (mut engine, backend) = engine();
        engine.render(&MapInputs::for_city(&tokyo())).await;
        drop(engine);
        assert_eq!(backend.count(|op| matches!(op, Op::Release(_))), 1);
    }
}

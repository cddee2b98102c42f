//! In-memory map surface drawn by the walkers plugin
//!
//! The engine talks to [`SceneBackend`] through the overlay API; the UI
//! thread takes a [`Scene`] snapshot every frame and paints it. Viewport
//! changes requested by the engine (seed center, fit to bounds) are queued
//! as a [`ViewRequest`] and applied to the walkers `MapMemory` on the next
//! frame.

use std::sync::{Mutex, MutexGuard, PoisonError};
use travel_guide_lib::engine::{LineStyle, MapId, OverlayId, Pin, Popup};
use travel_guide_lib::{Bounds, GeoPoint, MapBackend, OverlayError};

#[derive(Debug, Clone, PartialEq)]
pub struct ScenePin {
    pub id: OverlayId,
    pub pin: Pin,
}

/// Polyline or routed segment; segments start with an empty path
#[derive(Debug, Clone, PartialEq)]
pub struct SceneLine {
    pub id: OverlayId,
    pub path: Vec<GeoPoint>,
    pub style: LineStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenePopup {
    pub id: OverlayId,
    pub anchor: OverlayId,
    pub position: GeoPoint,
    pub content: Popup,
}

/// Everything currently drawn on the surface
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub pins: Vec<ScenePin>,
    pub lines: Vec<SceneLine>,
    pub popup: Option<ScenePopup>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRequest {
    pub center: GeoPoint,
    pub zoom: f64,
}

struct Surface {
    id: MapId,
    scene: Scene,
}

#[derive(Default)]
struct SceneState {
    next_id: u64,
    surface: Option<Surface>,
    view: Option<ViewRequest>,
}

impl SceneState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn surface_mut(&mut self, map: MapId) -> Result<&mut Surface, OverlayError> {
        self.surface
            .as_mut()
            .filter(|surface| surface.id == map)
            .ok_or(OverlayError::UnknownMap(map))
    }

    fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.surface.as_mut().map(|surface| &mut surface.scene)
    }
}

/// One map surface at a time, shared between the engine and the UI
#[derive(Default)]
pub struct SceneBackend {
    state: Mutex<SceneState>,
    ctx: Option<egui::Context>,
}

impl SceneBackend {
    /// Backend that repaints `ctx` after every change
    pub fn new(ctx: egui::Context) -> Self {
        Self {
            state: Mutex::default(),
            ctx: Some(ctx),
        }
    }

    fn state(&self) -> MutexGuard<'_, SceneState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn changed(&self) {
        if let Some(ctx) = &self.ctx {
            ctx.request_repaint();
        }
    }

    /// Copy of the current scene, `None` when no surface exists
    pub fn snapshot(&self) -> Option<Scene> {
        self.state().surface.as_ref().map(|surface| surface.scene.clone())
    }

    /// Pending viewport change, cleared once taken
    pub fn take_view_request(&self) -> Option<ViewRequest> {
        self.state().view.take()
    }
}

impl MapBackend for SceneBackend {
    fn create_map(&self, center: GeoPoint, zoom: f64) -> Result<MapId, OverlayError> {
        let mut state = self.state();
        let id = MapId(state.next_id());
        if let Some(old) = state.surface.replace(Surface {
            id,
            scene: Scene::default(),
        }) {
            tracing::warn!("Map {:?} replaced without being released", old.id);
        }
        state.view = Some(ViewRequest { center, zoom });
        drop(state);
        self.changed();
        Ok(id)
    }

    fn place_pin(&self, map: MapId, pin: &Pin) -> Result<OverlayId, OverlayError> {
        let mut state = self.state();
        let id = OverlayId(state.next_id());
        state.surface_mut(map)?.scene.pins.push(ScenePin {
            id,
            pin: pin.clone(),
        });
        drop(state);
        self.changed();
        Ok(id)
    }

    fn draw_polyline(
        &self,
        map: MapId,
        path: &[GeoPoint],
        style: &LineStyle,
    ) -> Result<OverlayId, OverlayError> {
        let mut state = self.state();
        let id = OverlayId(state.next_id());
        state.surface_mut(map)?.scene.lines.push(SceneLine {
            id,
            path: path.to_vec(),
            style: *style,
        });
        drop(state);
        self.changed();
        Ok(id)
    }

    fn create_segment(&self, map: MapId, style: &LineStyle) -> Result<OverlayId, OverlayError> {
        self.draw_polyline(map, &[], style)
    }

    fn set_segment_path(&self, segment: OverlayId, path: &[GeoPoint]) -> Result<(), OverlayError> {
        let mut state = self.state();
        let line = state
            .scene_mut()
            .and_then(|scene| scene.lines.iter_mut().find(|line| line.id == segment))
            .ok_or(OverlayError::UnknownOverlay(segment))?;
        line.path = path.to_vec();
        drop(state);
        self.changed();
        Ok(())
    }

    fn fit_bounds(&self, map: MapId, bounds: &Bounds) -> Result<(), OverlayError> {
        let mut state = self.state();
        state.surface_mut(map)?;
        state.view = Some(ViewRequest {
            center: bounds.center(),
            zoom: bounds.fit_zoom(),
        });
        drop(state);
        self.changed();
        Ok(())
    }

    fn open_popup(
        &self,
        map: MapId,
        anchor: OverlayId,
        popup: &Popup,
    ) -> Result<OverlayId, OverlayError> {
        let mut state = self.state();
        let id = OverlayId(state.next_id());
        let scene = &mut state.surface_mut(map)?.scene;
        let position = scene
            .pins
            .iter()
            .find(|pin| pin.id == anchor)
            .map(|pin| pin.pin.position)
            .ok_or(OverlayError::UnknownOverlay(anchor))?;
        scene.popup = Some(ScenePopup {
            id,
            anchor,
            position,
            content: popup.clone(),
        });
        drop(state);
        self.changed();
        Ok(id)
    }

    fn close_popup(&self, popup: OverlayId) -> Result<(), OverlayError> {
        let mut state = self.state();
        let scene = state
            .scene_mut()
            .filter(|scene| scene.popup.as_ref().is_some_and(|p| p.id == popup))
            .ok_or(OverlayError::UnknownOverlay(popup))?;
        scene.popup = None;
        drop(state);
        self.changed();
        Ok(())
    }

    fn remove_overlay(&self, overlay: OverlayId) -> Result<(), OverlayError> {
        let mut state = self.state();
        let scene = state
            .scene_mut()
            .ok_or(OverlayError::UnknownOverlay(overlay))?;
        let before = scene.pins.len() + scene.lines.len();
        scene.pins.retain(|pin| pin.id != overlay);
        scene.lines.retain(|line| line.id != overlay);
        if scene.pins.len() + scene.lines.len() == before {
            return Err(OverlayError::UnknownOverlay(overlay));
        }
        drop(state);
        self.changed();
        Ok(())
    }

    fn release_map(&self, map: MapId) -> Result<(), OverlayError> {
        let mut state = self.state();
        state.surface_mut(map)?;
        state.surface = None;
        state.view = None;
        drop(state);
        self.changed();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use travel_guide_lib::engine::{PinLabel, PinStyle, Rgb};

    fn pin(id: &str, lat: f64) -> Pin {
        Pin {
            marker_id: id.into(),
            position: GeoPoint::new(lat, 10.0),
            title: id.into(),
            label: PinLabel::Index(1),
            style: PinStyle::default(),
        }
    }

    fn style() -> LineStyle {
        LineStyle {
            color: Rgb::new(0, 0, 0),
            opacity: 1.0,
            width: 3.0,
        }
    }

    #[test]
    fn test_surface_lifecycle() {
        let backend = SceneBackend::default();
        assert!(backend.snapshot().is_none());

        let map = backend.create_map(GeoPoint::new(1.0, 2.0), 8.0).unwrap();
        assert_eq!(
            backend.take_view_request(),
            Some(ViewRequest {
                center: GeoPoint::new(1.0, 2.0),
                zoom: 8.0
            })
        );
        assert_eq!(backend.take_view_request(), None);

        let a = backend.place_pin(map, &pin("a", 1.0)).unwrap();
        let segment = backend.create_segment(map, &style()).unwrap();
        backend
            .set_segment_path(segment, &[GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0)])
            .unwrap();

        let scene = backend.snapshot().unwrap();
        assert_eq!(scene.pins.len(), 1);
        assert_eq!(scene.lines[0].path.len(), 2);

        backend.remove_overlay(a).unwrap();
        backend.remove_overlay(segment).unwrap();
        backend.release_map(map).unwrap();
        assert!(backend.snapshot().is_none());
    }

    #[test]
    fn test_popup_anchored_on_pin() {
        let backend = SceneBackend::default();
        let map = backend.create_map(GeoPoint::new(0.0, 0.0), 8.0).unwrap();
        let anchor = backend.place_pin(map, &pin("a", 5.0)).unwrap();
        let content = Popup {
            thumbnail: None,
            title: "A".into(),
            tag: None,
        };

        let popup = backend.open_popup(map, anchor, &content).unwrap();
        let scene = backend.snapshot().unwrap();
        let shown = scene.popup.unwrap();
        assert_eq!(shown.position, GeoPoint::new(5.0, 10.0));
        assert_eq!(shown.content, content);

        backend.close_popup(popup).unwrap();
        assert!(backend.snapshot().unwrap().popup.is_none());
        assert_eq!(
            backend.close_popup(popup),
            Err(OverlayError::UnknownOverlay(popup))
        );
    }

    #[test]
    fn test_stale_handles_are_rejected() {
        let backend = SceneBackend::default();
        let old = backend.create_map(GeoPoint::new(0.0, 0.0), 8.0).unwrap();
        let segment = backend.create_segment(old, &style()).unwrap();
        backend.remove_overlay(segment).unwrap();
        backend.release_map(old).unwrap();

        assert_eq!(
            backend.place_pin(old, &pin("a", 1.0)),
            Err(OverlayError::UnknownMap(old))
        );
        assert_eq!(
            backend.set_segment_path(segment, &[]),
            Err(OverlayError::UnknownOverlay(segment))
        );
        assert_eq!(backend.release_map(old), Err(OverlayError::UnknownMap(old)));

        let new = backend.create_map(GeoPoint::new(0.0, 0.0), 8.0).unwrap();
        assert_ne!(old, new);
        assert_eq!(
            backend.remove_overlay(segment),
            Err(OverlayError::UnknownOverlay(segment))
        );
    }

    #[test]
    fn test_fit_bounds_requests_view() {
        let backend = SceneBackend::default();
        let map = backend.create_map(GeoPoint::new(0.0, 0.0), 8.0).unwrap();
        backend.take_view_request();

        let bounds = Bounds::from_points([GeoPoint::new(10.0, 20.0), GeoPoint::new(12.0, 24.0)])
            .unwrap();
        backend.fit_bounds(map, &bounds).unwrap();
        let view = backend.take_view_request().unwrap();
        assert_eq!(view.center, bounds.center());
        assert_eq!(view.zoom, bounds.fit_zoom());
    }
}

//! Interactive maps of the detail page
//!
//! Every map on screen is a [`MapView`] keyed by a stable string. A view
//! owns one [`GeoEngine`] drawing into its own [`SceneBackend`]; the walkers
//! widget paints that scene each frame through [`ScenePlugin`]. Views that
//! are not shown during a frame are dropped by [`MapRegistry::end_frame`],
//! which tears their map down.

mod directions;
mod plugin;
mod scene;
mod tiles;

pub use directions::OsrmDirections;
pub use tiles::TilesProvider;

use plugin::{ClickSlot, SceneClick, ScenePlugin, take_click};
use scene::SceneBackend;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use tiles::{TileLibrary, tile_loader};
use tokio::task::JoinHandle;
use travel_guide_lib::i18n::{Key, t};
use travel_guide_lib::{EngineConfig, GeoEngine, GeoPoint, Language, MapInputs, MapStatus};
use walkers::{HttpTiles, Map, MapMemory};

type Engine = GeoEngine<SceneBackend, OsrmDirections, TileLibrary>;

/// Height of an embedded map, in points
pub const MAP_HEIGHT: f32 = 320.0;

pub struct MapView {
    engine: Arc<tokio::sync::Mutex<Engine>>,
    status: Arc<RwLock<MapStatus>>,
    scene: Arc<SceneBackend>,
    memory: MapMemory,
    home: GeoPoint,
    requested: Option<(MapInputs, Language)>,
    clicks: ClickSlot,
    render_task: Option<JoinHandle<()>>,
}

impl MapView {
    fn new(
        ctx: &egui::Context,
        directions: &Arc<OsrmDirections>,
        provider: TilesProvider,
        config: &EngineConfig,
    ) -> Self {
        let scene = Arc::new(SceneBackend::new(ctx.clone()));
        let engine = GeoEngine::new(
            Arc::clone(&scene),
            Arc::clone(directions),
            tile_loader(provider),
            config.clone(),
        );
        Self {
            status: engine.status_handle(),
            engine: Arc::new(tokio::sync::Mutex::new(engine)),
            scene,
            memory: MapMemory::default(),
            home: GeoPoint::new(0.0, 0.0),
            requested: None,
            clicks: ClickSlot::default(),
            render_task: None,
        }
    }

    fn status(&self) -> MapStatus {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Re-render in the background when the inputs or language changed
    fn request_render(&mut self, ctx: &egui::Context, inputs: &MapInputs, language: Language) {
        let request = (inputs.clone(), language);
        if self.requested.as_ref() == Some(&request) {
            return;
        }
        self.requested = Some(request);

        let engine = Arc::clone(&self.engine);
        let inputs = inputs.clone();
        let ctx = ctx.clone();
        self.render_task = Some(tokio::spawn(async move {
            let mut engine = engine.lock().await;
            engine.set_language(language);
            if engine.needs_render(&inputs) {
                let outcome = engine.render(&inputs).await;
                tracing::trace!("Map render finished: {outcome:?}");
            }
            ctx.request_repaint();
        }));
    }

    /// Forward a pending pin or popup click to the engine
    fn apply_click(&self) {
        let Ok(mut engine) = self.engine.try_lock() else {
            return;
        };
        match take_click(&self.clicks) {
            Some(SceneClick::Marker(id)) => {
                engine.click_marker(&id);
            }
            Some(SceneClick::ClosePopup) => engine.close_popup(),
            None => {}
        }
    }

    fn apply_view_request(&mut self) {
        if let Some(view) = self.scene.take_view_request() {
            self.home = view.center;
            self.memory
                .center_at(walkers::lat_lon(view.center.lat, view.center.lng));
            if self.memory.set_zoom(view.zoom).is_err() {
                tracing::debug!("Map zoom {} out of range", view.zoom);
            }
        }
    }

    fn show(
        &mut self,
        ui: &mut egui::Ui,
        tiles: &mut HttpTiles,
        attribution: &str,
        inputs: &MapInputs,
        language: Language,
    ) {
        profiling::scope!("MapView::show");
        self.request_render(ui.ctx(), inputs, language);
        self.apply_click();
        self.apply_view_request();

        let size = egui::vec2(ui.available_width(), MAP_HEIGHT);
        match self.status() {
            MapStatus::Suppressed => {}
            MapStatus::Failed(message) => {
                placeholder(ui, size, |ui| {
                    ui.colored_label(ui.visuals().error_fg_color, "⚠");
                    ui.label(message);
                });
            }
            MapStatus::Idle | MapStatus::Loading if shows_loading(inputs) => {
                placeholder(ui, size, |ui| {
                    ui.spinner();
                    ui.label(t(Key::MapLoading, language));
                });
            }
            MapStatus::Idle | MapStatus::Loading => {}
            MapStatus::Loaded => {
                let Some(scene) = self.scene.snapshot() else {
                    return;
                };
                let plugin = ScenePlugin::new(scene, Arc::clone(&self.clicks));
                let map = Map::new(
                    Some(tiles),
                    &mut self.memory,
                    walkers::lat_lon(self.home.lat, self.home.lng),
                )
                .with_plugin(plugin);
                let response = ui.add_sized(size, map);

                ui.painter().text(
                    response.rect.right_bottom() + egui::vec2(-4.0, -4.0),
                    egui::Align2::RIGHT_BOTTOM,
                    attribution,
                    egui::FontId::proportional(10.0),
                    egui::Color32::from_black_alpha(180),
                );
            }
        }
    }
}

impl Drop for MapView {
    fn drop(&mut self) {
        if let Some(task) = self.render_task.take() {
            task.abort();
        }
    }
}

/// Only inputs that will produce a map get the loading placeholder; the
/// others are about to be suppressed
fn shows_loading(inputs: &MapInputs) -> bool {
    inputs.is_renderable()
}

fn placeholder(ui: &mut egui::Ui, size: egui::Vec2, add_contents: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_min_size(size - egui::vec2(12.0, 12.0));
        ui.centered_and_justified(|ui| {
            ui.horizontal_centered(add_contents);
        });
    });
}

/// All map views of the current page plus the shared tile cache
pub struct MapRegistry {
    provider: TilesProvider,
    config: EngineConfig,
    directions: Arc<OsrmDirections>,
    tiles: Option<HttpTiles>,
    views: HashMap<String, MapView>,
    shown: HashSet<String>,
}

impl MapRegistry {
    pub fn new(provider: TilesProvider, directions_url: &str, config: EngineConfig) -> Self {
        Self {
            provider,
            config,
            directions: Arc::new(OsrmDirections::new(directions_url)),
            tiles: None,
            views: HashMap::new(),
            shown: HashSet::new(),
        }
    }

    pub fn begin_frame(&mut self) {
        self.shown.clear();
    }

    /// Show the map `key`, creating its view on first use
    pub fn show(&mut self, ui: &mut egui::Ui, key: &str, inputs: &MapInputs, language: Language) {
        let ctx = ui.ctx().clone();
        let Self {
            provider,
            config,
            directions,
            tiles,
            views,
            shown,
        } = self;

        let tiles = tiles.get_or_insert_with(|| provider.http_tiles(ctx.clone()));
        let view = views.entry(key.to_string()).or_insert_with(|| {
            tracing::debug!("Creating map view {key}");
            MapView::new(&ctx, directions, *provider, config)
        });
        shown.insert(key.to_string());

        ui.push_id(key, |ui| {
            view.show(ui, tiles, provider.attribution(), inputs, language);
        });
    }

    /// Drop the views that were not shown since [`Self::begin_frame`]
    pub fn end_frame(&mut self) {
        let before = self.views.len();
        self.views.retain(|key, _| self.shown.contains(key));
        let dropped = before - self.views.len();
        if dropped > 0 {
            tracing::debug!("Dropped {dropped} map views");
        }
    }
}

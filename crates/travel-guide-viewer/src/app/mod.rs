//! Application module
//!
//! The viewer has three pages:
//! - Country list with cover links and premium badges
//! - Country detail with a country map and one map per city
//! - Admin panel for editing, importing and exporting the guide

mod fetch;
mod images;
mod map;
mod settings;
mod state;
mod storage;
mod toasts;
mod transfer;
mod views;

use crate::app::settings::Settings;
use crate::app::state::{AppState, DataState};
use crate::app::storage::default_storage_backend;
use eframe::egui;
use travel_guide_lib::Page;

/// Main application structure
pub struct TravelGuideApp {
    state: AppState,
}

impl TravelGuideApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = Settings::from_cli();
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let storage = default_storage_backend()
            .inspect_err(|err| tracing::warn!("Preferences will not be saved: {err}"))
            .ok();

        let mut state = AppState::new(settings, storage);
        state.start_fetch(Some(cc.egui_ctx.clone()));
        tracing::info!("Loading guides from {}", state.source().describe());

        Self { state }
    }
}

#[profiling::all_functions]
impl eframe::App for TravelGuideApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let state = &mut self.state;

        state.poll_fetch();
        for event in transfer::drain_events() {
            state.handle_transfer(event);
        }
        state.sync_page();
        state.maps.begin_frame();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            profiling::scope!("header_panel");
            views::status::header(ui, state);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            profiling::scope!("page_panel");
            // Admin stays usable when the load failed, so data can be imported
            let gated = state.page != Page::Admin || state.data == DataState::Loading;
            if gated && views::status::data_gate(ui, state) {
                return;
            }
            match state.page.clone() {
                Page::List => views::list::show(ui, state),
                Page::CountryDetail(country_id) => views::detail::show(ui, state, &country_id),
                Page::Admin => views::admin::show(ui, state),
            }
        });

        state.maps.end_frame();
        state.toasts.show(ctx);

        profiling::finish_frame!();
    }
}

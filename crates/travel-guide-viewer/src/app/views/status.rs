//! Header bar and the loading / error screens

use crate::app::state::{AppState, DataState};
use egui::{RichText, Ui};
use travel_guide_lib::Page;
use travel_guide_lib::i18n::{Key, t};

/// Title, language toggle and admin entry
pub fn header(ui: &mut Ui, state: &mut AppState) {
    let language = state.language;
    ui.horizontal(|ui| {
        let title = ui.add(
            egui::Label::new(RichText::new(t(Key::AppTitle, language)).heading().strong())
                .sense(egui::Sense::click()),
        );
        if title.clicked() {
            state.navigate(Page::List);
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let toggle = ui
                .button(format!("🌐 {}", language.toggled().code().to_uppercase()))
                .on_hover_text(language.code().to_uppercase());
            if toggle.clicked() {
                state.set_language(language.toggled());
            }

            if state.page == Page::Admin {
                if ui.button(format!("🏠 {}", t(Key::ExitAdmin, language))).clicked() {
                    state.navigate(Page::List);
                }
            } else if ui.button(format!("⚙ {}", t(Key::AdminPanel, language))).clicked() {
                state.navigate(Page::Admin);
            }

            if state.is_fetching() {
                ui.spinner();
            }
        });
    });
}

/// Loading or error screen; false once the data is ready
pub fn data_gate(ui: &mut Ui, state: &mut AppState) -> bool {
    let language = state.language;
    match state.data.clone() {
        DataState::Ready => false,
        DataState::Loading => {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() / 3.0);
                ui.spinner();
                ui.label(t(Key::Loading, language));
            });
            true
        }
        DataState::Failed(message) => {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() / 3.0);
                ui.heading(t(Key::ErrorTitle, language));
                ui.label(t(Key::ErrorDescription, language));
                ui.label(RichText::new(message).small().weak());
                ui.add_space(8.0);
                if ui.button(format!("🔄 {}", t(Key::ErrorRetry, language))).clicked() {
                    state.start_fetch(Some(ui.ctx().clone()));
                }
            });
            true
        }
    }
}

//! Country cards

use super::truncate;
use crate::app::state::AppState;
use egui::{RichText, Ui};
use travel_guide_lib::i18n::{Key, city_count_label, t};
use travel_guide_lib::{Country, Language, Page};

pub fn show(ui: &mut Ui, state: &mut AppState) {
    profiling::scope!("list_view");
    let language = state.language;

    if state.store.is_empty() {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() / 3.0);
            ui.heading(t(Key::EmptyTitle, language));
            ui.label(t(Key::EmptyDescription, language));
        });
        return;
    }

    let mut opened = None;
    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for country in state.store.countries() {
                if country_card(ui, country, language) {
                    opened = Some(country.id.clone());
                }
                ui.add_space(8.0);
            }
        });

    if let Some(id) = opened {
        state.navigate(Page::CountryDetail(id));
    }
}

const COVER_SIZE: egui::Vec2 = egui::vec2(180.0, 120.0);

/// One clickable card; true when clicked
fn country_card(ui: &mut Ui, country: &Country, language: Language) -> bool {
    let response = egui::Frame::group(ui.style())
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                if !country.cover_image.trim().is_empty() {
                    ui.add(
                        egui::Image::from_uri(country.cover_image.trim())
                            .max_size(COVER_SIZE)
                            .corner_radius(egui::CornerRadius::same(6))
                            .show_loading_spinner(true),
                    );
                }
                ui.vertical(|ui| {
                    ui.horizontal(|ui| {
                        ui.heading(&country.country);
                        if country.is_premium {
                            ui.label(
                                RichText::new(format!("⭐ {}", t(Key::Premium, language)))
                                    .color(egui::Color32::from_rgb(202, 138, 4)),
                            );
                        }
                    });
                    ui.label(truncate(&country.description, 220));
                    ui.label(RichText::new(city_count_label(country.cities.len(), language)).weak());
                });
            });
        })
        .response
        .interact(egui::Sense::click())
        .on_hover_cursor(egui::CursorIcon::PointingHand);

    response.clicked()
}

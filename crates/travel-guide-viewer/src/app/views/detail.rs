//! Country page: header, country map and one section per city

use crate::app::images;
use crate::app::map::MapRegistry;
use crate::app::state::AppState;
use egui::{RichText, Ui};
use std::collections::HashMap;
use travel_guide_lib::geometry::path_length;
use travel_guide_lib::i18n::{Key, category_label, t};
use travel_guide_lib::{Category, City, Country, Language, MapInputs, Page, Place};

/// Per-city tab selection of the detail page
#[derive(Default)]
pub struct DetailState {
    tabs: HashMap<String, Category>,
}

impl DetailState {
    /// Selected category of a city, sightseeing until changed
    pub fn tab(&self, city_id: &str) -> Category {
        self.tabs
            .get(city_id)
            .copied()
            .unwrap_or(Category::Sightseeing)
    }

    fn tab_mut(&mut self, city_id: &str) -> &mut Category {
        self.tabs
            .entry(city_id.to_string())
            .or_insert(Category::Sightseeing)
    }
}

/// Category tabs of a city; places without a known category get their own
/// tab after the three known ones
pub fn city_tabs(city: &City) -> Vec<Category> {
    let mut tabs = Category::KNOWN.to_vec();
    if city.places_in(Category::Unlabeled).next().is_some() {
        tabs.push(Category::Unlabeled);
    }
    tabs
}

fn tab_label(category: Category, language: Language) -> String {
    match (category.glyph(), category_label(category, language)) {
        (Some(glyph), Some(label)) => format!("{glyph} {label}"),
        _ => format!("📌 {}", t(Key::NoCategory, language)),
    }
}

/// Route length label such as `Route length: 12.3 km`
pub fn route_length_label(city: &City, language: Language) -> Option<String> {
    (city.route.len() >= 2).then(|| {
        format!(
            "{}: {:.1} km",
            t(Key::RouteLength, language),
            path_length(&city.route) / 1000.0
        )
    })
}

pub fn show(ui: &mut Ui, state: &mut AppState, country_id: &str) {
    profiling::scope!("detail_view");
    let language = state.language;
    let mut back = false;

    let AppState {
        store,
        maps,
        detail,
        ..
    } = state;
    let Some(country) = store.find_country(country_id) else {
        return;
    };

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            if ui
                .button(format!("⬅ {}", t(Key::BackToCountries, language)))
                .clicked()
            {
                back = true;
            }
            ui.add_space(8.0);

            country_header(ui, country, language);
            maps.show(
                ui,
                &format!("country/{}", country.id),
                &MapInputs::for_country(country),
                language,
            );
            ui.add_space(12.0);

            for city in &country.cities {
                city_section(ui, maps, detail, country, city, language);
                ui.add_space(8.0);
            }
        });

    if back {
        state.navigate(Page::List);
    }
}

fn country_header(ui: &mut Ui, country: &Country, language: Language) {
    ui.horizontal(|ui| {
        ui.heading(RichText::new(&country.country).size(28.0));
        if country.is_premium {
            ui.label(
                RichText::new(format!("⭐ {}", t(Key::Premium, language)))
                    .color(egui::Color32::from_rgb(202, 138, 4)),
            );
        }
    });
    if !country.cover_image.trim().is_empty() {
        images::thumbnail(ui, country.cover_image.trim(), egui::vec2(640.0, 280.0));
    }
    ui.label(&country.description);
    ui.add_space(8.0);
}

fn city_section(
    ui: &mut Ui,
    maps: &mut MapRegistry,
    detail: &mut DetailState,
    country: &Country,
    city: &City,
    language: Language,
) {
    egui::CollapsingHeader::new(RichText::new(&city.name).heading())
        .id_salt(("city", &country.id, &city.id))
        .default_open(true)
        .show(ui, |ui| {
            ui.label(&city.description);

            images::carousel(
                ui,
                ("city", &city.id),
                &images::non_blank(&city.cover_images),
                egui::vec2(520.0, 260.0),
            );

            if let Some(label) = route_length_label(city, language) {
                ui.label(RichText::new(label).weak());
            }

            maps.show(
                ui,
                &format!("country/{}/city/{}", country.id, city.id),
                &MapInputs::for_city(city),
                language,
            );

            ui.add_space(8.0);
            ui.strong(t(Key::WhatToVisit, language));
            let selected = detail.tab_mut(&city.id);
            ui.horizontal(|ui| {
                for category in city_tabs(city) {
                    ui.selectable_value(selected, category, tab_label(category, language));
                }
            });
            ui.separator();

            let mut any = false;
            for place in city.places_in(*selected) {
                place_card(ui, place, language);
                any = true;
            }
            if !any {
                ui.label(RichText::new(t(Key::EmptyTitle, language)).weak());
            }
        });
}

fn place_card(ui: &mut Ui, place: &Place, language: Language) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.horizontal(|ui| {
            ui.strong(format!("📍 {}", place.name));
            if !place.google_maps_url.is_empty() {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.hyperlink_to(
                        format!("{} ↗", t(Key::OpenOnMaps, language)),
                        &place.google_maps_url,
                    );
                });
            }
        });
        ui.label(&place.description);

        images::carousel(
            ui,
            ("place", &place.id),
            &images::non_blank(&place.photos),
            egui::vec2(360.0, 220.0),
        );

        if !place.annotation.is_empty() {
            egui::Frame::new()
                .fill(ui.visuals().faint_bg_color)
                .inner_margin(8.0)
                .show(ui, |ui| {
                    ui.label(RichText::new(t(Key::Comment, language)).small().strong());
                    ui.label(&place.annotation);
                });
        }
    });
    ui.add_space(6.0);
}

//! Admin panel: manage countries, cities and places, import and export
//!
//! Form labels are English only, like the rest of the authoring tools;
//! toasts follow the interface language.

use super::truncate;
use crate::app::state::AppState;
use crate::app::toasts::Toasts;
use crate::app::transfer;
use egui::{RichText, Ui};
use travel_guide_lib::geometry::path_length;
use travel_guide_lib::i18n::{Key, category_label, t};
use travel_guide_lib::store::parse_coordinate;
use travel_guide_lib::{
    Category, City, CityDraft, CountryDraft, GeoPoint, GuideError, GuideStore, Language, Page,
    Place, PlaceDraft, RoutePoints,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminTab {
    #[default]
    Countries,
    Cities,
    Places,
}

/// City form; coordinates stay as typed until saved
#[derive(Debug, Clone, PartialEq)]
pub struct CityForm {
    pub name: String,
    pub description: String,
    pub cover_images: Vec<String>,
    pub lat: String,
    pub lng: String,
    pub route: RoutePoints,
}

impl Default for CityForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            cover_images: vec![String::new()],
            lat: String::new(),
            lng: String::new(),
            route: RoutePoints::default(),
        }
    }
}

impl From<&City> for CityForm {
    fn from(city: &City) -> Self {
        let mut cover_images = city.cover_images.clone();
        if cover_images.is_empty() {
            cover_images.push(String::new());
        }
        Self {
            name: city.name.clone(),
            description: city.description.clone(),
            cover_images,
            lat: city.lat.to_string(),
            lng: city.lng.to_string(),
            route: RoutePoints::new(city.route.clone()),
        }
    }
}

impl CityForm {
    pub fn to_draft(&self) -> CityDraft {
        CityDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            cover_images: self.cover_images.clone(),
            lat: parse_coordinate(&self.lat),
            lng: parse_coordinate(&self.lng),
            route: self.route.clone().into_points(),
        }
    }
}

/// Place form; photos are one URL per line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceForm {
    pub name: String,
    pub description: String,
    pub annotation: String,
    pub google_maps_url: String,
    pub lat: String,
    pub lng: String,
    pub photos: String,
    pub category: Category,
}

impl From<&Place> for PlaceForm {
    fn from(place: &Place) -> Self {
        Self {
            name: place.name.clone(),
            description: place.description.clone(),
            annotation: place.annotation.clone(),
            google_maps_url: place.google_maps_url.clone(),
            lat: place.lat.to_string(),
            lng: place.lng.to_string(),
            photos: place.photos.join("\n"),
            category: place.category(),
        }
    }
}

impl PlaceForm {
    pub fn to_draft(&self) -> PlaceDraft {
        PlaceDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            annotation: self.annotation.clone(),
            google_maps_url: self.google_maps_url.clone(),
            lat: parse_coordinate(&self.lat),
            lng: parse_coordinate(&self.lng),
            photos: PlaceDraft::photos_from_lines(&self.photos),
            category: self.category,
        }
    }
}

/// Open add/edit dialog; `editing` is `None` when adding
#[derive(Debug, Clone, PartialEq)]
pub enum Editor {
    Country {
        editing: Option<String>,
        form: CountryDraft,
    },
    City {
        country_id: String,
        editing: Option<String>,
        form: CityForm,
    },
    Place {
        country_id: String,
        city_id: String,
        editing: Option<String>,
        form: PlaceForm,
    },
}

impl Editor {
    fn title(&self) -> &'static str {
        match self {
            Editor::Country { editing: None, .. } => "Add Country",
            Editor::Country { .. } => "Edit Country",
            Editor::City { editing: None, .. } => "Add City",
            Editor::City { .. } => "Edit City",
            Editor::Place { editing: None, .. } => "Add Place",
            Editor::Place { .. } => "Edit Place",
        }
    }

    /// Coordinates typed into the form
    fn coordinates(&self) -> Vec<GeoPoint> {
        match self {
            Editor::Country { .. } => Vec::new(),
            Editor::City { form, .. } => {
                let draft = form.to_draft();
                std::iter::once(GeoPoint::new(draft.lat, draft.lng))
                    .chain(draft.route)
                    .collect()
            }
            Editor::Place { form, .. } => {
                let draft = form.to_draft();
                vec![GeoPoint::new(draft.lat, draft.lng)]
            }
        }
    }

    /// Apply the form to the store, returning the toast to show
    fn apply(&self, store: &mut GuideStore) -> Result<Key, GuideError> {
        match self {
            Editor::Country { editing: None, form } => {
                store.add_country(form.clone()).map(|_| Key::AddSuccess)
            }
            Editor::Country {
                editing: Some(id),
                form,
            } => store
                .update_country(id, form.clone())
                .map(|()| Key::UpdateSuccess),
            Editor::City {
                country_id,
                editing: None,
                form,
            } => store
                .add_city(country_id, form.to_draft())
                .map(|_| Key::AddSuccess),
            Editor::City {
                country_id,
                editing: Some(id),
                form,
            } => store
                .update_city(country_id, id, form.to_draft())
                .map(|()| Key::UpdateSuccess),
            Editor::Place {
                country_id,
                city_id,
                editing: None,
                form,
            } => store
                .add_place(country_id, city_id, form.to_draft())
                .map(|_| Key::AddSuccess),
            Editor::Place {
                country_id,
                city_id,
                editing: Some(id),
                form,
            } => store
                .update_place(country_id, city_id, id, form.to_draft())
                .map(|()| Key::UpdateSuccess),
        }
    }
}

/// Entry waiting for delete confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Country {
        country_id: String,
    },
    City {
        country_id: String,
        city_id: String,
    },
    Place {
        country_id: String,
        city_id: String,
        place_id: String,
    },
}

#[derive(Debug, Default)]
pub struct AdminState {
    pub tab: AdminTab,
    pub selected_country: Option<String>,
    pub selected_city: Option<String>,
    pub editor: Option<Editor>,
    pub pending_delete: Option<DeleteTarget>,
}

impl AdminState {
    /// Save the open editor; it stays open when validation fails
    pub fn save_editor(&mut self, store: &mut GuideStore, toasts: &mut Toasts, language: Language) {
        let Some(editor) = &self.editor else {
            return;
        };
        if !editor.coordinates().iter().all(GeoPoint::is_valid) {
            toasts.error(t(Key::InvalidCoordinates, language));
            return;
        }
        match editor.apply(store) {
            Ok(key) => {
                toasts.success(t(key, language));
                self.editor = None;
            }
            Err(GuideError::MissingFields(fields)) => toasts.error(format!(
                "{}: {}",
                t(Key::RequiredFields, language),
                fields.join(", ")
            )),
            Err(err) => toasts.error(err.to_string()),
        }
    }

    pub fn confirm_delete(&mut self, store: &mut GuideStore, toasts: &mut Toasts, language: Language) {
        let Some(target) = self.pending_delete.take() else {
            return;
        };
        let result = match &target {
            DeleteTarget::Country { country_id } => store.delete_country(country_id).map(|_| ()),
            DeleteTarget::City {
                country_id,
                city_id,
            } => store.delete_city(country_id, city_id).map(|_| ()),
            DeleteTarget::Place {
                country_id,
                city_id,
                place_id,
            } => store.delete_place(country_id, city_id, place_id).map(|_| ()),
        };
        match result {
            Ok(()) => {
                tracing::debug!("Deleted {target:?}");
                toasts.success(t(Key::DeleteSuccess, language));
                self.fix_selection(store);
            }
            Err(err) => toasts.error(err.to_string()),
        }
    }

    /// Clear selections that point at entries no longer in the store
    pub fn fix_selection(&mut self, store: &GuideStore) {
        let country = self
            .selected_country
            .as_deref()
            .and_then(|id| store.find_country(id));
        if country.is_none() {
            self.selected_country = None;
        }
        if let Some(city_id) = self.selected_city.as_deref()
            && country.and_then(|c| c.find_city(city_id)).is_none()
        {
            self.selected_city = None;
        }
    }

    fn select_country(&mut self, country_id: Option<String>) {
        if self.selected_country != country_id {
            self.selected_country = country_id;
            self.selected_city = None;
        }
    }
}

pub fn show(ui: &mut Ui, state: &mut AppState) {
    profiling::scope!("admin_view");
    let language = state.language;

    ui.horizontal(|ui| {
        ui.heading(t(Key::AdminPanel, language));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button(format!("🏠 {}", t(Key::ExitAdmin, language))).clicked() {
                state.navigate(Page::List);
            }
            if ui.button(format!("⬇ {}", t(Key::Export, language))).clicked() {
                state.export(ui.ctx());
            }
            if ui.button(format!("⬆ {}", t(Key::Import, language))).clicked() {
                transfer::start_import(ui.ctx());
            }
        });
    });
    ui.separator();

    let AppState {
        store,
        admin,
        toasts,
        ..
    } = state;

    ui.horizontal(|ui| {
        ui.selectable_value(
            &mut admin.tab,
            AdminTab::Countries,
            format!("🌐 {}", t(Key::ManageCountries, language)),
        );
        ui.selectable_value(
            &mut admin.tab,
            AdminTab::Cities,
            format!("🗺 {}", t(Key::ManageCities, language)),
        );
        ui.selectable_value(
            &mut admin.tab,
            AdminTab::Places,
            format!("📍 {}", t(Key::ManagePlaces, language)),
        );
    });
    ui.add_space(8.0);

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| match admin.tab {
            AdminTab::Countries => countries_tab(ui, admin, store),
            AdminTab::Cities => cities_tab(ui, admin, store, language),
            AdminTab::Places => places_tab(ui, admin, store, language),
        });

    editor_window(ui.ctx(), admin, store, toasts, language);
    delete_window(ui.ctx(), admin, store, toasts, language);
}

fn countries_tab(ui: &mut Ui, admin: &mut AdminState, store: &GuideStore) {
    if ui.button("➕ Add Country").clicked() {
        admin.editor = Some(Editor::Country {
            editing: None,
            form: CountryDraft::default(),
        });
    }
    ui.add_space(8.0);

    egui::Grid::new("admin_countries")
        .striped(true)
        .num_columns(6)
        .show(ui, |ui| {
            for header in ["ID", "Country", "Description", "Cities", "Premium", ""] {
                ui.strong(header);
            }
            ui.end_row();

            for country in store.countries() {
                ui.label(&country.id);
                ui.label(&country.country);
                ui.label(truncate(&country.description, 60));
                ui.label(country.cities.len().to_string());
                ui.label(if country.is_premium { "⭐" } else { "" });
                ui.horizontal(|ui| {
                    if ui.small_button("✏ Edit").clicked() {
                        admin.editor = Some(Editor::Country {
                            editing: Some(country.id.clone()),
                            form: CountryDraft::from(country),
                        });
                    }
                    if ui.small_button("🗺 Cities").clicked() {
                        admin.select_country(Some(country.id.clone()));
                        admin.tab = AdminTab::Cities;
                    }
                    if ui.small_button("🗑").clicked() {
                        admin.pending_delete = Some(DeleteTarget::Country {
                            country_id: country.id.clone(),
                        });
                    }
                });
                ui.end_row();
            }
        });
}

fn country_picker(ui: &mut Ui, admin: &mut AdminState, store: &GuideStore, language: Language) {
    let selected_name = admin
        .selected_country
        .as_deref()
        .and_then(|id| store.find_country(id))
        .map(|c| c.country.as_str())
        .unwrap_or(t(Key::SelectCountry, language));

    let mut choice = admin.selected_country.clone();
    ui.horizontal(|ui| {
        ui.label(format!("{}:", t(Key::SelectCountry, language)));
        egui::ComboBox::from_id_salt("admin_country")
            .selected_text(selected_name)
            .show_ui(ui, |ui| {
                for country in store.countries() {
                    ui.selectable_value(&mut choice, Some(country.id.clone()), &country.country);
                }
            });
    });
    admin.select_country(choice);
}

fn city_picker(ui: &mut Ui, admin: &mut AdminState, store: &GuideStore, language: Language) {
    let Some(country) = admin
        .selected_country
        .as_deref()
        .and_then(|id| store.find_country(id))
    else {
        return;
    };
    let selected_name = admin
        .selected_city
        .as_deref()
        .and_then(|id| country.find_city(id))
        .map(|c| c.name.as_str())
        .unwrap_or(t(Key::SelectCity, language));

    ui.horizontal(|ui| {
        ui.label(format!("{}:", t(Key::SelectCity, language)));
        egui::ComboBox::from_id_salt("admin_city")
            .selected_text(selected_name)
            .show_ui(ui, |ui| {
                for city in &country.cities {
                    ui.selectable_value(&mut admin.selected_city, Some(city.id.clone()), &city.name);
                }
            });
    });
}

fn cities_tab(ui: &mut Ui, admin: &mut AdminState, store: &GuideStore, language: Language) {
    if store.is_empty() {
        ui.label(t(Key::NoCountries, language));
        return;
    }
    country_picker(ui, admin, store, language);

    let Some(country) = admin
        .selected_country
        .as_deref()
        .and_then(|id| store.find_country(id))
    else {
        return;
    };
    ui.add_space(8.0);
    ui.horizontal(|ui| {
        ui.heading(format!("{} - {}", t(Key::ManageCities, language), country.country));
        if ui.button("➕ Add City").clicked() {
            admin.editor = Some(Editor::City {
                country_id: country.id.clone(),
                editing: None,
                form: CityForm::default(),
            });
        }
    });
    ui.add_space(8.0);

    egui::Grid::new("admin_cities")
        .striped(true)
        .num_columns(6)
        .show(ui, |ui| {
            for header in ["ID", "City Name", "Description", "Places", "Route Points", ""] {
                ui.strong(header);
            }
            ui.end_row();

            for city in &country.cities {
                ui.label(&city.id);
                ui.label(&city.name);
                ui.label(truncate(&city.description, 60));
                ui.label(city.places.len().to_string());
                ui.label(city.route.len().to_string());
                ui.horizontal(|ui| {
                    if ui.small_button("✏ Edit").clicked() {
                        admin.editor = Some(Editor::City {
                            country_id: country.id.clone(),
                            editing: Some(city.id.clone()),
                            form: CityForm::from(city),
                        });
                    }
                    if ui.small_button("📍 Places").clicked() {
                        admin.selected_city = Some(city.id.clone());
                        admin.tab = AdminTab::Places;
                    }
                    if ui.small_button("🗑").clicked() {
                        admin.pending_delete = Some(DeleteTarget::City {
                            country_id: country.id.clone(),
                            city_id: city.id.clone(),
                        });
                    }
                });
                ui.end_row();
            }
        });
}

fn places_tab(ui: &mut Ui, admin: &mut AdminState, store: &GuideStore, language: Language) {
    if store.is_empty() {
        ui.label(t(Key::NoCountries, language));
        return;
    }
    country_picker(ui, admin, store, language);

    let Some(country) = admin
        .selected_country
        .as_deref()
        .and_then(|id| store.find_country(id))
    else {
        return;
    };
    if country.cities.is_empty() {
        ui.label(t(Key::NoCities, language));
        return;
    }
    city_picker(ui, admin, store, language);

    let Some(city) = admin
        .selected_city
        .as_deref()
        .and_then(|id| country.find_city(id))
    else {
        return;
    };
    ui.add_space(8.0);
    ui.horizontal(|ui| {
        ui.heading(format!("{} - {}", t(Key::ManagePlaces, language), city.name));
        if ui.button("➕ Add Place").clicked() {
            admin.editor = Some(Editor::Place {
                country_id: country.id.clone(),
                city_id: city.id.clone(),
                editing: None,
                form: PlaceForm::default(),
            });
        }
    });
    ui.add_space(8.0);

    egui::Grid::new("admin_places")
        .striped(true)
        .num_columns(5)
        .show(ui, |ui| {
            for header in ["ID", "Name", "Category", "Description", ""] {
                ui.strong(header);
            }
            ui.end_row();

            for place in &city.places {
                ui.label(&place.id);
                ui.label(&place.name);
                ui.label(category_text(place.category(), language));
                ui.label(truncate(&place.description, 60));
                ui.horizontal(|ui| {
                    if ui.small_button("✏ Edit").clicked() {
                        admin.editor = Some(Editor::Place {
                            country_id: country.id.clone(),
                            city_id: city.id.clone(),
                            editing: Some(place.id.clone()),
                            form: PlaceForm::from(place),
                        });
                    }
                    if ui.small_button("🗑").clicked() {
                        admin.pending_delete = Some(DeleteTarget::Place {
                            country_id: country.id.clone(),
                            city_id: city.id.clone(),
                            place_id: place.id.clone(),
                        });
                    }
                });
                ui.end_row();
            }
        });
}

fn category_text(category: Category, language: Language) -> String {
    match (category.glyph(), category_label(category, language)) {
        (Some(glyph), Some(label)) => format!("{glyph} {label}"),
        _ => t(Key::NoCategory, language).to_string(),
    }
}

enum EditorAction {
    Save,
    Cancel,
}

fn editor_window(
    ctx: &egui::Context,
    admin: &mut AdminState,
    store: &mut GuideStore,
    toasts: &mut Toasts,
    language: Language,
) {
    let Some(editor) = admin.editor.as_mut() else {
        return;
    };

    let mut open = true;
    let mut action = None;
    egui::Window::new(editor.title())
        .id(egui::Id::new("admin_editor"))
        .open(&mut open)
        .collapsible(false)
        .resizable(true)
        .default_width(520.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .max_height(480.0)
                .show(ui, |ui| match editor {
                    Editor::Country { form, .. } => country_form(ui, form),
                    Editor::City { form, .. } => city_form(ui, form),
                    Editor::Place { form, .. } => place_form(ui, form, language),
                });
            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("💾 Save").clicked() {
                    action = Some(EditorAction::Save);
                }
                if ui.button("Cancel").clicked() {
                    action = Some(EditorAction::Cancel);
                }
            });
        });

    if !open {
        action = Some(EditorAction::Cancel);
    }
    match action {
        Some(EditorAction::Save) => admin.save_editor(store, toasts, language),
        Some(EditorAction::Cancel) => admin.editor = None,
        None => {}
    }
}

fn labeled_line(ui: &mut Ui, label: &str, value: &mut String, hint: &str) {
    ui.label(label);
    ui.add(
        egui::TextEdit::singleline(value)
            .hint_text(hint)
            .desired_width(f32::INFINITY),
    );
}

fn labeled_text(ui: &mut Ui, label: &str, value: &mut String, hint: &str) {
    ui.label(label);
    ui.add(
        egui::TextEdit::multiline(value)
            .hint_text(hint)
            .desired_rows(3)
            .desired_width(f32::INFINITY),
    );
}

fn country_form(ui: &mut Ui, form: &mut CountryDraft) {
    labeled_line(ui, "Country Name *", &mut form.country, "e.g., Japan");
    labeled_text(ui, "Description *", &mut form.description, "Brief description of the country");
    labeled_line(ui, "Cover Image URL *", &mut form.cover_image, "https://...");
    ui.checkbox(&mut form.is_premium, "Premium");
}

fn city_form(ui: &mut Ui, form: &mut CityForm) {
    labeled_line(ui, "City Name *", &mut form.name, "e.g., Tokyo");
    labeled_text(ui, "Description *", &mut form.description, "Brief description of the city");

    ui.label("Cover Images URLs *");
    let can_remove = form.cover_images.len() > 1;
    let mut remove = None;
    for (index, image) in form.cover_images.iter_mut().enumerate() {
        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(image).hint_text("https://..."));
            if can_remove && ui.small_button("✕").clicked() {
                remove = Some(index);
            }
        });
    }
    if let Some(index) = remove {
        form.cover_images.remove(index);
    }
    if ui.button("➕ Add Image").clicked() {
        form.cover_images.push(String::new());
    }

    ui.columns(2, |columns| {
        labeled_line(&mut columns[0], "City Latitude *", &mut form.lat, "e.g., 35.6762");
        labeled_line(&mut columns[1], "City Longitude *", &mut form.lng, "e.g., 139.6503");
    });

    ui.add_space(8.0);
    route_editor(ui, &mut form.route);
}

fn route_editor(ui: &mut Ui, route: &mut RoutePoints) {
    ui.horizontal(|ui| {
        ui.strong(format!("Route Points ({})", route.len()));
        if ui.button("➕ Add Point").clicked() {
            route.add();
        }
        if route.len() >= 2 {
            let km = path_length(route.points()) / 1000.0;
            ui.label(RichText::new(format!("{km:.1} km")).weak());
        }
    });

    let mut remove = None;
    for index in 0..route.len() {
        let Some(point) = route.point_mut(index) else {
            continue;
        };
        ui.horizontal(|ui| {
            ui.label(format!("{}.", index + 1));
            ui.add(
                egui::DragValue::new(&mut point.lat)
                    .prefix("lat ")
                    .speed(0.0001)
                    .range(-90.0..=90.0)
                    .max_decimals(6),
            );
            ui.add(
                egui::DragValue::new(&mut point.lng)
                    .prefix("lng ")
                    .speed(0.0001)
                    .range(-180.0..=180.0)
                    .max_decimals(6),
            );
            if ui.small_button("✕").clicked() {
                remove = Some(index);
            }
        });
    }
    if let Some(index) = remove {
        route.remove(index);
    }
    if route.is_empty() {
        ui.label(RichText::new("No route points yet").weak());
    }
}

fn place_form(ui: &mut Ui, form: &mut PlaceForm, language: Language) {
    labeled_line(ui, "Place Name *", &mut form.name, "e.g., Senso-ji Temple");
    labeled_text(ui, "Description *", &mut form.description, "What makes this place worth a visit");
    labeled_text(ui, "Comment *", &mut form.annotation, "Personal tip or note");
    labeled_line(ui, "Google Maps URL *", &mut form.google_maps_url, "https://maps.google.com/...");

    ui.columns(2, |columns| {
        labeled_line(&mut columns[0], "Latitude", &mut form.lat, "e.g., 35.7148");
        labeled_line(&mut columns[1], "Longitude", &mut form.lng, "e.g., 139.7967");
    });

    ui.label("Category *");
    let selected = match form.category {
        Category::Unlabeled => t(Key::SelectCategory, language).to_string(),
        category => category_text(category, language),
    };
    egui::ComboBox::from_id_salt("admin_place_category")
        .selected_text(selected)
        .show_ui(ui, |ui| {
            for category in Category::KNOWN {
                ui.selectable_value(&mut form.category, category, category_text(category, language));
            }
        });

    labeled_text(ui, "Photo URLs * (one per line)", &mut form.photos, "https://...");
}

fn delete_window(
    ctx: &egui::Context,
    admin: &mut AdminState,
    store: &mut GuideStore,
    toasts: &mut Toasts,
    language: Language,
) {
    if admin.pending_delete.is_none() {
        return;
    }

    let mut confirmed = false;
    let mut cancelled = false;
    egui::Window::new("Are you sure?")
        .id(egui::Id::new("admin_delete"))
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            ui.label("This action cannot be undone.");
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui
                    .button(RichText::new("🗑 Delete").color(ui.visuals().error_fg_color))
                    .clicked()
                {
                    confirmed = true;
                }
                if ui.button("Cancel").clicked() {
                    cancelled = true;
                }
            });
        });

    if confirmed {
        admin.confirm_delete(store, toasts, language);
    } else if cancelled {
        admin.pending_delete = None;
    }
}

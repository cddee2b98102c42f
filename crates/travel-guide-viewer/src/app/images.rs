//! Remote images: thumbnails and a simple carousel
//!
//! Bytes are fetched and decoded by the loaders installed with
//! `egui_extras::install_image_loaders`; a spinner shows until they arrive.

use egui::{Image, Response, Sense, Ui, Vec2};

/// Clickable image that opens the full picture in the browser
pub fn thumbnail(ui: &mut Ui, url: &str, max_size: Vec2) -> Response {
    let response = ui
        .add(
            Image::from_uri(url)
                .max_size(max_size)
                .maintain_aspect_ratio(true)
                .corner_radius(egui::CornerRadius::same(6))
                .show_loading_spinner(true)
                .sense(Sense::click()),
        )
        .on_hover_cursor(egui::CursorIcon::PointingHand);
    if response.clicked() {
        ui.ctx().open_url(egui::OpenUrl::new_tab(url));
    }
    response
}

/// Move `index` by `delta` within `len` items, wrapping at both ends
pub fn step_index(index: usize, len: usize, delta: isize) -> usize {
    if len == 0 {
        return 0;
    }
    let len = len as isize;
    ((index as isize % len + delta % len + len) % len) as usize
}

/// One image at a time with previous/next buttons and a counter
///
/// The shown index lives in egui's temporary memory under `id_salt`.
pub fn carousel(ui: &mut Ui, id_salt: impl std::hash::Hash, urls: &[&str], max_size: Vec2) {
    match urls {
        [] => {}
        [only] => {
            thumbnail(ui, only, max_size);
        }
        _ => {
            let id = ui.id().with(("carousel", id_salt));
            let mut index = ui.data(|d| d.get_temp::<usize>(id)).unwrap_or(0) % urls.len();

            thumbnail(ui, urls[index], max_size);
            ui.horizontal(|ui| {
                if ui.small_button("◀").clicked() {
                    index = step_index(index, urls.len(), -1);
                }
                ui.label(format!("{} / {}", index + 1, urls.len()));
                if ui.small_button("▶").clicked() {
                    index = step_index(index, urls.len(), 1);
                }
            });
            ui.data_mut(|d| d.insert_temp(id, index));
        }
    }
}

/// Non-blank image URLs
pub fn non_blank(urls: &[String]) -> Vec<&str> {
    urls.iter()
        .map(|url| url.trim())
        .filter(|url| !url.is_empty())
        .collect()
}

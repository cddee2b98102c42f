//! Walkers plugin painting the engine's scene on the map widget

use super::scene::{Scene, ScenePopup};
use crate::app::images;
use egui::{Align2, Color32, FontId, Pos2, Stroke, Vec2};
use std::sync::{Arc, Mutex, PoisonError};
use travel_guide_lib::GeoPoint;
use travel_guide_lib::engine::{PinStyle, Rgb};
use walkers::{Plugin, Projector};

/// Radius of the round head of a pin, in points
const PIN_RADIUS: f32 = 12.0;
/// Distance from the pin tip up to the center of its head
const PIN_HEAD_OFFSET: f32 = 20.0;

/// What the user clicked on the map
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneClick {
    Marker(String),
    ClosePopup,
}

/// Last click, consumed by the map view on its next frame
pub type ClickSlot = Arc<Mutex<Option<SceneClick>>>;

pub fn take_click(slot: &ClickSlot) -> Option<SceneClick> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

fn post_click(slot: &ClickSlot, click: SceneClick) {
    *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(click);
}

fn color(rgb: Rgb, opacity: f32) -> Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(rgb.r, rgb.g, rgb.b, alpha)
}

fn project(projector: &Projector, point: GeoPoint) -> Pos2 {
    projector.project(walkers::lat_lon(point.lat, point.lng)).to_pos2()
}

/// Center of the head of a pin whose tip is at `tip`
fn pin_head(tip: Pos2) -> Pos2 {
    tip - Vec2::new(0.0, PIN_HEAD_OFFSET)
}

/// Topmost pin whose head contains `pointer`
///
/// Pins are painted in order, so later pins cover earlier ones.
pub fn hit_pin<'a>(pins: &'a [(String, Pos2)], pointer: Pos2) -> Option<&'a str> {
    pins.iter()
        .rev()
        .find(|(_, tip)| pin_head(*tip).distance(pointer) <= PIN_RADIUS + 2.0)
        .map(|(id, _)| id.as_str())
}

pub struct ScenePlugin {
    scene: Scene,
    clicks: ClickSlot,
}

impl ScenePlugin {
    pub fn new(scene: Scene, clicks: ClickSlot) -> Self {
        Self { scene, clicks }
    }

    fn paint_pin(painter: &egui::Painter, tip: Pos2, label: &str, style: &PinStyle) {
        let head = pin_head(tip);
        let fill = color(style.fill, 1.0);
        let stroke = Stroke::new(style.stroke_width, color(style.stroke, 1.0));

        painter.add(egui::Shape::convex_polygon(
            vec![
                head + Vec2::new(-PIN_RADIUS * 0.6, PIN_RADIUS * 0.6),
                head + Vec2::new(PIN_RADIUS * 0.6, PIN_RADIUS * 0.6),
                tip,
            ],
            fill,
            stroke,
        ));
        painter.circle(head, PIN_RADIUS, fill, stroke);
        painter.text(
            head,
            Align2::CENTER_CENTER,
            label,
            FontId::proportional(12.0),
            color(style.label_color, 1.0),
        );
    }

    fn show_popup(&self, ui: &egui::Ui, popup: &ScenePopup, tip: Pos2) {
        let content = &popup.content;
        egui::Area::new(egui::Id::new(("scene_popup", popup.id.0)))
            .order(egui::Order::Foreground)
            .pivot(Align2::CENTER_BOTTOM)
            .fixed_pos(pin_head(tip) - Vec2::new(0.0, PIN_RADIUS + 4.0))
            .show(ui.ctx(), |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_max_width(220.0);
                    if let Some(url) = &content.thumbnail {
                        images::thumbnail(ui, url, Vec2::new(220.0, 130.0));
                    }
                    ui.horizontal(|ui| {
                        ui.strong(&content.title);
                        if ui.small_button("✕").clicked() {
                            post_click(&self.clicks, SceneClick::ClosePopup);
                        }
                    });
                    if let Some(tag) = content.tag {
                        ui.label(format!("{} {}", tag.glyph, tag.label));
                    }
                });
            });
    }
}

impl Plugin for ScenePlugin {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        response: &egui::Response,
        projector: &Projector,
        _map_memory: &walkers::MapMemory,
    ) {
        profiling::scope!("ScenePlugin::run");
        let painter = ui.painter_at(response.rect);

        for line in &self.scene.lines {
            if line.path.len() < 2 {
                continue;
            }
            let points: Vec<Pos2> = line.path.iter().map(|p| project(projector, *p)).collect();
            let stroke = Stroke::new(line.style.width, color(line.style.color, line.style.opacity));
            painter.add(egui::Shape::line(points, stroke));
        }

        let mut tips = Vec::with_capacity(self.scene.pins.len());
        for pin in &self.scene.pins {
            let tip = project(projector, pin.pin.position);
            Self::paint_pin(&painter, tip, &pin.pin.label.to_string(), &pin.pin.style);
            tips.push((pin.pin.marker_id.clone(), tip));
        }

        if response.clicked()
            && let Some(pointer) = response.interact_pointer_pos()
        {
            match hit_pin(&tips, pointer) {
                Some(id) => post_click(&self.clicks, SceneClick::Marker(id.to_string())),
                None if self.scene.popup.is_some() => {
                    post_click(&self.clicks, SceneClick::ClosePopup)
                }
                None => {}
            }
        }

        if let Some(popup) = &self.scene.popup {
            let tip = project(projector, popup.position);
            if response.rect.contains(tip) {
                self.show_popup(ui, popup, tip);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_pin_prefers_topmost() {
        let pins = vec![
            ("a".to_string(), Pos2::new(100.0, 100.0)),
            ("b".to_string(), Pos2::new(105.0, 100.0)),
        ];
        let head = pin_head(Pos2::new(103.0, 100.0));
        assert_eq!(hit_pin(&pins, head), Some("b"));
    }

    #[test]
    fn test_hit_pin_misses() {
        let pins = vec![("a".to_string(), Pos2::new(100.0, 100.0))];
        assert_eq!(hit_pin(&pins, Pos2::new(100.0, 140.0)), None);
        assert_eq!(hit_pin(&pins, pin_head(Pos2::new(100.0, 100.0))), Some("a"));
        assert_eq!(hit_pin(&[], Pos2::ZERO), None);
    }

    #[test]
    fn test_color_alpha() {
        let c = color(Rgb::new(10, 20, 30), 0.8);
        assert_eq!(c.a(), 204);
        assert_eq!(color(Rgb::new(0, 0, 0), 2.0).a(), 255);
    }

    #[test]
    fn test_click_slot() {
        let slot: ClickSlot = Arc::default();
        assert_eq!(take_click(&slot), None);
        post_click(&slot, SceneClick::Marker("tokyo-p1".into()));
        post_click(&slot, SceneClick::ClosePopup);
        assert_eq!(take_click(&slot), Some(SceneClick::ClosePopup));
        assert_eq!(take_click(&slot), None);
    }
}

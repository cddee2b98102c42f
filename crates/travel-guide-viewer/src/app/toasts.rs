//! Short-lived notifications in the corner of the window

use std::collections::VecDeque;

/// Seconds a toast stays on screen, fades included
const TOAST_LIFETIME: f32 = 4.0;
const FADE_IN: f32 = 0.15;
const FADE_OUT: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

struct Toast {
    text: String,
    kind: ToastKind,
    shown_at: instant::Instant,
}

/// Opacity of a toast `elapsed` seconds after it appeared
pub fn toast_alpha(elapsed: f32) -> f32 {
    if elapsed < 0.0 || elapsed >= TOAST_LIFETIME {
        0.0
    } else if elapsed < FADE_IN {
        elapsed / FADE_IN
    } else if elapsed > TOAST_LIFETIME - FADE_OUT {
        (TOAST_LIFETIME - elapsed) / FADE_OUT
    } else {
        1.0
    }
}

#[derive(Default)]
pub struct Toasts {
    items: VecDeque<Toast>,
}

impl Toasts {
    pub fn push(&mut self, kind: ToastKind, text: impl Into<String>) {
        let text = text.into();
        match kind {
            ToastKind::Success => tracing::info!("{text}"),
            ToastKind::Error => tracing::warn!("{text}"),
        }
        self.items.push_back(Toast {
            text,
            kind,
            shown_at: instant::Instant::now(),
        });
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.push(ToastKind::Success, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(ToastKind::Error, text);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn prune(&mut self) {
        self.items
            .retain(|toast| toast.shown_at.elapsed().as_secs_f32() < TOAST_LIFETIME);
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        self.prune();
        if self.items.is_empty() {
            return;
        }

        egui::Area::new(egui::Id::new("toasts"))
            .order(egui::Order::Tooltip)
            .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-16.0, 16.0))
            .interactable(false)
            .show(ctx, |ui| {
                for toast in &self.items {
                    let alpha = toast_alpha(toast.shown_at.elapsed().as_secs_f32());
                    let accent = match toast.kind {
                        ToastKind::Success => egui::Color32::from_rgb(22, 163, 74),
                        ToastKind::Error => egui::Color32::from_rgb(220, 38, 38),
                    };
                    egui::Frame::popup(ui.style())
                        .fill(egui::Color32::from_black_alpha((200.0 * alpha) as u8))
                        .stroke(egui::Stroke::new(1.0, accent.gamma_multiply(alpha)))
                        .show(ui, |ui| {
                            ui.set_max_width(320.0);
                            ui.label(
                                egui::RichText::new(&toast.text)
                                    .color(egui::Color32::from_white_alpha((255.0 * alpha) as u8)),
                            );
                        });
                    ui.add_space(6.0);
                }
            });

        // Keep animating until every toast has faded out
        ctx.request_repaint();
    }
}

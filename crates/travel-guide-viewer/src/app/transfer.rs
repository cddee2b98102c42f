//! Import and export of the guide document through native file dialogs
//!
//! Dialogs run as Tokio tasks. Their outcome is pushed onto a shared queue
//! that the app drains once per frame, the same way on every platform the
//! dialog backend supports.

use once_cell::sync::Lazy;
use std::sync::{Mutex, PoisonError};
use travel_guide_lib::store::EXPORT_FILE_NAME;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    /// A file was picked for import
    Imported { name: String, bytes: Vec<u8> },
    /// The document was written to the named file
    Exported { name: String },
    Failed(String),
}

static QUEUE: Lazy<Mutex<Vec<TransferEvent>>> = Lazy::new(|| Mutex::new(Vec::new()));

fn push_event(event: TransferEvent, ctx: &egui::Context) {
    QUEUE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(event);
    ctx.request_repaint();
}

/// Take every event queued since the last call
pub fn drain_events() -> Vec<TransferEvent> {
    std::mem::take(&mut *QUEUE.lock().unwrap_or_else(PoisonError::into_inner))
}

fn json_dialog() -> rfd::AsyncFileDialog {
    rfd::AsyncFileDialog::new().add_filter("JSON", &["json"])
}

/// Ask for a JSON file and queue its contents
pub fn start_import(ctx: &egui::Context) {
    let ctx = ctx.clone();
    tokio::spawn(async move {
        let Some(handle) = json_dialog().pick_file().await else {
            tracing::debug!("Import cancelled");
            return;
        };
        let name = handle.file_name();
        let bytes = handle.read().await;
        tracing::debug!("Picked {name} ({} bytes) for import", bytes.len());
        push_event(TransferEvent::Imported { name, bytes }, &ctx);
    });
}

/// Ask where to save `json`, offering the default export name
pub fn start_export(json: String, ctx: &egui::Context) {
    let ctx = ctx.clone();
    tokio::spawn(async move {
        let Some(handle) = json_dialog()
            .set_file_name(EXPORT_FILE_NAME)
            .save_file()
            .await
        else {
            tracing::debug!("Export cancelled");
            return;
        };
        let name = handle.file_name();
        let event = match handle.write(json.as_bytes()).await {
            Ok(()) => TransferEvent::Exported { name },
            Err(err) => TransferEvent::Failed(format!("Failed to write {name}: {err}")),
        };
        push_event(event, &ctx);
    });
}

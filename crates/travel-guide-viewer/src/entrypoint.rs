//! Native entry point: logging, version banner and the eframe window

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Filter used when `RUST_LOG` is not set
fn default_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "debug,eframe::native=warn,egui::context=warn,walkers=info,hyper_util=info,reqwest::connect=info"
    } else {
        "info,eframe::native=warn,egui::context=warn,walkers=warn"
    }
}

/// Install the global tracing subscriber
///
/// Must run before anything logs. `RUST_LOG` overrides the default filter.
pub fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter()));
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(filter);

    if let Err(err) = tracing_subscriber::registry().with(fmt_layer).try_init() {
        eprintln!("Tracing already initialized: {err}");
        return;
    }
    tracing::debug!("Tracing initialized");
}

pub fn short_version_info() -> String {
    format!(
        "{} {} ({})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        if cfg!(debug_assertions) { "debug" } else { "release" }
    )
}

pub fn log_version_info() {
    tracing::info!("{}", short_version_info());
}

/// Run the application window until it is closed
///
/// Called from `main` inside the Tokio runtime so the app can spawn tasks
/// from its update loop.
pub async fn native_main(
    app_name: &str,
    app_creator: impl FnOnce(&eframe::CreationContext<'_>) -> Box<dyn eframe::App>,
) {
    setup_logging();
    log_version_info();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([480.0, 360.0])
            .with_title(app_name)
            .with_drag_and_drop(true),
        ..Default::default()
    };

    if let Err(err) = eframe::run_native(
        app_name,
        native_options,
        Box::new(move |cc| Ok(app_creator(cc))),
    ) {
        tracing::error!("Application exited with error: {err}");
    }
}

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use travel_guide_viewer::TravelGuideApp;

fn main() {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime");

    rt.block_on(async {
        travel_guide_viewer::native_main("Travel Guide", |cc| Box::new(TravelGuideApp::new(cc)))
            .await;
    });
}

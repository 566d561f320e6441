mod app;
mod layout;
mod model;
mod selection;
mod source;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        "Document Crop Layout",
        native_options,
        Box::new(|cc| Ok(Box::new(app::PrintApp::new(cc)))),
    )
}

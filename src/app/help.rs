use eframe::egui;

pub(super) fn draw_help_window(ctx: &egui::Context, open: &mut bool) {
    egui::Window::new("Help & Shortcuts")
        .open(open)
        .resizable(true)
        .default_width(520.0)
        .default_height(420.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Keyboard Shortcuts");
                ui.separator();
                help_row(ui, "⌘O", "Upload an image or PDF");
                help_row(ui, "⌘P", "Print the active tab to PDF");
                help_row(ui, "⌘⇧S", "Export the active tab as SVG");
                help_row(ui, "⌘⇧P", "Open command palette");
                help_row(ui, "Escape", "Cancel the current drag");
                help_row(ui, "F1", "Show this window");

                ui.add_space(20.0);
                ui.heading("Selecting");
                ui.separator();
                ui.label("Drag over the image to mark a region. The drag keeps tracking outside the image and ends wherever the button is released.");
                ui.label("Commit the region with Set as Front / Set as Back on the ID Card tab, or Set Photo Selection on the Photo tab.");
                ui.label("A click without a drag makes an empty region, which cannot be committed.");
                ui.label("Uploading a new file discards the regions committed on that tab.");

                ui.add_space(20.0);
                ui.heading("Printing");
                ui.separator();
                ui.label("Each committed region is stretched to fill its frame at the frame's physical size:");
                help_row(ui, "ID card", "8.5cm × 5.5cm, front and back");
                help_row(ui, "Passport", "3.5cm × 4.5cm");
                help_row(ui, "Joint", "4.5cm × 3.5cm");
                ui.label("Frames flow across A4 pages. Print at 100% scale to keep the sizes exact.");

                ui.add_space(20.0);
                ui.heading("Settings");
                ui.separator();
                ui.label("Preferences are stored in ~/.config/sheetcrop.toml or ./settings.toml:");
                ui.add_space(5.0);
                ui.code(r##"workflow = "Photo"
photo_preset = "Passport"
photo_count = 8
gap_cm = 0.2
pdf_path = "layout.pdf"
svg_path = "layout.svg"

[page]
width_cm = 21.0
height_cm = 29.7
margin_cm = 0.5"##);
                ui.add_space(5.0);
                ui.label("Set RUST_LOG=debug to trace drag events.");
            });
        });
}

fn help_row(ui: &mut egui::Ui, shortcut: &str, description: &str) {
    ui.horizontal(|ui| {
        ui.add_sized([100.0, 16.0], egui::Label::new(
            egui::RichText::new(shortcut).monospace().strong()
        ));
        ui.label(description);
    });
}

use eframe::egui;

use crate::layout::{self, PrintLayout};
use crate::model::FramePreset;
use crate::selection::{Slot, Workflow};

use super::PrintApp;
use super::command_palette::{CommandContext, CommandPalette};
use super::render::{draw_frame_preview, draw_sheet_preview, tab_button};

const SHEET_PREVIEW_WIDTH: f32 = 260.0;

fn commit_label(slot: Slot) -> &'static str {
    match slot {
        Slot::Front => "Set as Front",
        Slot::Back => "Set as Back",
        Slot::Photo => "Set Photo Selection",
    }
}

fn print_label(workflow: Workflow, frames: usize) -> String {
    match workflow {
        Workflow::Card => "Print (PDF)".to_string(),
        Workflow::Photo if frames == 1 => "Print 1 Photo".to_string(),
        Workflow::Photo => format!("Print {frames} Photos"),
    }
}

impl PrintApp {
    fn card_outputs_ui(&self, ui: &mut egui::Ui) {
        let ws = &self.card;
        let placeholder = if ws.has_image() {
            "Select a region and set as Front/Back"
        } else {
            "Upload an image first"
        };
        let frame = FramePreset::CardFace.frame();
        ui.label(format!("ID card faces, {}", frame.label()));
        ui.horizontal_wrapped(|ui| {
            for slot in [Slot::Front, Slot::Back] {
                ui.vertical(|ui| {
                    ui.strong(slot.name());
                    let transform = ws.store.get(slot).map(layout::render_transform);
                    draw_frame_preview(ui, ws.texture.as_ref(), transform, frame, placeholder);
                });
            }
        });
    }

    fn photo_outputs_ui(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let mut preset = self.photo_preset;
            egui::ComboBox::from_label("Photo type")
                .selected_text(preset.describe())
                .show_ui(ui, |ui| {
                    for p in FramePreset::PHOTO {
                        ui.selectable_value(&mut preset, p, p.describe());
                    }
                });
            self.set_photo_preset(preset);

            ui.separator();
            let mut count = self.photo_count;
            ui.label("Count");
            if ui
                .add(egui::DragValue::new(&mut count).range(1..=layout::MAX_TILE_COUNT))
                .changed()
            {
                self.set_photo_count(count);
            }
        });
        ui.add_space(6.0);

        let ws = &self.photo;
        let frame = self.photo_preset.frame();
        match ws.store.get(Slot::Photo) {
            Some(selection) => {
                let tiles = layout::tile(selection, frame, self.photo_count);
                ui.horizontal_wrapped(|ui| {
                    for transform in tiles {
                        draw_frame_preview(ui, ws.texture.as_ref(), Some(transform), frame, "");
                    }
                });
            }
            None => {
                let placeholder = if ws.has_image() {
                    "Select a region and set Photo Selection"
                } else {
                    "Upload an image first"
                };
                draw_frame_preview(ui, ws.texture.as_ref(), None, frame, placeholder);
            }
        }
    }

    fn print_ui(&mut self, ui: &mut egui::Ui, layout: &PrintLayout) {
        ui.heading("Sheet");
        if layout.is_empty() {
            ui.label("Nothing to print yet.");
        } else {
            ui.label(format!(
                "{} frame(s) on {} A4 page(s), page 1 shown",
                layout.frame_count(),
                layout.pages.len()
            ));
        }
        draw_sheet_preview(
            ui,
            self.workspace().texture.as_ref(),
            layout,
            0,
            SHEET_PREVIEW_WIDTH,
        );
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let enabled = !layout.is_empty();
            let label = print_label(self.workflow, layout.frame_count());
            if ui.add_enabled(enabled, egui::Button::new(label)).clicked() {
                self.export_pdf_dialog();
            }
            if ui
                .add_enabled(enabled, egui::Button::new("Export SVG"))
                .clicked()
            {
                self.export_svg_dialog();
            }
        });
    }

    fn error_modal(&mut self, ctx: &egui::Context) {
        let Some(message) = self.error.clone() else {
            return;
        };
        let modal = egui::Modal::new(egui::Id::new("source_error")).show(ctx, |ui| {
            ui.set_width(320.0);
            ui.heading("Could not load file");
            ui.add_space(4.0);
            ui.label(message);
            ui.add_space(8.0);
            ui.button("OK").clicked()
        });
        if modal.inner || modal.should_close() {
            self.error = None;
        }
    }
}

impl eframe::App for PrintApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let wants_keyboard = ctx.wants_keyboard_input();
        let palette_open = self.command_palette.open;
        let mut upload = false;
        let mut print_pdf = false;
        let mut export_svg = false;
        let mut cancel_drag = false;
        ctx.input_mut(|i| {
            if !palette_open
                && i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::P)
            {
                self.command_palette.open("");
            }
            if i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::S) {
                export_svg = true;
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::P) {
                print_pdf = true;
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::O) {
                upload = true;
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::F1) {
                self.show_help = true;
            }
            if !wants_keyboard
                && !palette_open
                && i.consume_key(egui::Modifiers::NONE, egui::Key::Escape)
            {
                cancel_drag = true;
            }
        });
        // Dialogs and texture uploads need the context unlocked.
        if cancel_drag {
            self.workspace_mut().drag.cancel();
        }
        if upload {
            self.upload_dialog(ctx);
        }
        let has_output = self.has_output();
        if print_pdf && has_output {
            self.export_pdf_dialog();
        }
        if export_svg && has_output {
            self.export_svg_dialog();
        }
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if let Some(file) = dropped.first() {
            self.load_dropped(ctx, file);
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Upload... (⌘O)").clicked() {
                        self.upload_dialog(ctx);
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(has_output, egui::Button::new("Print to PDF... (⌘P)"))
                        .clicked()
                    {
                        self.export_pdf_dialog();
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(has_output, egui::Button::new("Export SVG... (⌘⇧S)"))
                        .clicked()
                    {
                        self.export_svg_dialog();
                        ui.close_menu();
                    }
                    ui.separator();
                    ui.label("Quick export paths:");
                    ui.small("PDF:");
                    if ui.text_edit_singleline(&mut self.pdf_path).lost_focus() {
                        self.persist_settings();
                    }
                    if ui.button("Print to path").clicked() {
                        self.export_pdf_to_path();
                        ui.close_menu();
                    }
                    ui.small("SVG:");
                    if ui.text_edit_singleline(&mut self.svg_path).lost_focus() {
                        self.persist_settings();
                    }
                    if ui.button("Export to path").clicked() {
                        self.export_svg_to_path();
                        ui.close_menu();
                    }
                });
                ui.menu_button("Help", |ui| {
                    if ui.button("Shortcuts (F1)").clicked() {
                        self.show_help = true;
                        ui.close_menu();
                    }
                    if ui.button("Command palette (⌘⇧P)").clicked() {
                        self.command_palette.open("");
                        ui.close_menu();
                    }
                });
                ui.separator();
                for workflow in Workflow::ALL {
                    if tab_button(ui, workflow.name(), workflow, self.workflow) {
                        self.set_workflow(workflow);
                    }
                }
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(status) = &self.status {
                    ui.label(status);
                } else {
                    ui.label("Ready");
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let ws = self.workspace();
                    if let Some(source) = &ws.source {
                        ui.label(format!("{}×{} px", source.width(), source.height()));
                        ui.separator();
                    }
                    if let Some(selection) = ws.drag.pending() {
                        let [x, y, w, h] = selection.percent();
                        ui.label(format!("Selection: {x:.1}%, {y:.1}% ({w:.1}% × {h:.1}%)"));
                    }
                });
            });
        });

        egui::SidePanel::left("source_panel")
            .resizable(true)
            .default_width(520.0)
            .min_width(280.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if ui.button("Upload image or PDF...").clicked() {
                        self.upload_dialog(ctx);
                    }
                    if let Some(source) = &self.workspace().source {
                        ui.label(&source.name);
                    }
                });
                ui.add_space(4.0);
                let committable = self.workspace().committable().is_some();
                let has_image = self.workspace().has_image();
                ui.horizontal_wrapped(|ui| {
                    for &slot in self.workflow.slots() {
                        if ui
                            .add_enabled(committable, egui::Button::new(commit_label(slot)))
                            .clicked()
                        {
                            self.commit_slot(slot);
                        }
                    }
                    if ui
                        .add_enabled(has_image, egui::Button::new("Clear selections"))
                        .clicked()
                    {
                        self.clear_selections();
                    }
                });
                ui.separator();
                self.workspace_mut().image_ui(ui);
            });

        let layout = self.print_layout();
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading(self.workflow.name());
                ui.separator();
                match self.workflow {
                    Workflow::Card => self.card_outputs_ui(ui),
                    Workflow::Photo => self.photo_outputs_ui(ui),
                }
                ui.add_space(12.0);
                ui.separator();
                self.print_ui(ui, &layout);
            });
        });

        let ws = self.workspace();
        let cx = CommandContext {
            workflow: self.workflow,
            has_image: ws.has_image(),
            committable: ws.committable().is_some(),
            has_output: self.has_output(),
        };
        if let Some(cmd) = self.command_palette.ui(ctx, cx) {
            CommandPalette::execute(self, ctx, cmd);
        }

        super::help::draw_help_window(ctx, &mut self.show_help);
        self.error_modal(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_button_counts_photos() {
        assert_eq!(print_label(Workflow::Photo, 1), "Print 1 Photo");
        assert_eq!(print_label(Workflow::Photo, 6), "Print 6 Photos");
        assert_eq!(print_label(Workflow::Card, 2), "Print (PDF)");
    }

    #[test]
    fn commit_buttons_match_slot_vocabulary() {
        let labels: Vec<_> = Workflow::Card.slots().iter().map(|&s| commit_label(s)).collect();
        assert_eq!(labels, ["Set as Front", "Set as Back"]);
        assert_eq!(commit_label(Workflow::Photo.slots()[0]), "Set Photo Selection");
    }
}

use eframe::egui;
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::model::FramePreset;
use crate::selection::{Slot, Workflow};

use super::PrintApp;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum CommandId {
    Upload,
    SetFront,
    SetBack,
    SetPhoto,
    ClearSelections,
    TabCard,
    TabPhoto,
    PresetPassport,
    PresetJoint,
    PrintPdf,
    ExportSvg,
    Help,
}

pub(super) struct CommandSpec {
    pub id: CommandId,
    pub name: &'static str,
    pub search: &'static str,
}

const COMMANDS: &[CommandSpec] = &[
    CommandSpec { id: CommandId::Upload, name: "File: Upload image or PDF", search: "upload open image pdf file load" },
    CommandSpec { id: CommandId::PrintPdf, name: "File: Print to PDF", search: "print pdf export" },
    CommandSpec { id: CommandId::ExportSvg, name: "File: Export SVG", search: "export svg save" },
    CommandSpec { id: CommandId::SetFront, name: "Selection: Set as Front", search: "set front card commit selection" },
    CommandSpec { id: CommandId::SetBack, name: "Selection: Set as Back", search: "set back card commit selection" },
    CommandSpec { id: CommandId::SetPhoto, name: "Selection: Set Photo", search: "set photo commit selection" },
    CommandSpec { id: CommandId::ClearSelections, name: "Selection: Clear", search: "clear reset selections" },
    CommandSpec { id: CommandId::TabCard, name: "Tab: ID Card", search: "tab card id front back" },
    CommandSpec { id: CommandId::TabPhoto, name: "Tab: Photo", search: "tab photo passport" },
    CommandSpec { id: CommandId::PresetPassport, name: "Photo: Passport (3.5cm × 4.5cm)", search: "photo preset passport size" },
    CommandSpec { id: CommandId::PresetJoint, name: "Photo: Joint (4.5cm × 3.5cm)", search: "photo preset joint landscape size" },
    CommandSpec { id: CommandId::Help, name: "Help: Shortcuts", search: "help shortcuts keys" },
];

#[derive(Default)]
pub(super) struct CommandPalette {
    pub open: bool,
    pub query: String,
    pub selected: usize,
    request_focus: bool,
}

#[derive(Clone, Copy)]
pub(super) struct CommandContext {
    pub workflow: Workflow,
    pub has_image: bool,
    pub committable: bool,
    pub has_output: bool,
}

impl CommandPalette {
    pub fn open(&mut self, query: impl Into<String>) {
        self.open = true;
        self.query = query.into();
        self.selected = 0;
        self.request_focus = true;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.query.clear();
        self.selected = 0;
        self.request_focus = false;
    }

    fn is_enabled(cx: CommandContext, id: CommandId) -> bool {
        match id {
            CommandId::SetFront | CommandId::SetBack => {
                cx.committable && cx.workflow == Workflow::Card
            }
            CommandId::SetPhoto => cx.committable && cx.workflow == Workflow::Photo,
            CommandId::ClearSelections => cx.has_image,
            CommandId::PresetPassport | CommandId::PresetJoint => cx.workflow == Workflow::Photo,
            CommandId::PrintPdf | CommandId::ExportSvg => cx.has_output,
            _ => true,
        }
    }

    pub(super) fn execute(app: &mut PrintApp, ctx: &egui::Context, id: CommandId) {
        match id {
            CommandId::Upload => app.upload_dialog(ctx),
            CommandId::SetFront => app.commit_slot(Slot::Front),
            CommandId::SetBack => app.commit_slot(Slot::Back),
            CommandId::SetPhoto => app.commit_slot(Slot::Photo),
            CommandId::ClearSelections => app.clear_selections(),
            CommandId::TabCard => app.set_workflow(Workflow::Card),
            CommandId::TabPhoto => app.set_workflow(Workflow::Photo),
            CommandId::PresetPassport => app.set_photo_preset(FramePreset::Passport),
            CommandId::PresetJoint => app.set_photo_preset(FramePreset::Joint),
            CommandId::PrintPdf => app.export_pdf_dialog(),
            CommandId::ExportSvg => app.export_svg_dialog(),
            CommandId::Help => app.show_help = true,
        }
        ctx.request_repaint();
    }

    fn filtered(&self) -> Vec<(&'static CommandSpec, i64)> {
        let matcher = SkimMatcherV2::default();
        let q = self.query.trim();
        if q.is_empty() {
            return COMMANDS.iter().map(|c| (c, 0)).collect();
        }
        let mut out = Vec::new();
        for c in COMMANDS {
            if let Some(score) = matcher.fuzzy_match(c.search, q) {
                out.push((c, score));
            }
        }
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.name.cmp(b.0.name)));
        out
    }

    pub fn ui(&mut self, ctx: &egui::Context, cx: CommandContext) -> Option<CommandId> {
        if !self.open {
            return None;
        }
        let matches = self.filtered();
        if self.selected >= matches.len() {
            self.selected = matches.len().saturating_sub(1);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.close();
            return None;
        }
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowDown)) && !matches.is_empty() {
            self.selected = (self.selected + 1).min(matches.len() - 1);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowUp)) && !matches.is_empty() {
            self.selected = self.selected.saturating_sub(1);
        }
        let mut run_selected = ctx.input(|i| i.key_pressed(egui::Key::Enter));

        let screen = ctx.content_rect();
        let width = 460.0;
        let height = 280.0;
        let pos = egui::pos2(screen.center().x - width * 0.5, screen.top() + 48.0);
        egui::Area::new(egui::Id::new("command_palette"))
            .fixed_pos(pos)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                let frame = egui::Frame::new()
                    .fill(egui::Color32::from_rgba_unmultiplied(20, 20, 20, 240))
                    .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(90, 160, 255)))
                    .inner_margin(10.0)
                    .corner_radius(egui::CornerRadius::same(8));
                frame.show(ui, |ui| {
                    ui.set_min_size(egui::vec2(width, height));
                    let resp = ui.add(
                        egui::TextEdit::singleline(&mut self.query)
                            .desired_width(f32::INFINITY)
                            .hint_text("Search commands"),
                    );
                    if self.request_focus {
                        resp.request_focus();
                        self.request_focus = false;
                    }
                    ui.separator();
                    egui::ScrollArea::vertical().max_height(height - 64.0).show(ui, |ui| {
                        for (idx, (spec, _score)) in matches.iter().enumerate() {
                            let enabled = CommandPalette::is_enabled(cx, spec.id);
                            let resp = ui.add_enabled(
                                enabled,
                                egui::Button::new(spec.name).selected(idx == self.selected),
                            );
                            if resp.clicked() {
                                self.selected = idx;
                                run_selected = true;
                            }
                        }
                    });
                });
            });

        if run_selected {
            if let Some((spec, _)) = matches.get(self.selected) {
                if CommandPalette::is_enabled(cx, spec.id) {
                    let cmd = spec.id;
                    self.close();
                    return Some(cmd);
                }
            }
        }
        None
    }
}

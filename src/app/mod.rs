use crate::layout::{self, OutputJob, PageSetup, PrintLayout};
use crate::model::{FramePreset, Selection};
use crate::selection::{DragSelection, SelectionError, SelectionStore, Slot, Workflow};
use crate::source::SourceImage;
use eframe::egui;
use image::imageops::{self, FilterType};

mod actions;
mod command_palette;
mod help;
mod interaction;
mod pdf;
mod render;
mod settings;
mod svg;
mod update;

#[derive(Debug, thiserror::Error)]
pub(super) enum ExportError {
    #[error("Nothing to export: commit a selection first")]
    Empty,

    #[error("Could not encode image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Could not compress image stream: {0}")]
    Compress(#[source] std::io::Error),

    #[error("Write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Size to shrink a `width`×`height` raster to so neither side exceeds `max_side`.
///
/// `None` when it already fits.
fn texture_size(width: u32, height: u32, max_side: usize) -> Option<(u32, u32)> {
    let max_side = u32::try_from(max_side).unwrap_or(u32::MAX).max(1);
    let longest = width.max(height);
    if longest <= max_side {
        return None;
    }
    let scale = max_side as f64 / longest as f64;
    let fit = |v: u32| ((v as f64 * scale).round() as u32).clamp(1, max_side);
    Some((fit(width), fit(height)))
}

/// One selection surface: a source image, its drag state and its committed slots.
///
/// The card and photo tabs are two instances differing only in their workflow.
pub(super) struct Workspace {
    workflow: Workflow,
    source: Option<SourceImage>,
    texture: Option<egui::TextureHandle>,
    drag: DragSelection,
    store: SelectionStore,
}

impl Workspace {
    fn new(workflow: Workflow) -> Self {
        Self {
            workflow,
            source: None,
            texture: None,
            drag: DragSelection::default(),
            store: SelectionStore::new(workflow),
        }
    }

    /// Replaces the source image. Selections made on the previous image are discarded.
    ///
    /// The texture is downscaled to the renderer's size limit; `source` keeps full resolution.
    fn set_source(&mut self, ctx: &egui::Context, source: SourceImage) {
        let max_side = ctx.input(|i| i.max_texture_side);
        let image = match texture_size(source.width(), source.height(), max_side) {
            Some((w, h)) => {
                log::info!(
                    "display texture for {} scaled to {w}×{h}",
                    source.name
                );
                let scaled = imageops::resize(&source.pixels, w, h, FilterType::Triangle);
                egui::ColorImage::from_rgba_unmultiplied([w as usize, h as usize], scaled.as_raw())
            }
            None => {
                let size = [source.width() as usize, source.height() as usize];
                egui::ColorImage::from_rgba_unmultiplied(size, source.pixels.as_raw())
            }
        };
        self.texture = Some(ctx.load_texture(
            format!("source-{}", self.workflow.name()),
            image,
            egui::TextureOptions::LINEAR,
        ));
        self.source = Some(source);
        self.store.clear_all();
        self.drag.reset();
    }

    fn clear_source(&mut self) {
        self.source = None;
        self.texture = None;
        self.store.clear_all();
        self.drag.reset();
    }

    fn has_image(&self) -> bool {
        self.source.is_some()
    }

    /// Pending selection if it could be committed right now.
    fn committable(&self) -> Option<Selection> {
        if !self.has_image() {
            return None;
        }
        self.drag.pending().filter(|s| !s.is_degenerate())
    }

    fn commit(&mut self, slot: Slot) -> Result<Selection, SelectionError> {
        let selection = self.drag.pending().unwrap_or_default();
        self.store.commit(slot, selection)?;
        Ok(selection)
    }
}

pub struct PrintApp {
    workflow: Workflow,
    card: Workspace,
    photo: Workspace,
    photo_preset: FramePreset,
    photo_count: u32,
    page: PageSetup,
    gap_cm: f32,
    pdf_path: String,
    svg_path: String,
    settings_path: String,
    status: Option<String>,
    error: Option<String>,
    command_palette: command_palette::CommandPalette,
    show_help: bool,
}

impl PrintApp {
    fn config_path() -> Option<String> {
        if let Some(home) = std::env::var_os("HOME") {
            let path = std::path::PathBuf::from(home).join(".config").join("sheetcrop.toml");
            if path.exists() {
                return Some(path.display().to_string());
            }
        }
        if std::path::Path::new("settings.toml").exists() {
            return Some("settings.toml".to_string());
        }
        None
    }

    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings_path = Self::config_path().unwrap_or_else(|| "settings.toml".to_string());
        let settings = settings::load_settings(&settings_path)
            .or_else(|| settings::load_settings("settings.json"))
            .unwrap_or_default();
        log::info!("using settings from {settings_path}");
        Self::with_settings(settings, settings_path)
    }

    fn with_settings(settings: settings::AppSettings, settings_path: String) -> Self {
        Self {
            workflow: settings.workflow,
            card: Workspace::new(Workflow::Card),
            photo: Workspace::new(Workflow::Photo),
            photo_preset: settings.photo_preset,
            photo_count: settings.photo_count,
            page: settings.page,
            gap_cm: settings.gap_cm,
            pdf_path: settings.pdf_path,
            svg_path: settings.svg_path,
            settings_path,
            status: None,
            error: None,
            command_palette: command_palette::CommandPalette::default(),
            show_help: false,
        }
    }

    fn workspace(&self) -> &Workspace {
        match self.workflow {
            Workflow::Card => &self.card,
            Workflow::Photo => &self.photo,
        }
    }

    fn workspace_mut(&mut self) -> &mut Workspace {
        match self.workflow {
            Workflow::Card => &mut self.card,
            Workflow::Photo => &mut self.photo,
        }
    }

    /// What the active tab would print: one job per committed slot.
    fn output_jobs(&self) -> Vec<OutputJob> {
        let ws = self.workspace();
        ws.store
            .committed()
            .map(|(slot, selection)| match ws.workflow {
                Workflow::Card => OutputJob {
                    label: slot.name().to_string(),
                    selection,
                    frame: FramePreset::CardFace.frame(),
                    count: 1,
                },
                Workflow::Photo => OutputJob {
                    label: format!("{} photo", self.photo_preset.name()),
                    selection,
                    frame: self.photo_preset.frame(),
                    count: layout::clamp_tile_count(self.photo_count),
                },
            })
            .collect()
    }

    fn print_layout(&self) -> PrintLayout {
        layout::flow_layout(&self.output_jobs(), self.page, self.gap_cm)
    }

    /// Whether the active tab has anything to print or export.
    fn has_output(&self) -> bool {
        self.workspace().has_image() && !self.print_layout().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceKind;
    use image::RgbaImage;

    fn source() -> SourceImage {
        SourceImage {
            name: "test.png".to_string(),
            kind: SourceKind::Image,
            pixels: RgbaImage::new(8, 8),
        }
    }

    fn rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(100.0, 100.0))
    }

    #[test]
    fn new_source_clears_front_and_back() {
        let ctx = egui::Context::default();
        let mut ws = Workspace::new(Workflow::Card);
        ws.set_source(&ctx, source());
        let loaded = ws.has_image();
        ws.drag.press(egui::pos2(10.0, 10.0), rect(), loaded);
        ws.drag.drag_to(egui::pos2(60.0, 90.0), rect());
        ws.drag.release();
        ws.commit(Slot::Front).unwrap();
        ws.commit(Slot::Back).unwrap();
        assert!(ws.store.get(Slot::Front).is_some());

        ws.set_source(&ctx, source());
        assert_eq!(ws.store.get(Slot::Front), None);
        assert_eq!(ws.store.get(Slot::Back), None);
        assert_eq!(ws.drag.pending(), None);
    }

    #[test]
    fn degenerate_pending_is_not_committable() {
        let ctx = egui::Context::default();
        let mut ws = Workspace::new(Workflow::Photo);
        assert_eq!(ws.committable(), None);
        ws.set_source(&ctx, source());
        let loaded = ws.has_image();
        ws.drag.press(egui::pos2(10.0, 10.0), rect(), loaded);
        ws.drag.release();
        assert_eq!(ws.committable(), None);
        assert!(matches!(
            ws.commit(Slot::Photo),
            Err(SelectionError::Degenerate { .. })
        ));
        assert!(ws.store.is_empty());
    }

    fn committed_app(workflow: Workflow) -> PrintApp {
        let ctx = egui::Context::default();
        let mut app = PrintApp::with_settings(
            settings::AppSettings {
                workflow,
                photo_count: 7,
                photo_preset: FramePreset::Joint,
                ..Default::default()
            },
            "unused.toml".to_string(),
        );
        let ws = app.workspace_mut();
        ws.set_source(&ctx, source());
        for &slot in workflow.slots() {
            ws.store.commit(slot, Selection::FULL).unwrap();
        }
        app
    }

    #[test]
    fn photo_jobs_tile_the_chosen_preset() {
        let app = committed_app(Workflow::Photo);
        let jobs = app.output_jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].frame, FramePreset::Joint.frame());
        assert_eq!(jobs[0].count, 7);
        assert_eq!(app.print_layout().frame_count(), 7);
    }

    #[test]
    fn card_jobs_are_front_then_back() {
        let app = committed_app(Workflow::Card);
        let labels: Vec<String> = app.output_jobs().into_iter().map(|j| j.label).collect();
        assert_eq!(labels, vec!["Front".to_string(), "Back".to_string()]);
        let layout = app.print_layout();
        assert_eq!(layout.frame_count(), 2);
        assert_eq!(layout.pages[0][0].width_cm, 8.5);
    }

    #[test]
    fn output_needs_a_committed_selection() {
        let ctx = egui::Context::default();
        let mut app = PrintApp::with_settings(
            settings::AppSettings::default(),
            "unused.toml".to_string(),
        );
        assert!(!app.has_output());
        app.workspace_mut().set_source(&ctx, source());
        assert!(!app.has_output());
        app.workspace_mut()
            .store
            .commit(Slot::Front, Selection::FULL)
            .unwrap();
        assert!(app.has_output());
    }

    #[test]
    fn texture_size_caps_longest_side() {
        assert_eq!(texture_size(1000, 800, 2048), None);
        assert_eq!(texture_size(2048, 10, 2048), None);
        assert_eq!(texture_size(8000, 4000, 2048), Some((2048, 1024)));
        assert_eq!(texture_size(3000, 9000, 1500), Some((500, 1500)));
        assert_eq!(texture_size(10000, 1, 100), Some((100, 1)));
    }

    #[test]
    fn oversized_source_keeps_full_resolution_for_export() {
        let ctx = egui::Context::default();
        let max_side = ctx.input(|i| i.max_texture_side);
        let width = max_side as u32 * 2;
        let mut ws = Workspace::new(Workflow::Photo);
        ws.set_source(
            &ctx,
            SourceImage {
                name: "poster.png".to_string(),
                kind: SourceKind::Image,
                pixels: RgbaImage::new(width, 4),
            },
        );
        let texture = ws.texture.as_ref().unwrap();
        assert_eq!(texture.size(), [max_side, 2]);
        assert_eq!(ws.source.as_ref().unwrap().width(), width);
    }

    #[test]
    fn failed_acquisition_resets_workspace() {
        let ctx = egui::Context::default();
        let mut ws = Workspace::new(Workflow::Photo);
        ws.set_source(&ctx, source());
        ws.store.commit(Slot::Photo, Selection::FULL).unwrap();
        ws.clear_source();
        assert!(!ws.has_image());
        assert!(ws.texture.is_none());
        assert!(ws.store.is_empty());
    }
}

use eframe::egui;
use std::path::{Path, PathBuf};

use crate::layout;
use crate::model::FramePreset;
use crate::selection::{Slot, Workflow};
use crate::source::{self, SourceError, SourceImage};

use super::{ExportError, PrintApp, pdf, settings, svg};

const SOURCE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif", "pdf"];

/// Path of the `index`-th SVG page: the first page keeps `base`, later pages get a `-N` suffix.
pub(super) fn svg_page_path(base: &Path, index: usize) -> PathBuf {
    if index == 0 {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "layout".to_string());
    base.with_file_name(format!("{stem}-{}.svg", index + 1))
}

impl PrintApp {
    pub(super) fn upload_dialog(&mut self, ctx: &egui::Context) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Images and PDF", SOURCE_EXTENSIONS)
            .pick_file()
        {
            let result = source::load_path(&path);
            self.apply_source_result(ctx, result);
        }
    }

    pub(super) fn load_dropped(&mut self, ctx: &egui::Context, file: &egui::DroppedFile) {
        let result = if let Some(path) = &file.path {
            source::load_path(path)
        } else if let Some(bytes) = &file.bytes {
            source::load_bytes(bytes, &file.name)
        } else {
            return;
        };
        self.apply_source_result(ctx, result);
    }

    /// Installs a freshly loaded source on the active tab.
    ///
    /// On failure the tab is left with no image and the error is shown in a modal.
    pub(super) fn apply_source_result(
        &mut self,
        ctx: &egui::Context,
        result: Result<SourceImage, SourceError>,
    ) {
        match result {
            Ok(source) => {
                self.status = Some(format!(
                    "Loaded {} ({}×{})",
                    source.name,
                    source.width(),
                    source.height()
                ));
                self.workspace_mut().set_source(ctx, source);
            }
            Err(e) => {
                log::error!("source acquisition failed: {e}");
                self.workspace_mut().clear_source();
                self.status = None;
                self.error = Some(e.to_string());
            }
        }
    }

    pub(super) fn commit_slot(&mut self, slot: Slot) {
        match self.workspace_mut().commit(slot) {
            Ok(selection) => {
                let [x, y, w, h] = selection.percent();
                log::debug!("committed {slot}: {x:.1}% {y:.1}% {w:.1}% × {h:.1}%");
                self.status = Some(format!("{slot} set ({w:.0}% × {h:.0}%)"));
            }
            Err(e) => {
                log::warn!("commit rejected: {e}");
                self.status = Some(e.to_string());
            }
        }
    }

    pub(super) fn clear_selections(&mut self) {
        let ws = self.workspace_mut();
        ws.store.clear_all();
        ws.drag.reset();
        self.status = Some("Selections cleared".to_string());
    }

    fn export_pdf_to(&self, path: &Path) -> Result<usize, ExportError> {
        let source = self.workspace().source.as_ref().ok_or(ExportError::Empty)?;
        let layout = self.print_layout();
        let bytes = pdf::layout_to_pdf(&layout, source)?;
        std::fs::write(path, bytes)?;
        Ok(layout.frame_count())
    }

    fn export_svg_to(&self, path: &Path) -> Result<Vec<PathBuf>, ExportError> {
        let source = self.workspace().source.as_ref().ok_or(ExportError::Empty)?;
        let layout = self.print_layout();
        if layout.is_empty() {
            return Err(ExportError::Empty);
        }
        let url = svg::source_data_url(source)?;
        let mut written = Vec::new();
        for index in 0..layout.pages.len() {
            let Some(doc) = svg::layout_page_to_svg(&layout, index, &url) else {
                continue;
            };
            let page_path = svg_page_path(path, index);
            std::fs::write(&page_path, doc)?;
            written.push(page_path);
        }
        log::info!("svg export: {} page(s)", written.len());
        Ok(written)
    }

    pub(super) fn export_pdf_to_path(&mut self) {
        let path = PathBuf::from(&self.pdf_path);
        match self.export_pdf_to(&path) {
            Ok(frames) => self.status = Some(format!("Printed {frames} frame(s) to {}", self.pdf_path)),
            Err(e) => {
                log::error!("pdf export failed: {e}");
                self.status = Some(format!("PDF export failed: {e}"));
            }
        }
    }

    pub(super) fn export_pdf_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(&self.pdf_path)
            .add_filter("PDF", &["pdf"])
            .save_file()
        {
            self.pdf_path = path.display().to_string();
            self.persist_settings();
            self.export_pdf_to_path();
        }
    }

    pub(super) fn export_svg_to_path(&mut self) {
        let path = PathBuf::from(&self.svg_path);
        match self.export_svg_to(&path) {
            Ok(written) if written.len() == 1 => {
                self.status = Some(format!("Saved {}", self.svg_path));
            }
            Ok(written) => {
                self.status = Some(format!("Saved {} SVG pages from {}", written.len(), self.svg_path));
            }
            Err(e) => {
                log::error!("svg export failed: {e}");
                self.status = Some(format!("SVG export failed: {e}"));
            }
        }
    }

    pub(super) fn export_svg_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(&self.svg_path)
            .add_filter("SVG", &["svg"])
            .save_file()
        {
            self.svg_path = path.display().to_string();
            self.persist_settings();
            self.export_svg_to_path();
        }
    }

    pub(super) fn settings_snapshot(&self) -> settings::AppSettings {
        settings::AppSettings {
            workflow: self.workflow,
            photo_preset: self.photo_preset,
            photo_count: self.photo_count,
            gap_cm: self.gap_cm,
            pdf_path: self.pdf_path.clone(),
            svg_path: self.svg_path.clone(),
            page: self.page,
        }
    }

    pub(super) fn persist_settings(&mut self) {
        let snapshot = self.settings_snapshot();
        if let Err(e) = settings::save_settings(&self.settings_path, &snapshot) {
            log::warn!("settings save failed: {e}");
            self.status = Some(format!("Settings save failed: {e}"));
        }
    }

    pub(super) fn set_workflow(&mut self, workflow: Workflow) {
        if self.workflow != workflow {
            self.workspace_mut().drag.release();
            self.workflow = workflow;
            self.persist_settings();
        }
    }

    pub(super) fn set_photo_preset(&mut self, preset: FramePreset) {
        if self.photo_preset != preset {
            self.photo_preset = preset;
            self.persist_settings();
        }
    }

    pub(super) fn set_photo_count(&mut self, count: u32) {
        let count = layout::clamp_tile_count(count);
        if self.photo_count != count {
            self.photo_count = count;
            self.persist_settings();
        }
    }
}

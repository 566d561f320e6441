use eframe::egui;

use crate::layout::PrintLayout;
use crate::model::{PhysicalFrame, RenderTransform};
use crate::selection::Workflow;

/// Screen points per centimetre at the 96 DPI CSS reference resolution.
pub(super) const PREVIEW_POINTS_PER_CM: f32 = 96.0 / 2.54;

const UV_FULL: egui::Rect = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
const FRAME_BORDER: egui::Color32 = egui::Color32::from_rgb(153, 153, 153);

pub(super) fn tab_button(ui: &mut egui::Ui, label: &str, workflow: Workflow, active: Workflow) -> bool {
    ui.selectable_label(workflow == active, label).clicked()
}

/// Draws the source through `transform` into a box of the frame's physical size.
///
/// With nothing to show, the box is drawn empty with `placeholder` centred in it.
pub(super) fn draw_frame_preview(
    ui: &mut egui::Ui,
    texture: Option<&egui::TextureHandle>,
    transform: Option<RenderTransform>,
    frame: PhysicalFrame,
    placeholder: &str,
) {
    let size = egui::vec2(
        frame.width_cm() * PREVIEW_POINTS_PER_CM,
        frame.height_cm() * PREVIEW_POINTS_PER_CM,
    );
    let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, egui::Color32::WHITE);

    match (texture, transform) {
        (Some(texture), Some(transform)) if transform.is_finite() => {
            painter.image(texture.id(), transform.place(rect), UV_FULL, egui::Color32::WHITE);
        }
        _ => {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                placeholder,
                egui::FontId::proportional(12.0),
                egui::Color32::GRAY,
            );
        }
    }
    painter.rect_stroke(
        rect,
        0.0,
        egui::Stroke::new(1.0, FRAME_BORDER),
        egui::StrokeKind::Inside,
    );
}

/// Scaled-down drawing of one layout page, fitted to `width` points.
pub(super) fn draw_sheet_preview(
    ui: &mut egui::Ui,
    texture: Option<&egui::TextureHandle>,
    layout: &PrintLayout,
    page_index: usize,
    width: f32,
) {
    let page = layout.page;
    let units_per_cm = width / page.width_cm;
    let size = egui::vec2(width, page.height_cm * units_per_cm);
    let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, egui::Color32::WHITE);
    painter.rect_stroke(
        rect,
        0.0,
        egui::Stroke::new(1.0, egui::Color32::DARK_GRAY),
        egui::StrokeKind::Outside,
    );

    let Some(placements) = layout.pages.get(page_index) else {
        return;
    };
    for placement in placements {
        let frame = placement.rect(units_per_cm).translate(rect.min.to_vec2());
        if let Some(texture) = texture {
            painter.with_clip_rect(frame).image(
                texture.id(),
                placement.transform.place(frame),
                UV_FULL,
                egui::Color32::WHITE,
            );
        }
        painter.rect_stroke(
            frame,
            0.0,
            egui::Stroke::new(0.5, FRAME_BORDER),
            egui::StrokeKind::Middle,
        );
    }
}

use eframe::egui;

use super::Workspace;

const UV_FULL: egui::Rect = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));

/// Largest size that fits `image` inside `available` without upscaling.
pub(super) fn fit_size(image: egui::Vec2, available: egui::Vec2) -> egui::Vec2 {
    if image.x <= 0.0 || image.y <= 0.0 {
        return egui::Vec2::ZERO;
    }
    let scale = (available.x / image.x)
        .min(available.y / image.y)
        .clamp(0.0, 1.0);
    image * scale
}

impl Workspace {
    /// Draws the source image and wires pointer input into the drag selection.
    ///
    /// Presses only start a drag over the image. Moves and the release are read from the
    /// global pointer state, so a drag that leaves the image keeps tracking and still ends.
    pub(super) fn image_ui(&mut self, ui: &mut egui::Ui) {
        let Some(texture) = &self.texture else {
            self.drag.cancel();
            ui.centered_and_justified(|ui| {
                ui.label("Upload an image or PDF, or drop one onto the window");
            });
            return;
        };
        let texture_id = texture.id();
        let size = fit_size(texture.size_vec2(), ui.available_size());
        let (rect, response) = ui.allocate_exact_size(size, egui::Sense::drag());
        let painter = ui.painter_at(rect);
        painter.image(texture_id, rect, UV_FULL, egui::Color32::WHITE);

        let (pressed, down, press_origin, latest) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.press_origin(),
                i.pointer.latest_pos(),
            )
        });
        let loaded = self.has_image();
        if pressed && response.hovered() {
            if let Some(origin) = press_origin {
                self.drag.press(origin, rect, loaded);
            }
        } else if self.drag.is_dragging() {
            if let Some(pos) = latest {
                self.drag.drag_to(pos, rect);
            }
        }
        if self.drag.is_dragging() && !down {
            self.drag.release();
        }
        if response.hovered() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);
        }

        if let Some(selection) = self.drag.pending() {
            let overlay = selection.to_display_rect(rect);
            painter.rect_filled(
                overlay,
                0.0,
                egui::Color32::from_rgba_unmultiplied(90, 160, 255, 40),
            );
            painter.rect_stroke(
                overlay,
                0.0,
                egui::Stroke::new(1.5, egui::Color32::from_rgb(90, 160, 255)),
                egui::StrokeKind::Middle,
            );
        }
    }
}

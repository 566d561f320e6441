use eframe::egui;
use serde::{Deserialize, Serialize};

use crate::model::{PhysicalFrame, RenderTransform, Selection};

pub const MAX_TILE_COUNT: u32 = 50;

/// Crop-and-scale transform that makes `selection` fill its frame.
///
/// The selection must have positive width and height; for a degenerate selection the
/// result is non-finite. Callers only pass committed selections.
pub fn render_transform(selection: Selection) -> RenderTransform {
    RenderTransform {
        offset_x_percent: -(selection.x * 100.0) / selection.width,
        offset_y_percent: -(selection.y * 100.0) / selection.height,
        scale_x_percent: 100.0 / selection.width,
        scale_y_percent: 100.0 / selection.height,
    }
}

/// `count` copies of the same transform, with `count` raised to at least one.
pub fn tile(selection: Selection, _frame: PhysicalFrame, count: u32) -> Vec<RenderTransform> {
    let transform = render_transform(selection);
    vec![transform; count.max(1) as usize]
}

pub fn clamp_tile_count(count: u32) -> u32 {
    count.clamp(1, MAX_TILE_COUNT)
}

/// One selection rendered into `count` frames of the same physical size.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputJob {
    pub label: String,
    pub selection: Selection,
    pub frame: PhysicalFrame,
    pub count: u32,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PageSetup {
    pub width_cm: f32,
    pub height_cm: f32,
    pub margin_cm: f32,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self::A4
    }
}

impl PageSetup {
    pub const A4: Self = Self {
        width_cm: 21.0,
        height_cm: 29.7,
        margin_cm: 0.5,
    };

    fn right(&self) -> f32 {
        self.width_cm - self.margin_cm
    }

    fn bottom(&self) -> f32 {
        self.height_cm - self.margin_cm
    }
}

/// A frame positioned on a page, in centimetres from the page's top-left corner.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    pub label: String,
    pub x_cm: f32,
    pub y_cm: f32,
    pub width_cm: f32,
    pub height_cm: f32,
    pub transform: RenderTransform,
}

impl Placement {
    /// Frame rectangle in an arbitrary unit, given how many of it make up a centimetre.
    pub fn rect(&self, units_per_cm: f32) -> egui::Rect {
        egui::Rect::from_min_size(
            egui::pos2(self.x_cm * units_per_cm, self.y_cm * units_per_cm),
            egui::vec2(self.width_cm * units_per_cm, self.height_cm * units_per_cm),
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrintLayout {
    pub page: PageSetup,
    pub pages: Vec<Vec<Placement>>,
}

impl PrintLayout {
    pub fn frame_count(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }
}

/// Flows every job's frames into rows across pages, in job order, with a fixed gap.
///
/// Rows wrap at the right margin and pages break at the bottom margin. A frame larger
/// than the printable area still starts its own row or page rather than being dropped.
pub fn flow_layout(jobs: &[OutputJob], page: PageSetup, gap_cm: f32) -> PrintLayout {
    let gap = gap_cm.max(0.0);
    let mut pages: Vec<Vec<Placement>> = Vec::new();
    let mut current: Vec<Placement> = Vec::new();
    let mut x = page.margin_cm;
    let mut y = page.margin_cm;
    let mut row_height = 0.0_f32;

    for job in jobs {
        let w = job.frame.width_cm();
        let h = job.frame.height_cm();
        for transform in tile(job.selection, job.frame, job.count) {
            if x > page.margin_cm && x + w > page.right() {
                x = page.margin_cm;
                y += row_height + gap;
                row_height = 0.0;
            }
            if y > page.margin_cm && y + h > page.bottom() {
                pages.push(std::mem::take(&mut current));
                x = page.margin_cm;
                y = page.margin_cm;
                row_height = 0.0;
            }
            current.push(Placement {
                label: job.label.clone(),
                x_cm: x,
                y_cm: y,
                width_cm: w,
                height_cm: h,
                transform,
            });
            x += w + gap;
            row_height = row_height.max(h);
        }
    }
    if !current.is_empty() {
        pages.push(current);
    }
    PrintLayout { page, pages }
}

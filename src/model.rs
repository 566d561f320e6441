use eframe::egui;
use serde::{Deserialize, Serialize};

/// A position expressed as a fraction of the source image's own width and height.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct NormalizedPoint {
    pub x: f32,
    pub y: f32,
}

impl NormalizedPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: clamp_unit(x),
            y: clamp_unit(y),
        }
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Converts a pointer position into image space using the image's displayed rectangle.
///
/// Both arguments must be in the same coordinate space. The pointer may lie outside the
/// rectangle; the result is clamped to the unit square. A rectangle with no area maps
/// every pointer to the origin along that axis instead of producing NaN.
pub fn normalize(pointer: egui::Pos2, displayed: egui::Rect) -> NormalizedPoint {
    let ratio = |p: f32, start: f32, extent: f32| {
        if extent > 0.0 && extent.is_finite() {
            (p - start) / extent
        } else {
            0.0
        }
    };
    NormalizedPoint::new(
        ratio(pointer.x, displayed.min.x, displayed.width()),
        ratio(pointer.y, displayed.min.y, displayed.height()),
    )
}

/// A crop region in normalized image space.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Selection {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Selection {
    pub const FULL: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    /// The zero-area marker shown when a drag begins.
    pub fn at(p: NormalizedPoint) -> Self {
        Self {
            x: p.x,
            y: p.y,
            width: 0.0,
            height: 0.0,
        }
    }

    /// Rectangle spanned by two corners, whichever direction the drag went.
    pub fn from_corners(a: NormalizedPoint, b: NormalizedPoint) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    pub fn is_degenerate(self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Maps the selection onto a displayed image rectangle, e.g. for the overlay.
    pub fn to_display_rect(self, displayed: egui::Rect) -> egui::Rect {
        let min = egui::pos2(
            displayed.min.x + self.x * displayed.width(),
            displayed.min.y + self.y * displayed.height(),
        );
        egui::Rect::from_min_size(
            min,
            egui::vec2(
                self.width * displayed.width(),
                self.height * displayed.height(),
            ),
        )
    }

    /// Selection bounds as `[left, top, width, height]` percentages of the image.
    pub fn percent(self) -> [f32; 4] {
        [
            self.x * 100.0,
            self.y * 100.0,
            self.width * 100.0,
            self.height * 100.0,
        ]
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum PhysicalUnit {
    #[default]
    Centimeter,
    Millimeter,
    Inch,
}

impl PhysicalUnit {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Centimeter => "cm",
            Self::Millimeter => "mm",
            Self::Inch => "in",
        }
    }

    pub fn to_cm(self, value: f32) -> f32 {
        match self {
            Self::Centimeter => value,
            Self::Millimeter => value / 10.0,
            Self::Inch => value * 2.54,
        }
    }
}

pub const POINTS_PER_INCH: f32 = 72.0;
pub const POINTS_PER_CM: f32 = POINTS_PER_INCH / 2.54;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct PhysicalFrame {
    pub width_units: f32,
    pub height_units: f32,
    pub unit: PhysicalUnit,
}

impl PhysicalFrame {
    pub const fn cm(width: f32, height: f32) -> Self {
        Self {
            width_units: width,
            height_units: height,
            unit: PhysicalUnit::Centimeter,
        }
    }

    pub fn width_cm(&self) -> f32 {
        self.unit.to_cm(self.width_units)
    }

    pub fn height_cm(&self) -> f32 {
        self.unit.to_cm(self.height_units)
    }

    pub fn label(&self) -> String {
        let suffix = self.unit.suffix();
        format!(
            "{}{suffix} × {}{suffix}",
            self.width_units, self.height_units
        )
    }
}

/// The closed set of physical output sizes.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum FramePreset {
    #[default]
    Passport,
    Joint,
    CardFace,
}

impl FramePreset {
    pub const PHOTO: [Self; 2] = [Self::Passport, Self::Joint];

    pub fn frame(self) -> PhysicalFrame {
        match self {
            Self::Passport => PhysicalFrame::cm(3.5, 4.5),
            Self::Joint => PhysicalFrame::cm(4.5, 3.5),
            Self::CardFace => PhysicalFrame::cm(8.5, 5.5),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Passport => "Passport",
            Self::Joint => "Joint",
            Self::CardFace => "Card face",
        }
    }

    pub fn describe(self) -> String {
        format!("{} ({})", self.name(), self.frame().label())
    }
}

/// Placement of the whole source image relative to a frame, in percent of the frame box.
///
/// Positioning the image at `offset` with size `scale` and clipping to the frame makes the
/// selection exactly fill the frame, stretched on each axis independently.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RenderTransform {
    pub offset_x_percent: f32,
    pub offset_y_percent: f32,
    pub scale_x_percent: f32,
    pub scale_y_percent: f32,
}

impl RenderTransform {
    /// Rectangle the full image occupies when rendered into `frame`.
    pub fn place(&self, frame: egui::Rect) -> egui::Rect {
        let min = egui::pos2(
            frame.min.x + frame.width() * self.offset_x_percent / 100.0,
            frame.min.y + frame.height() * self.offset_y_percent / 100.0,
        );
        egui::Rect::from_min_size(
            min,
            egui::vec2(
                frame.width() * self.scale_x_percent / 100.0,
                frame.height() * self.scale_y_percent / 100.0,
            ),
        )
    }

    pub fn is_finite(&self) -> bool {
        self.offset_x_percent.is_finite()
            && self.offset_y_percent.is_finite()
            && self.scale_x_percent.is_finite()
            && self.scale_y_percent.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn displayed() -> egui::Rect {
        egui::Rect::from_min_size(egui::pos2(100.0, 50.0), egui::vec2(400.0, 200.0))
    }

    #[test]
    fn normalize_inside_rect() {
        let p = normalize(egui::pos2(200.0, 100.0), displayed());
        assert_eq!(p, NormalizedPoint { x: 0.25, y: 0.25 });
    }

    #[test]
    fn normalize_clamps_outside_rect() {
        let rect = displayed();
        for pointer in [
            egui::pos2(-1000.0, -1000.0),
            egui::pos2(5000.0, 20.0),
            egui::pos2(300.0, 9000.0),
            egui::pos2(99.0, 251.0),
        ] {
            let p = normalize(pointer, rect);
            assert!((0.0..=1.0).contains(&p.x), "{pointer:?} -> {p:?}");
            assert!((0.0..=1.0).contains(&p.y), "{pointer:?} -> {p:?}");
        }
        assert_eq!(
            normalize(egui::pos2(5000.0, -5.0), rect),
            NormalizedPoint { x: 1.0, y: 0.0 }
        );
    }

    #[test]
    fn normalize_uses_image_rect_not_container() {
        // A letterboxed image: the container is larger, but only the image rect matters.
        let image = egui::Rect::from_min_size(egui::pos2(0.0, 100.0), egui::vec2(300.0, 300.0));
        let p = normalize(egui::pos2(150.0, 40.0), image);
        assert_eq!(p, NormalizedPoint { x: 0.5, y: 0.0 });
    }

    #[test]
    fn normalize_zero_sized_rect_is_finite() {
        let empty = egui::Rect::from_min_size(egui::pos2(10.0, 10.0), egui::Vec2::ZERO);
        let p = normalize(egui::pos2(20.0, 30.0), empty);
        assert_eq!(p, NormalizedPoint { x: 0.0, y: 0.0 });
    }

    #[test]
    fn normalize_nan_pointer_is_finite() {
        let p = normalize(egui::pos2(f32::NAN, f32::INFINITY), displayed());
        assert_eq!(p, NormalizedPoint { x: 0.0, y: 1.0 });
    }

    #[test]
    fn from_corners_is_direction_agnostic() {
        let a = NormalizedPoint::new(0.2, 0.3);
        let b = NormalizedPoint::new(0.7, 0.9);
        let expected = Selection {
            x: 0.2,
            y: 0.3,
            width: 0.5,
            height: 0.6,
        };
        let c = NormalizedPoint::new(0.2, 0.9);
        let d = NormalizedPoint::new(0.7, 0.3);
        for (s, e) in [(a, b), (b, a), (c, d), (d, c)] {
            let sel = Selection::from_corners(s, e);
            assert!((sel.x - expected.x).abs() < 1e-6);
            assert!((sel.y - expected.y).abs() < 1e-6);
            assert!((sel.width - expected.width).abs() < 1e-6);
            assert!((sel.height - expected.height).abs() < 1e-6);
        }
    }

    #[test]
    fn degenerate_detection() {
        assert!(Selection::at(NormalizedPoint::new(0.5, 0.5)).is_degenerate());
        assert!(
            Selection {
                x: 0.1,
                y: 0.1,
                width: 0.4,
                height: 0.0
            }
            .is_degenerate()
        );
        assert!(!Selection::FULL.is_degenerate());
    }

    #[test]
    fn presets_match_physical_sizes() {
        assert_eq!(FramePreset::Passport.frame(), PhysicalFrame::cm(3.5, 4.5));
        assert_eq!(FramePreset::Joint.frame(), PhysicalFrame::cm(4.5, 3.5));
        assert_eq!(FramePreset::CardFace.frame(), PhysicalFrame::cm(8.5, 5.5));
        assert_eq!(FramePreset::Passport.describe(), "Passport (3.5cm × 4.5cm)");
    }

    #[test]
    fn units_convert_to_cm() {
        let frame = PhysicalFrame {
            width_units: 35.0,
            height_units: 2.0,
            unit: PhysicalUnit::Millimeter,
        };
        assert!((frame.width_cm() - 3.5).abs() < 1e-6);
        assert!((PhysicalUnit::Inch.to_cm(2.0) - 5.08).abs() < 1e-6);
    }

    #[test]
    fn place_maps_selection_onto_frame() {
        let t = RenderTransform {
            offset_x_percent: -50.0,
            offset_y_percent: -50.0,
            scale_x_percent: 200.0,
            scale_y_percent: 200.0,
        };
        let frame = egui::Rect::from_min_size(egui::pos2(10.0, 20.0), egui::vec2(100.0, 50.0));
        let placed = t.place(frame);
        assert_eq!(placed.min, egui::pos2(-40.0, -5.0));
        assert_eq!(placed.size(), egui::vec2(200.0, 100.0));
    }
}

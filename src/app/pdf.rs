use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref};

use crate::layout::{Placement, PrintLayout};
use crate::model::POINTS_PER_CM;
use crate::source::{SourceImage, over_white};

use super::ExportError;

const SOURCE_NAME: Name<'static> = Name(b"Src");

/// Renders every page of the layout into a PDF sized in points.
///
/// The source raster is embedded once and referenced by each frame, clipped to the frame.
pub(super) fn layout_to_pdf(
    layout: &PrintLayout,
    source: &SourceImage,
) -> Result<Vec<u8>, ExportError> {
    if layout.is_empty() {
        return Err(ExportError::Empty);
    }
    let page_w = layout.page.width_cm * POINTS_PER_CM;
    let page_h = layout.page.height_cm * POINTS_PER_CM;

    let mut alloc = Ref::new(1);
    let catalog_id = alloc.bump();
    let tree_id = alloc.bump();
    let image_id = alloc.bump();
    let page_ids: Vec<(Ref, Ref)> = layout
        .pages
        .iter()
        .map(|_| (alloc.bump(), alloc.bump()))
        .collect();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(tree_id);
    pdf.pages(tree_id)
        .kids(page_ids.iter().map(|(page, _)| *page))
        .count(page_ids.len() as i32);

    let samples = deflate(&rgb_samples(source))?;
    let mut image = pdf.image_xobject(image_id, &samples);
    image.filter(Filter::FlateDecode);
    image.width(source.width() as i32);
    image.height(source.height() as i32);
    image.color_space().device_rgb();
    image.bits_per_component(8);
    image.finish();

    for (placements, (page_id, content_id)) in layout.pages.iter().zip(&page_ids) {
        let mut page = pdf.page(*page_id);
        page.media_box(Rect::new(0.0, 0.0, page_w, page_h));
        page.parent(tree_id);
        page.contents(*content_id);
        page.resources().x_objects().pair(SOURCE_NAME, image_id);
        page.finish();

        let content = page_content(placements, page_h);
        pdf.stream(*content_id, &content.finish());
    }

    log::info!(
        "pdf export: {} page(s), {} frame(s)",
        layout.pages.len(),
        layout.frame_count()
    );
    Ok(pdf.finish())
}

fn page_content(placements: &[Placement], page_h: f32) -> Content {
    let mut content = Content::new();
    for p in placements {
        // Layout rects grow downwards from the top-left; PDF user space grows upwards.
        let frame = p.rect(POINTS_PER_CM);
        let image = p.transform.place(frame);

        content.save_state();
        content.rect(frame.min.x, page_h - frame.max.y, frame.width(), frame.height());
        content.clip_nonzero();
        content.end_path();
        content.transform([
            image.width(),
            0.0,
            0.0,
            image.height(),
            image.min.x,
            page_h - image.max.y,
        ]);
        content.x_object(SOURCE_NAME);
        content.restore_state();

        content.save_state();
        content.set_stroke_gray(0.6);
        content.set_line_width(0.5);
        content.rect(frame.min.x, page_h - frame.max.y, frame.width(), frame.height());
        content.stroke();
        content.restore_state();
    }
    content
}

fn rgb_samples(source: &SourceImage) -> Vec<u8> {
    let mut out = Vec::with_capacity(source.width() as usize * source.height() as usize * 3);
    for px in source.pixels.pixels() {
        let [r, g, b, a] = px.0;
        out.extend_from_slice(&over_white([r, g, b], a));
    }
    out
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, ExportError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(ExportError::Compress)?;
    encoder.finish().map_err(ExportError::Compress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{OutputJob, PageSetup, flow_layout};
    use crate::model::{FramePreset, Selection};
    use crate::source::SourceKind;
    use hayro::RenderSettings;
    use hayro::hayro_interpret::InterpreterSettings;
    use image::RgbaImage;

    fn red_source() -> SourceImage {
        SourceImage {
            name: "red.png".to_string(),
            kind: SourceKind::Image,
            pixels: RgbaImage::from_pixel(4, 4, image::Rgba([220, 0, 0, 255])),
        }
    }

    fn photo_layout(count: u32) -> PrintLayout {
        let job = OutputJob {
            label: "Passport photo".to_string(),
            selection: Selection::FULL,
            frame: FramePreset::Passport.frame(),
            count,
        };
        flow_layout(&[job], PageSetup::A4, 0.2)
    }

    #[test]
    fn empty_layout_is_refused() {
        let layout = flow_layout(&[], PageSetup::A4, 0.2);
        assert!(matches!(
            layout_to_pdf(&layout, &red_source()),
            Err(ExportError::Empty)
        ));
    }

    #[test]
    fn one_pdf_page_per_layout_page() {
        let layout = photo_layout(40);
        let bytes = layout_to_pdf(&layout, &red_source()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        let pdf = hayro::hayro_syntax::Pdf::new(std::sync::Arc::new(bytes)).expect("exported PDF should parse");
        assert_eq!(pdf.pages().len(), 2);
    }

    #[test]
    fn frames_render_source_pixels_at_physical_position() {
        let layout = photo_layout(1);
        let bytes = layout_to_pdf(&layout, &red_source()).unwrap();
        let pdf = hayro::hayro_syntax::Pdf::new(std::sync::Arc::new(bytes)).unwrap();
        let page = pdf.pages().get(0).unwrap();
        let pixmap = hayro::render(page, &InterpreterSettings::default(), &RenderSettings::default());
        let width = usize::from(pixmap.width());
        let pixels = pixmap.take_unpremultiplied();

        // Frame centre: 0.5cm margin + half of 3.5cm across, half of 4.5cm down.
        let cx = ((0.5 + 1.75) * POINTS_PER_CM) as usize;
        let cy = ((0.5 + 2.25) * POINTS_PER_CM) as usize;
        let inside = pixels[cy * width + cx];
        assert!(inside.r > 180 && inside.g < 60 && inside.b < 60, "{inside:?}");

        let outside = pixels[(cy + 300) * width + cx + 300];
        assert!(outside.a == 0 || (outside.r > 200 && outside.g > 200));
    }

    /// Left quarter green; the rest red above the middle and blue below.
    fn quadrant_source() -> SourceImage {
        let pixels = RgbaImage::from_fn(8, 8, |x, y| match (x, y) {
            (0..2, _) => image::Rgba([0, 200, 0, 255]),
            (_, 0..4) => image::Rgba([220, 0, 0, 255]),
            _ => image::Rgba([0, 0, 220, 255]),
        });
        SourceImage {
            name: "quadrants.png".to_string(),
            kind: SourceKind::Image,
            pixels,
        }
    }

    #[test]
    fn cropped_regions_keep_their_orientation() {
        let crops = [
            ("top", Selection { x: 0.5, y: 0.0, width: 0.5, height: 0.5 }),
            ("bottom", Selection { x: 0.5, y: 0.5, width: 0.5, height: 0.5 }),
            ("left", Selection { x: 0.0, y: 0.0, width: 0.25, height: 1.0 }),
        ];
        let jobs: Vec<OutputJob> = crops
            .iter()
            .map(|(label, selection)| OutputJob {
                label: label.to_string(),
                selection: *selection,
                frame: FramePreset::Passport.frame(),
                count: 1,
            })
            .collect();
        let layout = flow_layout(&jobs, PageSetup::A4, 0.2);
        assert_eq!(layout.pages.len(), 1);

        let bytes = layout_to_pdf(&layout, &quadrant_source()).unwrap();
        let pdf = hayro::hayro_syntax::Pdf::new(std::sync::Arc::new(bytes)).unwrap();
        let page = pdf.pages().get(0).unwrap();
        let pixmap = hayro::render(page, &InterpreterSettings::default(), &RenderSettings::default());
        let width = usize::from(pixmap.width());
        let pixels = pixmap.take_unpremultiplied();

        let expected = [[220, 0, 0], [0, 0, 220], [0, 200, 0]];
        for (placement, rgb) in layout.pages[0].iter().zip(expected) {
            let centre = placement.rect(POINTS_PER_CM).center();
            let px = pixels[centre.y as usize * width + centre.x as usize];
            let got = [px.r, px.g, px.b];
            for (g, e) in got.iter().zip(rgb) {
                assert!(
                    g.abs_diff(e) < 40,
                    "{}: expected {rgb:?}, got {got:?}",
                    placement.label
                );
            }
        }
    }

    #[test]
    fn compression_failure_has_its_own_message() {
        let err = ExportError::Compress(std::io::Error::other("zlib stream error"));
        assert_eq!(
            err.to_string(),
            "Could not compress image stream: zlib stream error"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn alpha_is_flattened_onto_white() {
        let source = SourceImage {
            name: "clear.png".to_string(),
            kind: SourceKind::Image,
            pixels: RgbaImage::from_pixel(1, 2, image::Rgba([0, 0, 0, 0])),
        };
        assert_eq!(rgb_samples(&source), vec![255; 6]);
    }
}

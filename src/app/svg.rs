use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;

use crate::layout::PrintLayout;
use crate::source::SourceImage;

use super::ExportError;

const MM_PER_CM: f32 = 10.0;

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

pub(super) fn source_data_url(source: &SourceImage) -> Result<String, ExportError> {
    let mut png = Vec::new();
    source
        .pixels
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

/// One page of the layout as a standalone SVG sized in centimetres.
///
/// Coordinates inside the document are millimetres. The source image is declared once
/// as a unit square and stretched into each frame with a matrix, under the frame's clip.
pub(super) fn layout_page_to_svg(
    layout: &PrintLayout,
    page_index: usize,
    data_url: &str,
) -> Option<String> {
    let placements = layout.pages.get(page_index)?;
    let page = layout.page;
    let mut out = String::new();
    out.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{}cm" height="{}cm" viewBox="0 0 {:.3} {:.3}">"#,
        page.width_cm,
        page.height_cm,
        page.width_cm * MM_PER_CM,
        page.height_cm * MM_PER_CM
    ));
    out.push('\n');
    out.push_str("<defs>\n");
    out.push_str(&format!(
        r#"<image id="source" x="0" y="0" width="1" height="1" preserveAspectRatio="none" href="{url}" xlink:href="{url}" />"#,
        url = data_url
    ));
    out.push('\n');
    for (i, p) in placements.iter().enumerate() {
        let frame = p.rect(MM_PER_CM);
        out.push_str(&format!(
            r#"<clipPath id="frame-{}"><rect x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}" /></clipPath>"#,
            i,
            frame.min.x,
            frame.min.y,
            frame.width(),
            frame.height()
        ));
        out.push('\n');
    }
    out.push_str("</defs>\n");
    out.push_str(r#"<rect width="100%" height="100%" fill="white" />"#);
    out.push('\n');

    for (i, p) in placements.iter().enumerate() {
        let frame = p.rect(MM_PER_CM);
        let image = p.transform.place(frame);
        out.push_str(&format!(
            r##"<g clip-path="url(#frame-{})"><title>{}</title><use href="#source" xlink:href="#source" transform="matrix({:.4} 0 0 {:.4} {:.4} {:.4})" /></g>"##,
            i,
            escape_xml(&p.label),
            image.width(),
            image.height(),
            image.min.x,
            image.min.y
        ));
        out.push('\n');
        out.push_str(&format!(
            r#"<rect x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}" fill="none" stroke="rgb(153,153,153)" stroke-width="0.2" />"#,
            frame.min.x,
            frame.min.y,
            frame.width(),
            frame.height()
        ));
        out.push('\n');
    }

    out.push_str("</svg>\n");
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{OutputJob, PageSetup, flow_layout};
    use crate::model::{FramePreset, Selection};
    use crate::source::SourceKind;
    use image::RgbaImage;

    fn card_layout() -> PrintLayout {
        let selection = Selection {
            x: 0.25,
            y: 0.25,
            width: 0.5,
            height: 0.5,
        };
        let jobs = ["Front", "Back & more"].map(|label| OutputJob {
            label: label.to_string(),
            selection,
            frame: FramePreset::CardFace.frame(),
            count: 1,
        });
        flow_layout(&jobs, PageSetup::A4, 0.2)
    }

    #[test]
    fn page_is_sized_in_centimetres() {
        let svg = layout_page_to_svg(&card_layout(), 0, "data:,").unwrap();
        assert!(svg.contains(r#"width="21cm" height="29.7cm" viewBox="0 0 210.000 297.000""#));
        assert_eq!(svg.matches("<use ").count(), 2);
        assert_eq!(svg.matches("<clipPath ").count(), 2);
    }

    #[test]
    fn frames_are_clipped_and_scaled_by_transform() {
        let svg = layout_page_to_svg(&card_layout(), 0, "data:,").unwrap();
        // Front frame sits at the 5mm margin, 85mm × 55mm.
        assert!(svg.contains(
            r#"<rect x="5.000" y="5.000" width="85.000" height="55.000" />"#
        ));
        // The image is doubled and shifted back by half a frame.
        assert!(svg.contains("matrix(170.0000 0 0 110.0000 -37.5000 -22.5000)"));
    }

    #[test]
    fn labels_are_escaped() {
        let svg = layout_page_to_svg(&card_layout(), 0, "data:,").unwrap();
        assert!(svg.contains("<title>Back &amp; more</title>"));
    }

    #[test]
    fn missing_page_is_none() {
        assert!(layout_page_to_svg(&card_layout(), 3, "data:,").is_none());
    }

    #[test]
    fn data_url_embeds_png() {
        let source = SourceImage {
            name: "s.png".to_string(),
            kind: SourceKind::Image,
            pixels: RgbaImage::new(2, 2),
        };
        let url = source_data_url(&source).unwrap();
        assert!(url.starts_with("data:image/png;base64,iVBORw0KGgo"));
    }
}

use std::path::Path;

use hayro::RenderSettings;
use hayro::hayro_interpret::InterpreterSettings;
use hayro::hayro_syntax::Pdf;
use image::RgbaImage;

/// PDF pages are rasterized at twice their point size.
pub const PDF_RENDER_SCALE: f32 = 2.0;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is neither an image nor a PDF")]
    Unsupported(String),

    #[error("Could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Could not parse PDF: {0}")]
    PdfParse(String),

    #[error("PDF has no pages")]
    PdfEmpty,

    #[error("PDF page rendered to an empty image")]
    PdfRender,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Image,
    Pdf,
}

/// A single raster the user selects regions from.
#[derive(Clone, Debug)]
pub struct SourceImage {
    pub name: String,
    pub kind: SourceKind,
    pub pixels: RgbaImage,
}

impl SourceImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

pub fn load_path(path: &Path) -> Result<SourceImage, SourceError> {
    let bytes = std::fs::read(path).map_err(|source| SourceError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    load_bytes(&bytes, &name)
}

pub fn load_bytes(bytes: &[u8], name: &str) -> Result<SourceImage, SourceError> {
    let (kind, pixels) = if is_pdf(bytes, name) {
        (SourceKind::Pdf, rasterize_first_page(bytes)?)
    } else {
        if image::guess_format(bytes).is_err() {
            return Err(SourceError::Unsupported(name.to_string()));
        }
        (SourceKind::Image, image::load_from_memory(bytes)?.to_rgba8())
    };
    log::info!(
        "loaded {name} ({kind:?}, {}×{})",
        pixels.width(),
        pixels.height()
    );
    Ok(SourceImage {
        name: name.to_string(),
        kind,
        pixels,
    })
}

fn is_pdf(bytes: &[u8], name: &str) -> bool {
    bytes.starts_with(b"%PDF-") || name.to_ascii_lowercase().ends_with(".pdf")
}

fn rasterize_first_page(bytes: &[u8]) -> Result<RgbaImage, SourceError> {
    let pdf = Pdf::new(std::sync::Arc::new(bytes.to_vec())).map_err(|e| SourceError::PdfParse(format!("{e:?}")))?;
    let pages = pdf.pages();
    let page = pages.get(0).ok_or(SourceError::PdfEmpty)?;

    let render_settings = RenderSettings {
        x_scale: PDF_RENDER_SCALE,
        y_scale: PDF_RENDER_SCALE,
        ..Default::default()
    };
    let pixmap = hayro::render(page, &InterpreterSettings::default(), &render_settings);
    let (width, height) = (u32::from(pixmap.width()), u32::from(pixmap.height()));
    if width == 0 || height == 0 {
        return Err(SourceError::PdfRender);
    }

    let mut raw = Vec::with_capacity(width as usize * height as usize * 4);
    for px in pixmap.take_unpremultiplied() {
        let [r, g, b] = over_white([px.r, px.g, px.b], px.a);
        raw.extend_from_slice(&[r, g, b, 255]);
    }
    RgbaImage::from_raw(width, height, raw).ok_or(SourceError::PdfRender)
}

/// Flattens an unpremultiplied colour onto a white page.
pub fn over_white(rgb: [u8; 3], alpha: u8) -> [u8; 3] {
    let a = u32::from(alpha);
    rgb.map(|c| ((u32::from(c) * a + 255 * (255 - a) + 127) / 255) as u8)
}

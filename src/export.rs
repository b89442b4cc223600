//! # PDF Export Engine
//!
//! Turns a session surface into a single-page PDF:
//!
//! 1. Flatten the RGBA surface onto white and downscale by
//!    [`ExportConfig::scale`].
//! 2. Recompress as JPEG at [`ExportConfig::quality`].
//! 3. Embed the JPEG as the only XObject of a page whose MediaBox is the
//!    raster size in pixels, drawn at the origin over the whole page.
//!
//! Downscaling and lossy recompression trade fidelity for file size on
//! purpose; set `scale = 1.0` and `quality = 1.0` for a near-lossless copy.

use image::{
    DynamicImage, RgbImage, RgbaImage, codecs::jpeg::JpegEncoder, imageops::FilterType,
};
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref};
use std::io::{Cursor, Write};
use std::str::FromStr;
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::error::EaselError;

/// Export raster policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportConfig {
    /// Linear downscale factor in (0, 1]. Default 0.5.
    pub scale: f32,
    /// Lossy recompression quality in [0, 1]. Default 0.6.
    pub quality: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: 0.5,
            quality: 0.6,
        }
    }
}

impl ExportConfig {
    pub fn validate(&self) -> Result<(), EaselError> {
        if !(self.scale > 0.0 && self.scale <= 1.0) {
            return Err(EaselError::validation(format!(
                "Export scale must be in (0, 1], got {}",
                self.scale
            )));
        }
        if !(0.0..=1.0).contains(&self.quality) {
            return Err(EaselError::validation(format!(
                "Export quality must be in [0, 1], got {}",
                self.quality
            )));
        }
        Ok(())
    }

    /// Export raster dimensions for a surface of `width` x `height`.
    pub fn export_size(&self, width: u32, height: u32) -> (u32, u32) {
        let scaled = |v: u32| ((v as f32 * self.scale).floor() as u32).max(1);
        (scaled(width), scaled(height))
    }

    /// JPEG quality on the encoder's 1..=100 scale.
    pub fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// A finished export, ready to stream.
#[derive(Debug, Clone)]
pub struct ExportedPdf {
    pub filename: String,
    /// Page size in PDF units (one per export raster pixel).
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

/// Container the exported document is delivered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Pdf,
    /// The PDF as the only entry of a zip archive.
    Zip,
}

impl FromStr for ExportFormat {
    type Err = EaselError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "pdf" => Ok(ExportFormat::Pdf),
            "zip" => Ok(ExportFormat::Zip),
            other => Err(EaselError::validation(format!(
                "Unknown export format '{}' (expected pdf or zip)",
                other
            ))),
        }
    }
}

/// A file ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportedPdf {
    /// Package the document in the requested container.
    pub fn into_file(self, format: ExportFormat) -> Result<ExportedFile, EaselError> {
        match format {
            ExportFormat::Pdf => Ok(ExportedFile {
                filename: self.filename,
                content_type: "application/pdf",
                bytes: self.bytes,
            }),
            ExportFormat::Zip => {
                let bytes = zip_pdf(&self.filename, &self.bytes)?;
                let stem = self.filename.trim_end_matches(".pdf");
                Ok(ExportedFile {
                    filename: format!("{}.zip", stem),
                    content_type: "application/zip",
                    bytes,
                })
            }
        }
    }
}

/// Deflated zip archive holding `bytes` under `name`.
pub fn zip_pdf(name: &str, bytes: &[u8]) -> Result<Vec<u8>, EaselError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    writer.start_file(name, options).map_err(zip_error)?;
    writer.write_all(bytes).map_err(zip_error)?;
    let cursor = writer.finish().map_err(zip_error)?;
    Ok(cursor.into_inner())
}

fn zip_error(e: impl std::fmt::Display) -> EaselError {
    EaselError::Export(format!("Zip packaging failed: {}", e))
}

/// Flatten onto white and downscale.
pub fn export_raster(surface: &RgbaImage, config: &ExportConfig) -> RgbImage {
    let mut flat = RgbImage::new(surface.width(), surface.height());
    for (src, dst) in surface.pixels().zip(flat.pixels_mut()) {
        let [r, g, b, a] = src.0;
        let alpha = a as u32;
        let over_white = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        dst.0 = [over_white(r), over_white(g), over_white(b)];
    }

    let (width, height) = config.export_size(surface.width(), surface.height());
    if (width, height) == flat.dimensions() {
        return flat;
    }
    DynamicImage::ImageRgb8(flat)
        .resize_exact(width, height, FilterType::Triangle)
        .to_rgb8()
}

pub fn encode_jpeg(raster: &RgbImage, quality: u8) -> Result<Vec<u8>, EaselError> {
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality)
        .encode_image(raster)
        .map_err(|e| EaselError::Export(format!("JPEG encoding failed: {}", e)))?;
    Ok(jpeg)
}

/// Write a one-page PDF showing a JPEG at full page size.
pub fn write_pdf(jpeg: &[u8], width: u32, height: u32) -> Vec<u8> {
    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let page_id = Ref::new(3);
    let image_id = Ref::new(4);
    let content_id = Ref::new(5);
    let image_name = Name(b"Im1");

    let (w, h) = (width as f32, height as f32);
    let mut pdf = Pdf::new();

    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);

    let mut page = pdf.page(page_id);
    page.media_box(Rect::new(0.0, 0.0, w, h));
    page.parent(page_tree_id);
    page.contents(content_id);
    page.resources().x_objects().pair(image_name, image_id);
    page.finish();

    let mut image = pdf.image_xobject(image_id, jpeg);
    image.filter(Filter::DctDecode);
    image.width(width as i32);
    image.height(height as i32);
    image.color_space().device_rgb();
    image.bits_per_component(8);
    image.finish();

    // Image space is the unit square; scale it to cover the page.
    let mut content = Content::new();
    content.save_state();
    content.transform([w, 0.0, 0.0, h, 0.0, 0.0]);
    content.x_object(image_name);
    content.restore_state();
    pdf.stream(content_id, &content.finish());

    pdf.finish()
}

/// `canvas_<id>.pdf`, with anything outside `[A-Za-z0-9_-]` in the id
/// replaced so the name is safe inside a Content-Disposition header.
pub fn export_filename(id: &str) -> String {
    let safe: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("canvas_{}.pdf", safe)
}

/// Full pipeline: surface → export raster → JPEG → PDF.
pub fn render_pdf(
    id: &str,
    surface: &RgbaImage,
    config: &ExportConfig,
) -> Result<ExportedPdf, EaselError> {
    let raster = export_raster(surface, config);
    let jpeg = encode_jpeg(&raster, config.jpeg_quality())?;
    let (width, height) = raster.dimensions();

    Ok(ExportedPdf {
        filename: export_filename(id),
        width,
        height,
        bytes: write_pdf(&jpeg, width, height),
    })
}

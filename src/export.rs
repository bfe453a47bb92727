//! Export capture: rasterize a settled instance and deliver the encoded
//! file, or pack the labeled summary document.
//!
//! The capture container is display-toggled for measurement only; whatever
//! the capture outcome, it is re-hidden before returning. Rasterization and
//! delivery sit behind traits so the pipeline can be exercised without a
//! real renderer or filesystem.

use std::path::PathBuf;

use image::RgbaImage;

use crate::compositor::TemplateInstance;
use crate::error::{Error, Result};
use crate::record::ListingRecord;
use crate::{ExportFormat, StudioConfig, SUMMARY_FILENAME};

/// Options handed to the rasterizer for one capture
#[derive(Debug, Clone)]
pub struct RasterOptions {
    /// Device-pixel-ratio multiplier; exports render at container size times
    /// this factor
    pub pixel_ratio: u32,
    /// Page background behind the instance (exports flatten over white)
    pub background: image::Rgba<u8>,
}

/// Renders a settled instance into a bitmap
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, instance: &TemplateInstance, opts: &RasterOptions) -> Result<RgbaImage>;
}

/// Default rasterizer: a page of the capture container's size at the
/// configured ratio, filled with the background, with the composited
/// drawing surface drawn in. Text layers are not rendered; the surface is
/// what the capture certifies.
pub struct CanvasRasterizer;

impl Rasterizer for CanvasRasterizer {
    fn rasterize(&self, instance: &TemplateInstance, opts: &RasterOptions) -> Result<RgbaImage> {
        let container = instance
            .dom
            .capture_container()
            .ok_or(Error::ContainerMissing)?;
        let (w, h) = instance
            .dom
            .box_size(container)
            .or_else(|| {
                instance
                    .canvas
                    .as_ref()
                    .map(|c| (c.width() as f64, c.height() as f64))
            })
            .ok_or(Error::NotRendered)?;
        if w < 1.0 || h < 1.0 {
            return Err(Error::NotRendered);
        }

        let ratio = opts.pixel_ratio.max(1);
        let page_w = (w.round() as u32) * ratio;
        let page_h = (h.round() as u32) * ratio;
        let mut page = RgbaImage::from_pixel(page_w, page_h, opts.background);

        if let Some(canvas) = &instance.canvas {
            let scaled = image::imageops::resize(
                canvas.pixels(),
                canvas.width() * ratio,
                canvas.height() * ratio,
                image::imageops::FilterType::Lanczos3,
            );
            image::imageops::overlay(&mut page, &scaled, 0, 0);
        }
        Ok(page)
    }
}

/// Encode a captured page in the variant's export format
pub fn encode_raster(page: &RgbaImage, format: ExportFormat, jpeg_quality: u8) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    match format {
        ExportFormat::Png => {
            let mut cursor = std::io::Cursor::new(&mut out);
            image::DynamicImage::ImageRgba8(page.clone())
                .write_to(&mut cursor, image::ImageFormat::Png)
                .map_err(|e| Error::RasterError(format!("png encode: {}", e)))?;
        }
        ExportFormat::Jpeg => {
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, jpeg_quality);
            image::DynamicImage::ImageRgba8(page.clone())
                .to_rgb8()
                .write_with_encoder(encoder)
                .map_err(|e| Error::RasterError(format!("jpeg encode: {}", e)))?;
        }
    }
    Ok(out)
}

/// Receives finished export files
pub trait DownloadSink: Send + Sync {
    fn deliver(&self, filename: &str, mime: &str, bytes: &[u8]) -> Result<()>;
}

/// Writes exports into a directory, creating it on first use
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DownloadSink for FileSink {
    fn deliver(&self, filename: &str, _mime: &str, bytes: &[u8]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| Error::ExportError(format!("{}: {}", self.dir.display(), e)))?;
        let path = self.dir.join(filename);
        std::fs::write(&path, bytes)
            .map_err(|e| Error::ExportError(format!("{}: {}", path.display(), e)))?;
        log::info!("exported {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

/// Packs the labeled summary fields into a document
pub trait DocumentPacker: Send + Sync {
    fn pack(&self, fields: &[(String, String)]) -> Result<Vec<u8>>;

    /// Fixed delivery filename
    fn filename(&self) -> &str {
        SUMMARY_FILENAME
    }

    fn mime(&self) -> &str {
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    }
}

/// Plain-text packer: one `Label: value` line per field, blank line between
pub struct SummaryPacker;

impl DocumentPacker for SummaryPacker {
    fn pack(&self, fields: &[(String, String)]) -> Result<Vec<u8>> {
        let mut doc = String::new();
        for (label, value) in fields {
            doc.push_str(label);
            doc.push_str(": ");
            doc.push_str(value);
            doc.push_str("\n\n");
        }
        Ok(doc.into_bytes())
    }
}

/// Outcome of one delivered export
#[derive(Debug, Clone)]
pub struct ExportReceipt {
    pub filename: String,
    pub mime: String,
    pub bytes: usize,
}

fn force_visible(instance: &mut TemplateInstance, container: usize) {
    let dom = &mut instance.dom;
    dom.set_style(container, "display", "block");
    dom.set_style(container, "visibility", "visible");
    dom.set_style(container, "opacity", "1");
    dom.set_style(container, "position", "static");
}

fn re_hide(instance: &mut TemplateInstance, container: usize) {
    instance.dom.set_style(container, "display", "none");
}

/// Capture and deliver one settled instance.
///
/// A missing capture container is a hard error here, unlike during
/// composition. The container is forced visible for the capture and
/// re-hidden afterwards, on both the success and the failure path.
pub fn export_instance(
    instance: &mut TemplateInstance,
    config: &StudioConfig,
    rasterizer: &dyn Rasterizer,
    sink: &dyn DownloadSink,
) -> Result<ExportReceipt> {
    let container = instance
        .dom
        .capture_container()
        .ok_or(Error::ContainerMissing)?;
    let spec = instance.variant.spec();

    force_visible(instance, container);
    let result = (|| {
        let opts = RasterOptions {
            pixel_ratio: config.pixel_ratio,
            background: image::Rgba([255, 255, 255, 255]),
        };
        let page = rasterizer.rasterize(instance, &opts)?;
        let encoded = encode_raster(&page, spec.format, config.jpeg_quality)?;
        sink.deliver(spec.filename, spec.mime, &encoded)?;
        Ok(ExportReceipt {
            filename: spec.filename.to_string(),
            mime: spec.mime.to_string(),
            bytes: encoded.len(),
        })
    })();
    re_hide(instance, container);
    result
}

/// Pack and deliver the summary document. Bypasses rasterization entirely,
/// so it works even when no template instance exists.
pub fn export_summary(
    record: &ListingRecord,
    raw_date: &str,
    raw_time: &str,
    packer: &dyn DocumentPacker,
    sink: &dyn DownloadSink,
) -> Result<ExportReceipt> {
    let fields = record.summary_fields(raw_date, raw_time);
    let bytes = packer.pack(&fields)?;
    sink.deliver(packer.filename(), packer.mime(), &bytes)?;
    Ok(ExportReceipt {
        filename: packer.filename().to_string(),
        mime: packer.mime().to_string(),
        bytes: bytes.len(),
    })
}

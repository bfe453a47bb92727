//! Property-photo normalization: decode, enforce the upload ceiling,
//! downsample into the bounding box, re-encode as a transport-friendly JPEG.
//!
//! Every failure path degrades to an empty result so the pipeline continues
//! without a photo instead of aborting; only the size ceiling surfaces a
//! user-facing warning.

use crate::ImageLimits;
use base64::Engine as _;
use image::imageops::FilterType;

/// A decoded, bounded, re-encoded property photo
#[derive(Debug, Clone)]
pub struct NormalizedPhoto {
    /// JPEG bytes at the configured re-encode quality
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl NormalizedPhoto {
    /// Data URL form used for placeholder substitution
    pub fn data_url(&self) -> String {
        format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }

    /// Decode the normalized JPEG back into a bitmap for compositing
    pub fn decode(&self) -> Option<image::DynamicImage> {
        image::load_from_memory(&self.data).ok()
    }
}

/// Outcome of a normalization attempt. `photo` is `None` when no usable
/// bitmap was produced; `warning` carries the single user-facing message
/// for validation-level degradations.
#[derive(Debug, Default)]
pub struct PhotoOutcome {
    pub photo: Option<NormalizedPhoto>,
    pub warning: Option<String>,
}

impl PhotoOutcome {
    fn empty() -> Self {
        Self::default()
    }
}

/// Normalize an uploaded photo.
///
/// - no input: empty result, no warning
/// - input over `limits.max_bytes`: empty result plus one warning
/// - decode failure: empty result, no warning
/// - otherwise: uniform downscale by `min(maxW/w, maxH/h, 1)` (never
///   upscaled), rounded dimensions, JPEG re-encode at `limits.quality`
pub fn normalize_photo(input: Option<&[u8]>, limits: &ImageLimits) -> PhotoOutcome {
    let bytes = match input {
        Some(b) if !b.is_empty() => b,
        _ => return PhotoOutcome::empty(),
    };

    if bytes.len() as u64 > limits.max_bytes {
        let warning = format!(
            "Please upload an image under {}MB.",
            limits.max_bytes / (1024 * 1024)
        );
        log::warn!("property photo rejected: {} bytes over ceiling", bytes.len());
        return PhotoOutcome {
            photo: None,
            warning: Some(warning),
        };
    }

    let decoded = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(e) => {
            log::debug!("property photo decode failed: {}", e);
            return PhotoOutcome::empty();
        }
    };

    let (src_w, src_h) = (decoded.width(), decoded.height());
    if src_w == 0 || src_h == 0 {
        return PhotoOutcome::empty();
    }

    let scale = (limits.max_width as f64 / src_w as f64)
        .min(limits.max_height as f64 / src_h as f64)
        .min(1.0);
    let out_w = ((src_w as f64 * scale).round() as u32).max(1);
    let out_h = ((src_h as f64 * scale).round() as u32).max(1);

    let resized = if (out_w, out_h) == (src_w, src_h) {
        decoded
    } else {
        decoded.resize_exact(out_w, out_h, FilterType::Lanczos3)
    };

    let mut data = Vec::new();
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut data, limits.quality);
    if let Err(e) = resized.to_rgb8().write_with_encoder(encoder) {
        log::debug!("property photo re-encode failed: {}", e);
        return PhotoOutcome::empty();
    }

    PhotoOutcome {
        photo: Some(NormalizedPhoto {
            data,
            width: out_w,
            height: out_h,
        }),
        warning: None,
    }
}

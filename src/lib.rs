//! Propkit — headless marketing-asset compositor for property listings
//!
//! A form snapshot goes in; a settled template instance comes out, exported
//! as an encoded image or a labeled summary document.
//!
//! # Pipeline
//!
//! - **Collect**: resolve the broker, format the auction date, normalize the
//!   uploaded photo into a bounded JPEG
//! - **Compose**: fetch the variant's template, substitute `{{tokens}}`,
//!   apply broker overrides, cover-fit the photo onto the embedded drawing
//!   surface (plus the social overlay)
//! - **Settle**: wait for images, fit text into its boxes, tick settle
//!   frames, reach `Ready`
//! - **Export**: rasterize at 2× over white and deliver the file, or pack
//!   the labeled summary document
//!
//! # Example
//!
//! ```no_run
//! use propkit::assets::FileAssets;
//! use propkit::compositor::FileTemplates;
//! use propkit::export::{CanvasRasterizer, FileSink, SummaryPacker};
//! use propkit::sync::Pipeline;
//! use propkit::{FormSnapshot, StudioConfig, TemplateVariant};
//!
//! # fn main() -> propkit::Result<()> {
//! let mut pipeline = Pipeline::new(
//!     StudioConfig::default(),
//!     Box::new(FileTemplates::new(".")),
//!     Box::new(FileAssets::new(".")),
//!     Box::new(CanvasRasterizer),
//!     Box::new(FileSink::new("out")),
//!     Box::new(SummaryPacker),
//! );
//!
//! let form = FormSnapshot {
//!     headline: "SHOWHOUSE".into(),
//!     city: "Sandton".into(),
//!     broker: "alex-krause".into(),
//!     date: "2025-03-15".into(),
//!     time: "14:00".into(),
//!     ..Default::default()
//! };
//! let receipt = pipeline.export(TemplateVariant::Social, &form)?;
//! println!("wrote {}", receipt.filename);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod assets;
pub mod broker;
pub mod compose;
pub mod compositor;
pub mod datefmt;
pub mod dom;
pub mod export;
pub mod normalize;
pub mod record;
pub mod studio;
pub mod sync;

pub use record::{FormSnapshot, ListingRecord};
pub use studio::Studio;

/// Ceilings applied to an uploaded property photo
#[derive(Debug, Clone)]
pub struct ImageLimits {
    /// Maximum bounding-box width after downsampling
    pub max_width: u32,
    /// Maximum bounding-box height after downsampling
    pub max_height: u32,
    /// JPEG re-encode quality (0-100)
    pub quality: u8,
    /// Upload size ceiling in bytes; larger files are rejected with a warning
    pub max_bytes: u64,
}

impl Default for ImageLimits {
    fn default() -> Self {
        Self {
            max_width: 2200,
            max_height: 2200,
            quality: 90,
            max_bytes: 8 * 1024 * 1024,
        }
    }
}

/// Geometry and blending for the social variant's decorative overlay.
///
/// All values are in design units relative to `reference_width`; the draw
/// scales them by `surface_width / reference_width`. Historical revisions
/// disagreed on the reference and nudge values, so everything is a field
/// here rather than a constant.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    pub reference_width: f64,
    pub tag_width: f64,
    pub tag_height: f64,
    pub base_x: f64,
    pub base_y: f64,
    /// Manual nudge, + right / + down
    pub nudge_x: f64,
    pub nudge_y: f64,
    /// Global alpha for the overlay draw
    pub alpha: f64,
    /// Asset path of the overlay bitmap
    pub asset_path: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            reference_width: 1130.0,
            tag_width: 490.0,
            tag_height: 462.0,
            base_x: 678.0,
            base_y: 0.0,
            nudge_x: 60.0,
            nudge_y: 0.0,
            alpha: 0.96,
            asset_path: "assets/red-tag.png".to_string(),
        }
    }
}

/// Fit-to-box text sizing bounds
#[derive(Debug, Clone)]
pub struct TextFitConfig {
    pub max_font: u32,
    pub min_font: u32,
    /// Interior padding allowance subtracted from each box dimension
    pub padding: f64,
}

impl Default for TextFitConfig {
    fn default() -> Self {
        Self {
            max_font: 200,
            min_font: 5,
            padding: 20.0,
        }
    }
}

/// Configuration for one studio/pipeline instance
///
/// The defaults are the production values; everything a template variant
/// does not fix per-variant is tunable here.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub image_limits: ImageLimits,
    pub overlay: OverlayConfig,
    pub text_fit: TextFitConfig,
    /// Bounded wait for the capture container during composition (ms)
    pub compose_wait_ms: u64,
    /// Bounded wait for the capture container during export (ms)
    pub export_wait_ms: u64,
    /// Settle ticks after composition
    pub settle_frames_compose: u32,
    /// Settle ticks before capture
    pub settle_frames_export: u32,
    /// Device-pixel-ratio multiplier handed to the rasterizer
    pub pixel_ratio: u32,
    /// Quality for JPEG exports (0-100)
    pub jpeg_quality: u8,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            image_limits: ImageLimits::default(),
            overlay: OverlayConfig::default(),
            text_fit: TextFitConfig::default(),
            compose_wait_ms: 4000,
            export_wait_ms: 6000,
            settle_frames_compose: 3,
            settle_frames_export: 4,
            pixel_ratio: 2,
            jpeg_quality: 92,
        }
    }
}

/// The three template variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateVariant {
    Social,
    Newsletter,
    Flyer,
}

/// Image format of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Jpeg,
    Png,
}

/// Static description of one template variant: where its document lives,
/// which elements the pipeline touches, and how its export is delivered.
#[derive(Debug)]
pub struct VariantSpec {
    pub name: &'static str,
    pub template_path: &'static str,
    pub target_id: &'static str,
    pub filename: &'static str,
    pub mime: &'static str,
    pub format: ExportFormat,
    /// Id of the embedded drawing surface
    pub canvas_id: &'static str,
    /// Container ids enumerated for fit-to-box sizing
    pub fit_boxes: &'static [&'static str],
    /// Whether the decorative overlay is drawn after the photo
    pub has_overlay: bool,
    /// Class of the contact block replaced with the broker's details
    pub contact_block_class: Option<&'static str>,
    /// Class of the broker image element swapped per broker
    pub broker_image_class: Option<&'static str>,
    /// Per-broker asset file name for the image swap
    pub broker_asset: Option<&'static str>,
}

const SOCIAL: VariantSpec = VariantSpec {
    name: "social",
    template_path: "templates/social.html",
    target_id: "social-preview",
    filename: "social.jpg",
    mime: "image/jpeg",
    format: ExportFormat::Jpeg,
    canvas_id: "social-property-canvas",
    fit_boxes: &[
        "textbox_1_Red_Tag",
        "textbox_2_Red_Tag",
        "textbox_Red_Rectangle",
        "textbox_Header_2",
    ],
    has_overlay: true,
    contact_block_class: Some("textbox_Contact_Details"),
    broker_image_class: None,
    broker_asset: None,
};

const NEWSLETTER: VariantSpec = VariantSpec {
    name: "newsletter",
    template_path: "templates/newsletter.html",
    target_id: "newsletter-preview",
    filename: "newsletter.png",
    mime: "image/png",
    format: ExportFormat::Png,
    canvas_id: "property-canvas",
    fit_boxes: &[
        "textbox_1_Red_Tag",
        "textbox_2_Red_Tag",
        "textbox_Property_Heading",
    ],
    has_overlay: false,
    contact_block_class: Some("textbox_Contact_Details"),
    broker_image_class: Some("overlay-image_Broker_Photo"),
    broker_asset: Some("broker-photo.png"),
};

const FLYER: VariantSpec = VariantSpec {
    name: "flyer",
    template_path: "templates/flyer.html",
    target_id: "flyer-preview",
    filename: "flyer.jpg",
    mime: "image/jpeg",
    format: ExportFormat::Jpeg,
    canvas_id: "flyer-property-canvas",
    fit_boxes: &[
        "textbox_1_Red_Banner",
        "textbox_2_Red_Banner",
        "textbox_Feature_1",
        "textbox_Feature_2",
        "textbox_Feature_3",
        "textbox_1_Blue_Overlay",
        "textbox_2_Blue_Overlay",
        "textbox_3_Blue_Overlay",
        "DATE",
        "ADDRESS",
    ],
    has_overlay: false,
    contact_block_class: None,
    broker_image_class: Some("overlay-image_broker-phone"),
    broker_asset: Some("broker-phone.png"),
};

impl TemplateVariant {
    pub const ALL: [TemplateVariant; 3] = [
        TemplateVariant::Social,
        TemplateVariant::Newsletter,
        TemplateVariant::Flyer,
    ];

    pub fn spec(&self) -> &'static VariantSpec {
        match self {
            TemplateVariant::Social => &SOCIAL,
            TemplateVariant::Newsletter => &NEWSLETTER,
            TemplateVariant::Flyer => &FLYER,
        }
    }

    pub fn name(&self) -> &'static str {
        self.spec().name
    }

    /// Parse a variant name (as the CLI and UI surfaces use them)
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "social" => Some(TemplateVariant::Social),
            "newsletter" => Some(TemplateVariant::Newsletter),
            "flyer" => Some(TemplateVariant::Flyer),
            _ => None,
        }
    }
}

/// Fixed filename of the text-summary export
pub const SUMMARY_FILENAME: &str = "Property_Summary.docx";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_production_values() {
        let cfg = StudioConfig::default();
        assert_eq!(cfg.image_limits.max_width, 2200);
        assert_eq!(cfg.image_limits.max_bytes, 8 * 1024 * 1024);
        assert_eq!(cfg.pixel_ratio, 2);
        assert_eq!(cfg.jpeg_quality, 92);
        assert_eq!(cfg.settle_frames_compose, 3);
        assert_eq!(cfg.settle_frames_export, 4);
    }

    #[test]
    fn overlay_defaults_use_the_1130_reference() {
        let o = OverlayConfig::default();
        assert_eq!(o.reference_width, 1130.0);
        assert_eq!(o.base_x + o.nudge_x, 738.0);
        assert!(o.alpha > 0.9 && o.alpha < 1.0);
    }

    #[test]
    fn variant_specs_are_consistent() {
        for v in TemplateVariant::ALL {
            let s = v.spec();
            assert!(s.filename.ends_with(if s.format == ExportFormat::Png { ".png" } else { ".jpg" }));
            assert!(!s.fit_boxes.is_empty());
            assert_eq!(TemplateVariant::parse(s.name), Some(v));
            // Broker image swap always names its per-broker asset
            assert_eq!(s.broker_image_class.is_some(), s.broker_asset.is_some());
        }
        assert!(TemplateVariant::parse("brochure").is_none());
    }
}

//! Template fetch, placeholder substitution and surface compositing.
//!
//! A template variant is fetched as raw HTML, `{{token}}` placeholders are
//! substituted from the listing record, broker-specific elements are
//! overridden, and the embedded drawing surface is composited from the
//! normalized photo. The result is a `TemplateInstance` the synchronizer
//! settles and the exporter captures.

use std::path::PathBuf;

use crate::assets::{self, AssetLoader};
use crate::broker;
use crate::compose::canvas::{composite_photo, draw_overlay};
use crate::compose::Canvas;
use crate::dom::TemplateDom;
use crate::error::{Error, Result};
use crate::record::ListingRecord;
use crate::sync::Phase;
use crate::{OverlayConfig, TemplateVariant, VariantSpec};

/// Fetches template documents by path
pub trait TemplateSource: Send + Sync {
    fn fetch(&self, path: &str) -> Result<String>;
}

/// Reads templates relative to a base directory
pub struct FileTemplates {
    base: PathBuf,
}

impl FileTemplates {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl TemplateSource for FileTemplates {
    fn fetch(&self, path: &str) -> Result<String> {
        let full = self.base.join(path);
        std::fs::read_to_string(&full)
            .map_err(|e| Error::TemplateLoad(format!("{}: {}", full.display(), e)))
    }
}

/// Fetches templates over HTTP, resolving paths against a base URL
#[cfg(feature = "remote")]
pub struct HttpTemplates {
    client: reqwest::blocking::Client,
    base: url::Url,
}

#[cfg(feature = "remote")]
impl HttpTemplates {
    pub fn new(base: &str, timeout_ms: u64) -> Result<Self> {
        let base = url::Url::parse(base)
            .map_err(|e| Error::ConfigError(format!("bad template base url: {}", e)))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, base })
    }
}

#[cfg(feature = "remote")]
impl TemplateSource for HttpTemplates {
    fn fetch(&self, path: &str) -> Result<String> {
        let url = self
            .base
            .join(path)
            .map_err(|e| Error::TemplateLoad(format!("{}: {}", path, e)))?;
        let resp = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| Error::TemplateLoad(format!("{}: {}", url, e)))?;
        if !resp.status().is_success() {
            return Err(Error::TemplateLoad(format!("{} ({})", url, resp.status())));
        }
        resp.text()
            .map_err(|e| Error::TemplateLoad(format!("{}: {}", url, e)))
    }
}

/// One populated, parsed template ready to settle and capture
#[derive(Debug, Clone)]
pub struct TemplateInstance {
    pub variant: TemplateVariant,
    /// Substituted document text
    pub html: String,
    pub dom: TemplateDom,
    /// The composited drawing surface; `None` when the template has no
    /// surface or no photo was supplied
    pub canvas: Option<Canvas>,
    pub phase: Phase,
}

/// Replace every known `{{token}}` with its record value. Tokens the record
/// does not define stay in the text untouched.
pub fn substitute(template: &str, record: &ListingRecord) -> String {
    let mut out = template.to_string();
    for (token, value) in record.fields() {
        let needle = format!("{{{{{}}}}}", token);
        if out.contains(&needle) {
            out = out.replace(&needle, value);
        }
    }
    out
}

fn descendant_spans(dom: &TemplateDom, idx: usize) -> Vec<usize> {
    (idx + 1..dom.elements.len())
        .filter(|&i| {
            if dom.elements[i].tag != "span" {
                return false;
            }
            let mut cur = i;
            while let Some(p) = dom.elements[cur].parent {
                if p == idx {
                    return true;
                }
                cur = p;
            }
            false
        })
        .collect()
}

/// Apply the variant's broker-specific overrides: rewrite the contact block
/// with the resolved broker's details (name uppercased) and swap the broker
/// image for the per-broker asset, falling back to the shared one when the
/// broker has none.
pub fn apply_broker_overrides(
    dom: &mut TemplateDom,
    spec: &VariantSpec,
    record: &ListingRecord,
    loader: &dyn AssetLoader,
) {
    if let Some(class) = spec.contact_block_class {
        if let Some(block) = dom.find_by_class(class) {
            let lines = [
                record.broker_name.to_uppercase(),
                record.broker_phone.clone(),
                record.broker_email.clone(),
            ];
            let spans = descendant_spans(dom, block);
            if spans.len() >= lines.len() {
                for (span, line) in spans.into_iter().zip(lines.iter()) {
                    dom.set_text(span, line);
                }
            } else {
                dom.set_text(block, &lines.join(" | "));
            }
        }
    }

    if let (Some(class), Some(asset)) = (spec.broker_image_class, spec.broker_asset) {
        if let Some(img) = dom.find_by_class(class) {
            let primary = broker::broker_asset_path(&record.broker_id, asset);
            let fallback = broker::fallback_asset_path(asset);
            let src = assets::path_with_fallback(loader, &primary, &fallback);
            dom.set_attr(img, "src", &src);
        }
    }
}

/// Composite the variant's drawing surface from the normalized photo.
///
/// Absent surface or absent photo is a silent no-op (`None`); templates
/// without a canvas and records without an upload both keep working. The
/// social overlay is drawn after the photo; a missing overlay asset is
/// skipped, never fatal.
pub fn composite_surface(
    dom: &TemplateDom,
    spec: &VariantSpec,
    record: &ListingRecord,
    overlay_cfg: &OverlayConfig,
    loader: &dyn AssetLoader,
) -> Option<Canvas> {
    let idx = dom.find_by_id(spec.canvas_id)?;
    let (w, h) = dom.box_size(idx)?;
    if w < 1.0 || h < 1.0 {
        return None;
    }
    let photo = record.photo.as_ref()?.decode()?;

    let mut canvas = Canvas::new(w.round() as u32, h.round() as u32);
    composite_photo(&mut canvas, &photo);

    if spec.has_overlay {
        match loader.load(&overlay_cfg.asset_path) {
            Ok(bytes) => match image::load_from_memory(&bytes) {
                Ok(overlay) => draw_overlay(&mut canvas, &overlay, overlay_cfg),
                Err(e) => log::debug!("overlay decode failed, skipping: {}", e),
            },
            Err(e) => log::debug!("overlay asset unavailable, skipping: {}", e),
        }
    }

    Some(canvas)
}

/// Fetch, substitute and parse one variant's template. The returned instance
/// is still unsettled (`Phase::Substituted`).
pub fn build_instance(
    variant: TemplateVariant,
    source: &dyn TemplateSource,
    record: &ListingRecord,
) -> Result<TemplateInstance> {
    let spec = variant.spec();
    let template = source.fetch(spec.template_path)?;
    let html = substitute(&template, record);
    let dom = TemplateDom::parse(&html);
    if dom.capture_container().is_none() {
        return Err(Error::TargetMissing(spec.target_id.to_string()));
    }
    Ok(TemplateInstance {
        variant,
        html,
        dom,
        canvas: None,
        phase: Phase::Substituted,
    })
}

//! Asset loading behind a trait seam.
//!
//! Templates reference broker photos, phone-number images and the social
//! overlay by relative path. The pipeline only needs "give me the bytes or
//! tell me you can't"; file-backed and HTTP-backed loaders are provided,
//! plus data-URL decoding for inlined bitmaps.

use base64::Engine as _;
use std::path::PathBuf;

use crate::dom::TemplateDom;
use crate::error::{Error, Result};

/// Fetches asset bytes by (usually relative) path
pub trait AssetLoader: Send + Sync {
    fn load(&self, path: &str) -> Result<Vec<u8>>;
}

/// Decode a `data:<mime>;base64,<payload>` URL into raw bytes
pub fn decode_data_url(url: &str) -> Option<Vec<u8>> {
    let rest = url.strip_prefix("data:")?;
    let (_, payload) = rest.split_once(";base64,")?;
    base64::engine::general_purpose::STANDARD.decode(payload).ok()
}

/// Loads assets relative to a base directory
pub struct FileAssets {
    base: PathBuf,
}

impl FileAssets {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl AssetLoader for FileAssets {
    fn load(&self, path: &str) -> Result<Vec<u8>> {
        if let Some(bytes) = decode_data_url(path) {
            return Ok(bytes);
        }
        let full = self.base.join(path);
        std::fs::read(&full).map_err(|e| Error::AssetError(format!("{}: {}", full.display(), e)))
    }
}

/// Loads assets over HTTP, resolving relative paths against a base URL
/// the way a page would.
#[cfg(feature = "remote")]
pub struct HttpAssets {
    client: reqwest::blocking::Client,
    base: url::Url,
}

#[cfg(feature = "remote")]
impl HttpAssets {
    pub fn new(base: &str, timeout_ms: u64) -> Result<Self> {
        let base = url::Url::parse(base)
            .map_err(|e| Error::ConfigError(format!("bad asset base url: {}", e)))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, base })
    }
}

#[cfg(feature = "remote")]
impl AssetLoader for HttpAssets {
    fn load(&self, path: &str) -> Result<Vec<u8>> {
        if let Some(bytes) = decode_data_url(path) {
            return Ok(bytes);
        }
        let url = self
            .base
            .join(path)
            .map_err(|e| Error::AssetError(format!("{}: {}", path, e)))?;
        let resp = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| Error::AssetError(format!("{}: {}", url, e)))?;
        if !resp.status().is_success() {
            return Err(Error::AssetError(format!("{} ({})", url, resp.status())));
        }
        resp.bytes()
            .map(|b| b.to_vec())
            .map_err(|e| Error::AssetError(format!("{}: {}", url, e)))
    }
}

/// Pick the primary asset path when it loads, otherwise the fallback.
/// Mirrors an `onerror`-swap: the fallback is used without surfacing an
/// error, and its own failure is tolerated too.
pub fn path_with_fallback(loader: &dyn AssetLoader, primary: &str, fallback: &str) -> String {
    match loader.load(primary) {
        Ok(_) => primary.to_string(),
        Err(e) => {
            log::debug!("asset fallback for {}: {}", primary, e);
            fallback.to_string()
        }
    }
}

/// Settle every `img` element: attempt each load, counting both success and
/// failure as settled so a broken image never blocks the pipeline. Returns
/// (settled, failed) counts; settled always equals the image count.
pub fn settle_images(dom: &TemplateDom, loader: &dyn AssetLoader) -> (usize, usize) {
    let mut settled = 0usize;
    let mut failed = 0usize;
    for (_, src) in dom.images() {
        if src.is_empty() {
            settled += 1;
            failed += 1;
            continue;
        }
        match loader.load(&src) {
            Ok(_) => settled += 1,
            Err(e) => {
                log::debug!("image settled with load error {}: {}", src, e);
                settled += 1;
                failed += 1;
            }
        }
    }
    (settled, failed)
}

//! Drawing-surface compositing and text fitting.

pub mod canvas;
pub mod textfit;

use sha2::{Digest, Sha256};

/// An RGBA drawing surface embedded in a template instance.
#[derive(Debug, Clone)]
pub struct Canvas {
    pixels: image::RgbaImage,
}

impl Canvas {
    /// A transparent surface of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: image::RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 0, 0])),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &image::RgbaImage {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut image::RgbaImage {
        &mut self.pixels
    }

    /// Reset every pixel to transparent
    pub fn clear(&mut self) {
        for p in self.pixels.pixels_mut() {
            *p = image::Rgba([0, 0, 0, 0]);
        }
    }

    /// True when no pixel has been drawn yet
    pub fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|p| p.0[3] == 0)
    }

    /// Content-addressed digest of the raw pixels, for golden tests and
    /// determinism checks.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.pixels.as_raw());
        hex::encode(hasher.finalize())
    }
}

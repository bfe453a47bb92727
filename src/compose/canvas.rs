//! Cover-fit photo compositing and the decorative overlay draw.
//!
//! One parameterized implementation serves all template variants: the photo
//! is scaled so it fully covers the surface (cropping any overflow,
//! centered), and the social variant's overlay bitmap is drawn on top with
//! partial transparency at a position and size expressed in design units
//! relative to a fixed reference width.

use image::imageops::FilterType;
use image::DynamicImage;

use super::Canvas;
use crate::OverlayConfig;

/// Cover-fit transform: scale and top-left offsets for drawing a
/// `src_w × src_h` bitmap onto a `surface_w × surface_h` surface.
/// `scale = max(W/w, H/h)`; offsets center the scaled bitmap and may be
/// negative (crop).
pub fn cover_fit(surface_w: f64, surface_h: f64, src_w: f64, src_h: f64) -> (f64, f64, f64) {
    let scale = (surface_w / src_w).max(surface_h / src_h);
    let x = (surface_w - src_w * scale) / 2.0;
    let y = (surface_h - src_h * scale) / 2.0;
    (scale, x, y)
}

/// Clear the surface and draw the photo with the cover-fit transform.
pub fn composite_photo(canvas: &mut Canvas, photo: &DynamicImage) {
    let (sw, sh) = (canvas.width() as f64, canvas.height() as f64);
    let (pw, ph) = (photo.width() as f64, photo.height() as f64);
    if pw <= 0.0 || ph <= 0.0 || sw <= 0.0 || sh <= 0.0 {
        return;
    }
    let (scale, x, y) = cover_fit(sw, sh, pw, ph);
    let draw_w = ((pw * scale).round() as u32).max(1);
    let draw_h = ((ph * scale).round() as u32).max(1);

    let scaled = photo.resize_exact(draw_w, draw_h, FilterType::Lanczos3).to_rgba8();
    canvas.clear();
    image::imageops::overlay(canvas.pixels_mut(), &scaled, x.round() as i64, y.round() as i64);
}

/// Draw the decorative overlay after the photo, source-over with the
/// configured global alpha. Geometry scales linearly by
/// `surface_width / reference_width`.
pub fn draw_overlay(canvas: &mut Canvas, overlay: &DynamicImage, cfg: &OverlayConfig) {
    if canvas.width() == 0 || cfg.reference_width <= 0.0 {
        return;
    }
    let factor = canvas.width() as f64 / cfg.reference_width;
    let draw_w = ((cfg.tag_width * factor).round() as u32).max(1);
    let draw_h = ((cfg.tag_height * factor).round() as u32).max(1);
    let dst_x = ((cfg.base_x + cfg.nudge_x) * factor).round() as i64;
    let dst_y = ((cfg.base_y + cfg.nudge_y) * factor).round() as i64;

    let scaled = overlay.resize_exact(draw_w, draw_h, FilterType::Lanczos3).to_rgba8();
    let alpha = cfg.alpha.clamp(0.0, 1.0);

    let surface = canvas.pixels_mut();
    let (cw, ch) = (surface.width() as i64, surface.height() as i64);
    for (ox, oy, px) in scaled.enumerate_pixels() {
        let tx = dst_x + ox as i64;
        let ty = dst_y + oy as i64;
        if tx < 0 || ty < 0 || tx >= cw || ty >= ch {
            continue;
        }
        let src_a = (px.0[3] as f64 / 255.0) * alpha;
        if src_a <= 0.0 {
            continue;
        }
        let dst = surface.get_pixel_mut(tx as u32, ty as u32);
        let dst_a = dst.0[3] as f64 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        if out_a <= 0.0 {
            continue;
        }
        for c in 0..3 {
            let s = px.0[c] as f64;
            let d = dst.0[c] as f64;
            dst.0[c] = (((s * src_a) + d * dst_a * (1.0 - src_a)) / out_a).round() as u8;
        }
        dst.0[3] = (out_a * 255.0).round() as u8;
    }
}

//! Fit-to-box text sizing.
//!
//! Each template variant enumerates the textboxes whose single text run must
//! shrink until it fits the box interior (box minus a fixed padding
//! allowance per dimension). Measurement goes through a probe trait so the
//! same metrics apply to every box; the default probe uses the fixed-ratio
//! character-cell estimate the heuristic renderer uses elsewhere.

use crate::dom::TemplateDom;
use crate::TextFitConfig;

/// Measures a text run at a candidate font size.
///
/// Implementations must be deterministic: the same text and size always
/// measure the same, which is what makes the sizing pass idempotent.
pub trait TextMeasurer {
    /// Rendered (width, height) of `text` at `font_size`
    fn measure(&self, text: &str, font_size: f64) -> (f64, f64);
}

/// Fixed-ratio probe: average glyph width as a fraction of the font size,
/// line height likewise. Good enough for box-fitting when every box uses
/// the same family.
#[derive(Debug, Clone)]
pub struct HeuristicMeasurer {
    pub char_width_ratio: f64,
    pub line_height_ratio: f64,
}

impl Default for HeuristicMeasurer {
    fn default() -> Self {
        Self {
            char_width_ratio: 0.6,
            line_height_ratio: 1.2,
        }
    }
}

impl TextMeasurer for HeuristicMeasurer {
    fn measure(&self, text: &str, font_size: f64) -> (f64, f64) {
        let mut max_chars = 0usize;
        let mut lines = 0usize;
        for line in text.lines() {
            lines += 1;
            max_chars = max_chars.max(line.chars().count());
        }
        if lines == 0 {
            lines = 1;
        }
        (
            max_chars as f64 * font_size * self.char_width_ratio,
            lines as f64 * font_size * self.line_height_ratio,
        )
    }
}

/// Decrement from the maximum font size until the run fits `max_w × max_h`,
/// or the floor is reached.
pub fn fit_font_size(
    text: &str,
    max_w: f64,
    max_h: f64,
    cfg: &TextFitConfig,
    measurer: &dyn TextMeasurer,
) -> u32 {
    let mut size = cfg.max_font;
    while size > cfg.min_font {
        let (w, h) = measurer.measure(text, size as f64);
        if w <= max_w && h <= max_h {
            break;
        }
        size -= 1;
    }
    size
}

/// Run the sizer over every enumerated container present in the instance.
/// Containers missing from the document, without a span, or without a
/// usable box size are skipped silently. Returns the ids that were sized.
pub fn run_text_fit(
    dom: &mut TemplateDom,
    container_ids: &[&str],
    cfg: &TextFitConfig,
    measurer: &dyn TextMeasurer,
) -> Vec<String> {
    let mut sized = Vec::new();
    for &id in container_ids {
        let Some(container) = dom.find_by_id(id) else {
            continue;
        };
        let Some(span) = dom.descendant_by_tag(container, "span") else {
            continue;
        };
        let Some((box_w, box_h)) = dom.box_size(container) else {
            continue;
        };
        let text = dom.elements[span].text.clone();
        let max_w = box_w - cfg.padding;
        let max_h = box_h - cfg.padding;
        let size = fit_font_size(&text, max_w, max_h, cfg, measurer);
        dom.set_style(span, "font-size", &format!("{}px", size));
        sized.push(id.to_string());
    }
    sized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> TextFitConfig {
        TextFitConfig::default()
    }

    #[test]
    fn short_text_in_a_big_box_keeps_the_maximum() {
        let m = HeuristicMeasurer::default();
        let size = fit_font_size("HI", 10_000.0, 10_000.0, &cfg(), &m);
        assert_eq!(size, cfg().max_font);
    }

    #[test]
    fn long_text_shrinks_until_it_fits() {
        let m = HeuristicMeasurer::default();
        let size = fit_font_size("PRIME AUCTION OPPORTUNITY", 380.0, 70.0, &cfg(), &m);
        assert!(size < cfg().max_font);
        let (w, h) = m.measure("PRIME AUCTION OPPORTUNITY", size as f64);
        assert!(w <= 380.0 && h <= 70.0);
        // One step larger would not fit
        let (w, h) = m.measure("PRIME AUCTION OPPORTUNITY", (size + 1) as f64);
        assert!(w > 380.0 || h > 70.0);
    }

    #[test]
    fn floor_is_respected_for_impossible_boxes() {
        let m = HeuristicMeasurer::default();
        let size = fit_font_size(&"X".repeat(500), 30.0, 10.0, &cfg(), &m);
        assert_eq!(size, cfg().min_font);
    }

    #[test]
    fn sizing_is_idempotent() {
        let m = HeuristicMeasurer::default();
        let first = fit_font_size("OPEN HOUSE SATURDAY", 300.0, 60.0, &cfg(), &m);
        let second = fit_font_size("OPEN HOUSE SATURDAY", 300.0, 60.0, &cfg(), &m);
        assert_eq!(first, second);
    }

    #[test]
    fn run_skips_absent_containers_silently() {
        let mut dom = TemplateDom::parse(
            r#"<div id="textbox_Header_2" style="width: 300px; height: 60px"><span>ON AUCTION IN SANDTON</span></div>"#,
        );
        let sized = run_text_fit(
            &mut dom,
            &["textbox_Header_2", "textbox_1_Red_Tag", "DATE"],
            &cfg(),
            &HeuristicMeasurer::default(),
        );
        assert_eq!(sized, ["textbox_Header_2"]);
        let span = dom
            .descendant_by_tag(dom.find_by_id("textbox_Header_2").unwrap(), "span")
            .unwrap();
        let fs = dom.elements[span].style_value("font-size").unwrap();
        assert!(fs.ends_with("px"));
    }

    #[test]
    fn rerunning_over_a_fit_container_does_not_shrink_further() {
        let mut dom = TemplateDom::parse(
            r#"<div id="textbox_Header_2" style="width: 300px; height: 60px"><span>ON AUCTION IN SANDTON</span></div>"#,
        );
        let ids = ["textbox_Header_2"];
        let m = HeuristicMeasurer::default();
        run_text_fit(&mut dom, &ids, &cfg(), &m);
        let span = dom
            .descendant_by_tag(dom.find_by_id("textbox_Header_2").unwrap(), "span")
            .unwrap();
        let first = dom.elements[span].style_value("font-size").unwrap();
        run_text_fit(&mut dom, &ids, &cfg(), &m);
        let second = dom.elements[span].style_value("font-size").unwrap();
        assert_eq!(first, second);
    }
}

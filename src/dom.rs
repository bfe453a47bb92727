//! Flattened element model for template instances.
//!
//! Templates are parsed once into a flat, tree-aware element list (tag, id,
//! classes, attributes, own text, parent index) that the pipeline can query
//! and mutate without a live browser document. Indices are stable for the
//! lifetime of the instance; regeneration replaces the whole list.

use scraper::{ElementRef, Html};

/// One element in document order
#[derive(Debug, Clone)]
pub struct ElementNode {
    pub tag: String,
    pub id: String,
    pub classes: Vec<String>,
    pub attrs: Vec<(String, String)>,
    /// Collected text content at parse time; overridden by mutations
    pub text: String,
    pub parent: Option<usize>,
}

impl ElementNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Read one property out of the inline `style` attribute
    pub fn style_value(&self, prop: &str) -> Option<String> {
        let style = self.attr("style")?;
        for decl in style.split(';') {
            let mut parts = decl.splitn(2, ':');
            let key = parts.next()?.trim();
            if key.eq_ignore_ascii_case(prop) {
                return parts.next().map(|v| v.trim().to_string());
            }
        }
        None
    }
}

/// Parse a `"123px"` style length into pixels
pub fn parse_px(value: &str) -> Option<f64> {
    value.trim().strip_suffix("px")?.trim().parse().ok()
}

/// A parsed template document: flat element list in document order
#[derive(Debug, Clone, Default)]
pub struct TemplateDom {
    pub elements: Vec<ElementNode>,
}

impl TemplateDom {
    /// Build the element list with a depth-first traversal preserving
    /// document order.
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_fragment(html);
        let mut elements = Vec::new();
        let root = document.root_element();
        let mut stack: Vec<(ElementRef, Option<usize>)> = vec![(root, None)];
        while let Some((node, parent_idx)) = stack.pop() {
            let value = node.value();
            let tag = value.name().to_string();
            let id = value.attr("id").unwrap_or_default().to_string();
            let classes = value
                .attr("class")
                .unwrap_or_default()
                .split_whitespace()
                .map(|s| s.to_string())
                .collect();
            let attrs = value
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>();
            let text = node.text().collect::<String>();

            let idx = elements.len();
            elements.push(ElementNode {
                tag,
                id,
                classes,
                attrs,
                text,
                parent: parent_idx,
            });

            // Reverse push keeps children in document order on the stack
            let children: Vec<_> = node
                .children()
                .filter_map(ElementRef::wrap)
                .collect();
            for child in children.into_iter().rev() {
                stack.push((child, Some(idx)));
            }
        }
        Self { elements }
    }

    pub fn find_by_id(&self, id: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    pub fn find_by_class(&self, class: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.has_class(class))
    }

    /// Direct children of an element, in document order
    pub fn children(&self, idx: usize) -> Vec<usize> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.parent == Some(idx))
            .map(|(i, _)| i)
            .collect()
    }

    /// First descendant with the given tag, depth-first
    pub fn descendant_by_tag(&self, idx: usize, tag: &str) -> Option<usize> {
        // The flat list is in document order, so any later element whose
        // parent chain passes through `idx` is a descendant.
        (idx + 1..self.elements.len()).find(|&i| {
            self.elements[i].tag == tag && self.is_descendant(i, idx)
        })
    }

    fn is_descendant(&self, mut i: usize, ancestor: usize) -> bool {
        while let Some(p) = self.elements[i].parent {
            if p == ancestor {
                return true;
            }
            i = p;
        }
        false
    }

    /// Every `img` element's index and current `src`
    pub fn images(&self) -> Vec<(usize, String)> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.tag == "img")
            .map(|(i, e)| (i, e.attr("src").unwrap_or_default().to_string()))
            .collect()
    }

    /// The capture container: first element whose id starts with
    /// `capture-container`.
    pub fn capture_container(&self) -> Option<usize> {
        self.elements
            .iter()
            .position(|e| e.id.starts_with("capture-container"))
    }

    pub fn set_attr(&mut self, idx: usize, name: &str, value: &str) {
        let el = &mut self.elements[idx];
        if let Some(slot) = el.attrs.iter_mut().find(|(k, _)| k == name) {
            slot.1 = value.to_string();
        } else {
            el.attrs.push((name.to_string(), value.to_string()));
        }
    }

    pub fn set_text(&mut self, idx: usize, text: &str) {
        self.elements[idx].text = text.to_string();
    }

    /// Write one property into the inline style, replacing a prior value
    pub fn set_style(&mut self, idx: usize, prop: &str, value: &str) {
        let existing = self.elements[idx].attr("style").unwrap_or_default();
        let mut decls: Vec<String> = existing
            .split(';')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .filter(|d| {
                d.splitn(2, ':')
                    .next()
                    .map(|k| !k.trim().eq_ignore_ascii_case(prop))
                    .unwrap_or(true)
            })
            .map(|d| d.to_string())
            .collect();
        decls.push(format!("{}: {}", prop, value));
        let style = decls.join("; ");
        self.set_attr(idx, "style", &style);
    }

    /// Interior box of an element from its inline width/height (px) or, for
    /// canvas elements, its width/height attributes.
    pub fn box_size(&self, idx: usize) -> Option<(f64, f64)> {
        let el = &self.elements[idx];
        let w = el
            .style_value("width")
            .as_deref()
            .and_then(parse_px)
            .or_else(|| el.attr("width").and_then(|v| v.parse().ok()));
        let h = el
            .style_value("height")
            .as_deref()
            .and_then(parse_px)
            .or_else(|| el.attr("height").and_then(|v| v.parse().ok()));
        match (w, h) {
            (Some(w), Some(h)) => Some((w, h)),
            _ => None,
        }
    }
}

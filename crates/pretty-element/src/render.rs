//! Indented, human-readable rendering of element trees
//!
//! Each element remembers its last rendering together with the depth and
//! options it was produced with. A render with the same key returns the
//! stored string; anything else re-renders. Mutating methods on
//! [`Element`] clear the stored string, so a hit is never stale.
//!
//! Whitespace-only text and tails are treated as layout and omitted. Any
//! other text is written verbatim, including its surrounding spaces.

use std::cell::RefCell;
use std::fmt;

use quick_xml::escape::{escape, partial_escape};
use tracing::trace;

use crate::config::RenderOptions;
use crate::element::Element;

#[derive(Debug, Clone)]
struct Rendered {
    depth: usize,
    options: RenderOptions,
    output: String,
}

/// Per-element memo of the most recent rendering
#[derive(Debug, Clone, Default)]
pub(crate) struct RenderCache(RefCell<Option<Rendered>>);

impl RenderCache {
    fn lookup(&self, depth: usize, options: &RenderOptions) -> Option<String> {
        self.0
            .borrow()
            .as_ref()
            .filter(|r| r.depth == depth && &r.options == options)
            .map(|r| r.output.clone())
    }

    fn store(&self, depth: usize, options: &RenderOptions, output: &str) {
        *self.0.borrow_mut() = Some(Rendered {
            depth,
            options: options.clone(),
            output: output.to_string(),
        });
    }

    pub(crate) fn clear(&mut self) {
        *self.0.get_mut() = None;
    }

    pub(crate) fn is_populated(&self) -> bool {
        self.0.borrow().is_some()
    }
}

/// Render `element` with default options, `depth` levels deep
pub fn render(element: &Element, depth: usize) -> String {
    render_with(element, depth, &RenderOptions::default())
}

/// Render `element` with explicit options
pub fn render_with(element: &Element, depth: usize, options: &RenderOptions) -> String {
    if let Some(hit) = element.cache.lookup(depth, options) {
        trace!(tag = element.tag(), depth, "render cache hit");
        return hit;
    }
    trace!(tag = element.tag(), depth, "render cache miss");

    let output = render_uncached(element, depth, options);
    element.cache.store(depth, options, &output);
    output
}

fn render_uncached(element: &Element, depth: usize, options: &RenderOptions) -> String {
    let pad = " ".repeat(options.indent * depth);
    let mut out = format!("{}<{}", pad, element.tag());
    for (key, value) in element.attributes() {
        out.push_str(&format!(" {}=\"{}\"", key, escape(value.as_str())));
    }

    let text = meaningful(element.text());
    if element.is_empty() {
        match text {
            Some(text) => {
                out.push_str(&format!(">{}</{}>", partial_escape(text), element.tag()));
            }
            None if options.self_close_empty => out.push_str("/>"),
            None => out.push_str(&format!("></{}>", element.tag())),
        }
    } else {
        out.push('>');
        if let Some(text) = text {
            out.push_str(&partial_escape(text));
        }
        for child in element.children() {
            out.push('\n');
            out.push_str(&render_with(child, depth + 1, options));
        }
        out.push('\n');
        out.push_str(&format!("{}</{}>", pad, element.tag()));
    }

    if let Some(tail) = meaningful(element.tail()) {
        out.push_str(&partial_escape(tail));
    }
    out
}

/// Whitespace-only text is layout, not content; anything else is kept
/// verbatim so spacing in mixed content survives
fn meaningful(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

impl Element {
    /// Whether a rendering is currently memoized for this element
    pub fn has_cached_render(&self) -> bool {
        self.cache.is_populated()
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(self, 0))
    }
}

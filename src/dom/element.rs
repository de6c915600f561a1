use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tag name used for text nodes in a page snapshot
pub const TEXT_TAG: &str = "#text";

/// Tags whose content never contributes to rendered text
const NON_RENDERED_TAGS: [&str; 5] = ["script", "style", "noscript", "template", "head"];

/// Tags rendered on their own line when no computed display was captured
const BLOCK_TAGS: [&str; 30] = [
    "address", "article", "aside", "blockquote", "dd", "details", "dialog", "div", "dl", "dt",
    "fieldset", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "section", "table", "ul",
];

/// Represents a node of a page snapshot: either an element or a text node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementNode {
    /// HTML tag name (e.g., "div", "section"), or `#text` for text nodes
    pub tag_name: String,

    /// Element attributes (e.g., id, class, role, data-test)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,

    /// Raw text of a text node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    /// Child nodes in document order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementNode>,

    /// Computed `display` value; `none` hides the whole subtree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    /// Computed visibility of the element's own text. Descendants carry
    /// their own flag, as `visibility: visible` may override a hidden parent.
    #[serde(default = "default_visible")]
    pub is_visible: bool,

    /// Whether the element carries the analysis marker from a previous run
    #[serde(default)]
    pub is_marked: bool,

    /// Rendered geometry (x, y, width, height)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

/// Bounding box coordinates for an element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

fn default_visible() -> bool {
    true
}

impl ElementNode {
    /// Create a new element node
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            attributes: HashMap::new(),
            text_content: None,
            children: Vec::new(),
            display: None,
            is_visible: true,
            is_marked: false,
            bounding_box: None,
        }
    }

    /// Create a text node
    pub fn text(content: impl Into<String>) -> Self {
        let mut node = Self::new(TEXT_TAG);
        node.text_content = Some(content.into());
        node
    }

    /// Builder method: set a single attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder method: append a text node child
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Self::text(text));
        self
    }

    /// Builder method: set children
    pub fn with_children(mut self, children: Vec<ElementNode>) -> Self {
        self.children = children;
        self
    }

    /// Builder method: set the computed display value
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    /// Builder method: set visibility
    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.is_visible = visible;
        self
    }

    /// Builder method: set bounding box
    pub fn with_bounding_box(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bounding_box = Some(BoundingBox { x, y, width, height });
        self
    }

    /// Builder method: set rendered size at the origin
    pub fn with_size(self, width: f64, height: f64) -> Self {
        self.with_bounding_box(0.0, 0.0, width, height)
    }

    /// Check if element is a specific tag
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// Whether this node is a text node
    pub fn is_text(&self) -> bool {
        self.tag_name == TEXT_TAG
    }

    /// Rendered width, zero when no geometry was captured
    pub fn width(&self) -> f64 {
        self.bounding_box.as_ref().map_or(0.0, |b| b.width)
    }

    /// Rendered height, zero when no geometry was captured
    pub fn height(&self) -> f64 {
        self.bounding_box.as_ref().map_or(0.0, |b| b.height)
    }

    /// Iterate element children (text nodes skipped) together with their
    /// index in `children`
    pub fn element_children(&self) -> impl Iterator<Item = (usize, &ElementNode)> {
        self.children.iter().enumerate().filter(|(_, c)| !c.is_text())
    }

    /// Approximate the browser's `innerText`: rendered text only, block
    /// boxes on their own lines, whitespace collapsed.
    pub fn inner_text(&self) -> String {
        let mut raw = String::new();
        self.collect_text(&mut raw, true);

        raw.lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether the element lays out as its own line
    fn is_block(&self) -> bool {
        match self.display.as_deref() {
            Some(display) => {
                let outer = display.split_whitespace().next().unwrap_or_default();
                matches!(outer, "block" | "flex" | "grid" | "table" | "list-item" | "flow-root" | "table-row")
            }
            None => BLOCK_TAGS.iter().any(|t| self.is_tag(t)) || self.is_tag("tr"),
        }
    }

    fn is_table_row(&self) -> bool {
        match self.display.as_deref() {
            Some(display) => display == "table-row",
            None => self.is_tag("tr"),
        }
    }

    fn collect_text(&self, out: &mut String, parent_visible: bool) {
        if self.is_text() {
            if parent_visible {
                if let Some(text) = &self.text_content {
                    // Source newlines are layout whitespace, not line breaks
                    out.extend(text.chars().map(|c| if c.is_whitespace() { ' ' } else { c }));
                }
            }
            return;
        }

        if self.display.as_deref() == Some("none") || NON_RENDERED_TAGS.iter().any(|t| self.is_tag(t)) {
            return;
        }

        if self.is_tag("br") {
            if self.is_visible {
                out.push('\n');
            }
            return;
        }

        let is_block = self.is_block();
        let is_row = self.is_table_row();
        if is_block {
            out.push('\n');
        }
        for child in &self.children {
            child.collect_text(out, self.is_visible);
            if is_row && !child.is_text() {
                out.push('\t');
            }
        }
        if is_block {
            out.push('\n');
        }
    }
}

impl BoundingBox {
    /// Check that both dimensions strictly exceed `min`
    pub fn exceeds(&self, min: f64) -> bool {
        self.width > min && self.height > min
    }
}

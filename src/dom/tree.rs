use crate::dom::element::ElementNode;
use crate::error::{CopilotError, Result};
use crate::render::escape_html;
use headless_chrome::Tab;
use scraper::{Html, Selector};
use std::sync::Arc;

/// Path from the root to a node, as child indices (text nodes included)
pub type NodePath = Vec<usize>;

/// Class applied to the live element chosen as the active region
pub const MARKER_CLASS: &str = "listing-audit-target";

/// Border applied to the live element chosen as the active region
pub const MARKER_BORDER: &str = "4px solid #ff0000";

/// Attribute carrying each element's snapshot path in the selection view
const PATH_ATTR: &str = "data-snapshot-path";

/// Elements that never hold children in parsed HTML
const VOID_TAGS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

/// Parse a CSS selector (or selector list) from a profile entry
pub fn parse_selector(source: &str) -> Result<Selector> {
    Selector::parse(source).map_err(|e| CopilotError::Config(format!("invalid selector '{}': {}", source, e)))
}

/// Parse every selector of a profile list
pub fn parse_selectors<S: AsRef<str>>(sources: &[S]) -> Result<Vec<Selector>> {
    sources.iter().map(|s| parse_selector(s.as_ref())).collect()
}

/// Snapshot of a page's `<body>` with geometry, visibility and marker state
#[derive(Debug, Clone, PartialEq)]
pub struct DomTree {
    /// Root element of the snapshot (the document body)
    pub root: ElementNode,
}

impl DomTree {
    /// Create a tree from a root element
    pub fn new(root: ElementNode) -> Self {
        Self { root }
    }

    /// Capture a snapshot from a browser tab
    pub fn from_tab(tab: &Arc<Tab>) -> Result<Self> {
        // The script returns the serialized body as a JSON string
        let js_code = include_str!("extract_dom.js");

        let result = tab
            .evaluate(js_code, false)
            .map_err(|e| CopilotError::PageUnavailable(format!("Failed to execute snapshot script: {}", e)))?;

        let json_value = result
            .value
            .ok_or_else(|| CopilotError::PageUnavailable("No value returned from snapshot script".to_string()))?;

        let json_str: String = serde_json::from_value(json_value)
            .map_err(|e| CopilotError::DomParseFailed(format!("Failed to get JSON string: {}", e)))?;

        let tree = Self::from_json(&json_str)?;
        log::debug!("Captured page snapshot with {} elements", tree.count_elements());
        Ok(tree)
    }

    /// Parse a snapshot from its JSON form
    pub fn from_json(json: &str) -> Result<Self> {
        let root: ElementNode = serde_json::from_str(json)
            .map_err(|e| CopilotError::DomParseFailed(format!("Failed to parse DOM JSON: {}", e)))?;
        Ok(Self::new(root))
    }

    /// Convert the tree to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.root)
            .map_err(|e| CopilotError::DomParseFailed(format!("Failed to serialize DOM to JSON: {}", e)))
    }

    /// Resolve a path to a node
    pub fn node(&self, path: &[usize]) -> Option<&ElementNode> {
        path.iter().try_fold(&self.root, |node, &i| node.children.get(i))
    }

    /// Resolve a path to a mutable node
    pub fn node_mut(&mut self, path: &[usize]) -> Option<&mut ElementNode> {
        path.iter().try_fold(&mut self.root, |node, &i| node.children.get_mut(i))
    }

    /// All elements matching any of `selectors`, in document order (root included)
    pub fn find_all(&self, selectors: &[Selector]) -> Vec<NodePath> {
        let view = self.selection_view();
        let mut found: Vec<NodePath> = selectors.iter().flat_map(|s| Self::matches(&view, s)).collect();
        found.sort();
        found.dedup();
        found
    }

    /// First descendant of `scope` (excluding `scope` itself) matching `selector`
    pub fn find_first_within(&self, scope: &[usize], selector: &Selector) -> Option<NodePath> {
        self.node(scope)?;
        let view = self.selection_view();
        Self::matches(&view, selector)
            .filter(|path| path.len() > scope.len() && path.starts_with(scope))
            .min()
    }

    /// Paths of the elements in `view` matched by `selector`
    fn matches<'a>(view: &'a Html, selector: &'a Selector) -> impl Iterator<Item = NodePath> + 'a {
        view.select(selector)
            .filter_map(|element| element.value().attr(PATH_ATTR))
            .filter_map(parse_path)
    }

    /// Parse the snapshot as HTML so standard selectors can run against it;
    /// every element carries its snapshot path in [`PATH_ATTR`]
    fn selection_view(&self) -> Html {
        Html::parse_document(&self.to_html())
    }

    /// Render the snapshot as an HTML document with path-stamped elements
    fn to_html(&self) -> String {
        let mut html = String::from("<!DOCTYPE html>");
        write_html(&self.root, &mut Vec::new(), &mut html);
        html
    }

    /// Build an nth-child CSS path addressing the node at `path` in the live page
    pub fn css_path(&self, path: &[usize]) -> Option<String> {
        let mut css = String::from("body");
        let mut node = &self.root;

        for &i in path {
            let child = node.children.get(i)?;
            if child.is_text() {
                return None;
            }
            let position = node.element_children().take_while(|(j, _)| *j <= i).count();
            css.push_str(&format!(" > {}:nth-child({})", child.tag_name, position));
            node = child;
        }

        Some(css)
    }

    /// Paths of all nodes carrying the marker flag
    pub fn marked_paths(&self) -> Vec<NodePath> {
        let mut found = Vec::new();
        let mut path = Vec::new();
        Self::collect_marked(&self.root, &mut path, &mut found);
        found
    }

    fn collect_marked(node: &ElementNode, path: &mut NodePath, found: &mut Vec<NodePath>) {
        if node.is_marked {
            found.push(path.clone());
        }
        for (i, child) in node.element_children() {
            path.push(i);
            Self::collect_marked(child, path, found);
            path.pop();
        }
    }

    /// Set or clear the marker flag on one node; returns false if the path is stale
    pub fn set_marked(&mut self, path: &[usize], marked: bool) -> bool {
        match self.node_mut(path) {
            Some(node) if !node.is_text() => {
                node.is_marked = marked;
                true
            }
            _ => false,
        }
    }

    /// Clear every marker flag in the tree, returning how many were cleared
    pub fn clear_markers(&mut self) -> usize {
        fn clear(node: &mut ElementNode) -> usize {
            let own = usize::from(std::mem::take(&mut node.is_marked));
            own + node.children.iter_mut().map(clear).sum::<usize>()
        }
        clear(&mut self.root)
    }

    /// Count total elements in the tree (text nodes excluded)
    pub fn count_elements(&self) -> usize {
        fn count(node: &ElementNode) -> usize {
            1 + node.element_children().map(|(_, c)| count(c)).sum::<usize>()
        }
        count(&self.root)
    }
}

fn is_html_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':')
}

fn write_html(node: &ElementNode, path: &mut NodePath, out: &mut String) {
    if node.is_text() {
        if let Some(text) = &node.text_content {
            out.push_str(&escape_html(text));
        }
        return;
    }

    let tag = if is_html_name(&node.tag_name) { node.tag_name.to_ascii_lowercase() } else { "div".to_string() };
    let stamp = path.iter().map(usize::to_string).collect::<Vec<_>>().join(".");
    out.push_str(&format!("<{} {}=\"{}\"", tag, PATH_ATTR, stamp));
    for (name, value) in &node.attributes {
        if is_html_name(name) && !name.eq_ignore_ascii_case(PATH_ATTR) {
            out.push_str(&format!(" {}=\"{}\"", name, escape_html(value)));
        }
    }
    out.push('>');

    if VOID_TAGS.contains(&tag.as_str()) {
        return;
    }
    for (i, child) in node.children.iter().enumerate() {
        path.push(i);
        write_html(child, path, out);
        path.pop();
    }
    out.push_str(&format!("</{}>", tag));
}

fn parse_path(stamp: &str) -> Option<NodePath> {
    if stamp.is_empty() {
        return Some(Vec::new());
    }
    stamp.split('.').map(|i| i.parse().ok()).collect()
}

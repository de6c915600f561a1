//! Page snapshot model
//!
//! Extraction never talks to a live page. It works on a snapshot:
//! - ElementNode: element and text nodes with geometry, visibility and marker state
//! - DomTree: the document body, addressed by child-index paths
//! - CSS selectors run against an HTML view of the snapshot to find overlay panels and content markers
//!
//! A snapshot serializes to JSON, so a page captured once can be replayed offline.

pub mod element;
pub mod tree;

pub use element::{BoundingBox, ElementNode, TEXT_TAG};
pub use tree::{DomTree, MARKER_BORDER, MARKER_CLASS, NodePath, parse_selector, parse_selectors};

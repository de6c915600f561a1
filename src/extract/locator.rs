use crate::dom::{DomTree, NodePath};
use scraper::Selector;

/// How the active region was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    /// The topmost visible overlay panel
    Overlay,
    /// A fallback main-content region
    MainContent,
    /// The document body
    Body,
}

/// The subtree treated as the authoritative listing content for one run
#[derive(Debug, Clone, PartialEq)]
pub struct ContentRegion {
    /// Location of the region in the snapshot
    pub path: NodePath,
    pub kind: RegionKind,
    pub width: f64,
    pub height: f64,
}

/// Picks the active content region of a page and keeps it visibly marked
///
/// Overlay panels are appended after their triggers, so the last visible one
/// in document order is the one the user is looking at. At most one region
/// carries the marker: every run clears the previous marker before setting a
/// new one.
#[derive(Debug, Clone)]
pub struct TargetLocator {
    overlays: Vec<Selector>,
    fallbacks: Vec<Selector>,
    min_size: f64,
    marked: Option<NodePath>,
}

impl TargetLocator {
    /// Create a locator from compiled overlay and fallback selectors
    pub fn new(overlays: Vec<Selector>, fallbacks: Vec<Selector>, min_size: f64) -> Self {
        Self {
            overlays,
            fallbacks,
            min_size,
            marked: None,
        }
    }

    /// Choose the active region without touching markers
    pub fn select(&self, tree: &DomTree) -> ContentRegion {
        let candidates = tree.find_all(&self.overlays);

        let overlay = candidates.into_iter().rev().find(|path| {
            tree.node(path)
                .and_then(|node| node.bounding_box.as_ref())
                .is_some_and(|bbox| bbox.exceeds(self.min_size))
        });

        if let Some(path) = overlay {
            return Self::region(tree, path, RegionKind::Overlay);
        }

        let fallback = self
            .fallbacks
            .iter()
            .find_map(|selector| tree.find_all(std::slice::from_ref(selector)).into_iter().next());

        match fallback {
            Some(path) => Self::region(tree, path, RegionKind::MainContent),
            None => Self::region(tree, Vec::new(), RegionKind::Body),
        }
    }

    /// Clear the previous marker, choose the active region and mark it
    pub fn locate(&mut self, tree: &mut DomTree) -> ContentRegion {
        if let Some(previous) = self.marked.take() {
            if !tree.set_marked(&previous, false) {
                log::debug!("Previous marker path {:?} no longer exists", previous);
            }
        }

        // Markers read back from a live page survive our own bookkeeping
        let stale = tree.clear_markers();
        if stale > 0 {
            log::debug!("Cleared {} marker(s) left by an earlier run", stale);
        }

        let region = self.select(tree);
        tree.set_marked(&region.path, true);
        self.marked = Some(region.path.clone());

        log::debug!(
            "Selected {:?} region at {:?} ({}x{})",
            region.kind,
            region.path,
            region.width,
            region.height
        );
        region
    }

    /// The region marked by the last run, if any
    pub fn marked(&self) -> Option<&NodePath> {
        self.marked.as_ref()
    }

    fn region(tree: &DomTree, path: NodePath, kind: RegionKind) -> ContentRegion {
        let (width, height) = tree.node(&path).map_or((0.0, 0.0), |n| (n.width(), n.height()));
        ContentRegion {
            path,
            kind,
            width,
            height,
        }
    }
}

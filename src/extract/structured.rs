use crate::dom::{DomTree, parse_selector};
use crate::error::Result;
use crate::extract::truncate_chars;
use scraper::Selector;

/// Review text used when the region exposes no review marker
pub const NO_REVIEWS: &str = "No reviews found.";

/// Where a piece of selected text came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSource {
    /// A structured marker, identified by its selector
    Marker(String),
    /// The leading slice of the region's full text
    RegionText,
    /// The fixed placeholder
    Placeholder,
}

/// Description and review text chosen from a region
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedText {
    pub description: String,
    pub description_source: TextSource,
    pub reviews: String,
    pub reviews_source: TextSource,
}

/// Picks description and review text, preferring structured markers over raw text
#[derive(Debug, Clone)]
pub struct StructuredSelector {
    description_markers: Vec<(String, Selector)>,
    review_markers: Vec<(String, Selector)>,
    max_chars: usize,
}

impl StructuredSelector {
    /// Compile marker selectors, in priority order
    pub fn new<S: AsRef<str>>(description_markers: &[S], review_markers: &[S], max_chars: usize) -> Result<Self> {
        Ok(Self {
            description_markers: Self::compile(description_markers)?,
            review_markers: Self::compile(review_markers)?,
            max_chars,
        })
    }

    fn compile<S: AsRef<str>>(sources: &[S]) -> Result<Vec<(String, Selector)>> {
        sources
            .iter()
            .map(|s| parse_selector(s.as_ref()).map(|selector| (s.as_ref().to_string(), selector)))
            .collect()
    }

    /// Select text from the region at `region`, whose rendered text is `region_text`
    pub fn select(&self, tree: &DomTree, region: &[usize], region_text: &str) -> SelectedText {
        let (description, description_source) = match self.marker_text(tree, region, &self.description_markers) {
            Some((text, marker)) => (truncate_chars(text.trim(), self.max_chars), TextSource::Marker(marker)),
            None => (truncate_chars(region_text, self.max_chars), TextSource::RegionText),
        };

        let (reviews, reviews_source) = match self.marker_text(tree, region, &self.review_markers) {
            Some((text, marker)) => (truncate_chars(&text, self.max_chars), TextSource::Marker(marker)),
            None => (NO_REVIEWS.to_string(), TextSource::Placeholder),
        };

        SelectedText {
            description,
            description_source,
            reviews,
            reviews_source,
        }
    }

    /// Rendered text of the first descendant matching the first marker that matches at all
    fn marker_text(&self, tree: &DomTree, region: &[usize], markers: &[(String, Selector)]) -> Option<(String, String)> {
        markers.iter().find_map(|(source, marker)| {
            let path = tree.find_first_within(region, marker)?;
            let node = tree.node(&path)?;
            Some((node.inner_text(), source.clone()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementNode;

    fn selector(max_chars: usize) -> StructuredSelector {
        StructuredSelector::new(
            &[".job-description", "[data-test='job-description-text']"],
            &[".client-activity-items", "[data-test='client-history']"],
            max_chars,
        )
        .unwrap()
    }

    fn region_tree(children: Vec<ElementNode>) -> DomTree {
        DomTree::new(ElementNode::new("body").with_children(vec![ElementNode::new("section").with_children(children)]))
    }

    #[test]
    fn test_marker_text_preferred() {
        let tree = region_tree(vec![
            ElementNode::new("h1").with_text("Rust developer"),
            ElementNode::new("div")
                .with_attribute("data-test", "job-description-text")
                .with_text("  Build a CDP scraper.  "),
            ElementNode::new("div")
                .with_attribute("class", "client-activity-items")
                .with_text("Great client, pays on time"),
        ]);
        let region_text = tree.node(&[0]).unwrap().inner_text();

        let selected = selector(1500).select(&tree, &[0], &region_text);
        assert_eq!(selected.description, "Build a CDP scraper.");
        assert_eq!(
            selected.description_source,
            TextSource::Marker("[data-test='job-description-text']".to_string())
        );
        assert_eq!(selected.reviews, "Great client, pays on time");
        assert_eq!(selected.reviews_source, TextSource::Marker(".client-activity-items".to_string()));
    }

    #[test]
    fn test_first_marker_has_priority() {
        let tree = region_tree(vec![
            ElementNode::new("div")
                .with_attribute("data-test", "job-description-text")
                .with_text("second marker"),
            ElementNode::new("div").with_attribute("class", "job-description").with_text("first marker"),
        ]);

        let selected = selector(1500).select(&tree, &[0], "");
        assert_eq!(selected.description, "first marker");
    }

    #[test]
    fn test_fallback_slice_and_placeholder() {
        let tree = region_tree(vec![ElementNode::new("p").with_text("x".repeat(2000))]);
        let region_text = tree.node(&[0]).unwrap().inner_text();

        let selected = selector(1500).select(&tree, &[0], &region_text);
        assert_eq!(selected.description.chars().count(), 1500);
        assert_eq!(selected.description_source, TextSource::RegionText);
        assert_eq!(selected.reviews, NO_REVIEWS);
        assert_eq!(selected.reviews_source, TextSource::Placeholder);
    }

    #[test]
    fn test_marker_text_is_capped() {
        let long = "é".repeat(40);
        let tree = region_tree(vec![
            ElementNode::new("div").with_attribute("class", "job-description").with_text(long.clone()),
            ElementNode::new("ul").with_attribute("data-test", "client-history").with_text(long),
        ]);

        let selected = selector(25).select(&tree, &[0], "");
        assert_eq!(selected.description.chars().count(), 25);
        assert_eq!(selected.reviews.chars().count(), 25);
    }

    #[test]
    fn test_marker_selector_lists_and_prefixes() {
        let selector = StructuredSelector::new(
            &["[data-test^='Description'], .job-description"],
            &["ul[data-test$='history']"],
            1500,
        )
        .unwrap();
        let tree = region_tree(vec![
            ElementNode::new("div")
                .with_attribute("data-test", "Description Description")
                .with_text("Scrape listings"),
            ElementNode::new("ul").with_attribute("data-test", "client-history").with_text("Paid on time"),
        ]);

        let selected = selector.select(&tree, &[0], "");
        assert_eq!(selected.description, "Scrape listings");
        assert_eq!(
            selected.description_source,
            TextSource::Marker("[data-test^='Description'], .job-description".to_string())
        );
        assert_eq!(selected.reviews, "Paid on time");
    }

    #[test]
    fn test_invalid_marker_rejected() {
        assert!(StructuredSelector::new(&["div >"], &[".ok"], 10).is_err());
    }

    #[test]
    fn test_markers_outside_region_ignored() {
        let tree = DomTree::new(ElementNode::new("body").with_children(vec![
            ElementNode::new("div").with_attribute("class", "job-description").with_text("background page"),
            ElementNode::new("aside").with_text("panel text"),
        ]));

        let selected = selector(1500).select(&tree, &[1], "panel text");
        assert_eq!(selected.description, "panel text");
        assert_eq!(selected.description_source, TextSource::RegionText);
    }
}

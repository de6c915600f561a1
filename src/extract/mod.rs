//! Listing content extraction
//!
//! The pipeline runs against a page snapshot in three steps:
//! - [`TargetLocator`] picks the active content region (topmost overlay panel, else main content, else body)
//! - [`StructuredSelector`] reads description and review text from structured markers, falling back to raw text
//! - [`FieldParser`] pulls client spend and hourly rate out of the region text with ordered rules
//!
//! [`TextExtractor`] composes them into one [`ExtractedJobData`] and is the
//! [`PageScript`] handed to a [`PageAgent`](crate::agent::PageAgent).

pub mod fields;
pub mod locator;
pub mod profile;
pub mod structured;

pub use fields::{FieldParser, FinancialStats, ParsedStats, RATE_PLACEHOLDER, RateSource, SPENT_PLACEHOLDER, SpentSource};
pub use locator::{ContentRegion, RegionKind, TargetLocator};
pub use profile::{ExtractionProfile, LocaleKeywords};
pub use structured::{NO_REVIEWS, SelectedText, StructuredSelector, TextSource};

use crate::agent::PageScript;
use crate::dom::DomTree;
use crate::dom::parse_selectors;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Error reported when the active region has no rendered text at all
pub const NO_CONTENT_ERROR: &str = "No job details found on this page. Open a job post and try again.";

/// Result of one extraction run
///
/// When `error` is set the other fields carry no meaning and must not be submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedJobData {
    pub description: String,
    pub reviews: String,
    pub client_stats: FinancialStats,
    pub error: Option<String>,
}

impl ExtractedJobData {
    /// A result carrying only an error
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            description: String::new(),
            reviews: String::new(),
            client_stats: FinancialStats::default(),
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Locates the active region of a page snapshot and extracts listing data from it
#[derive(Debug, Clone)]
pub struct TextExtractor {
    locator: TargetLocator,
    selector: StructuredSelector,
    parser: FieldParser,
}

impl TextExtractor {
    /// Compile a profile into an extractor
    pub fn new(profile: &ExtractionProfile) -> Result<Self> {
        profile.validate()?;

        let locator = TargetLocator::new(
            parse_selectors(&profile.overlay_selectors)?,
            parse_selectors(&profile.fallback_selectors)?,
            profile.min_region_size,
        );
        let selector = StructuredSelector::new(
            &profile.description_markers,
            &profile.review_markers,
            profile.max_text_chars,
        )?;
        let parser = FieldParser::from_locales(&profile.locales)?;

        Ok(Self {
            locator,
            selector,
            parser,
        })
    }

    /// Extractor with the built-in profile
    pub fn with_defaults() -> Result<Self> {
        Self::new(&ExtractionProfile::default())
    }

    /// Run one extraction: clear the old marker, mark the active region, read it
    pub fn extract(&mut self, tree: &mut DomTree) -> ExtractedJobData {
        let region = self.locator.locate(tree);

        let full_text = match tree.node(&region.path) {
            Some(node) => node.inner_text(),
            None => return ExtractedJobData::failed(NO_CONTENT_ERROR),
        };

        if full_text.trim().is_empty() {
            log::warn!("Active region {:?} has no rendered text", region.kind);
            return ExtractedJobData::failed(NO_CONTENT_ERROR);
        }

        let client_stats = self.parser.parse(&full_text);
        let selected = self.selector.select(tree, &region.path, &full_text);

        log::debug!(
            "Extracted description ({} chars, {:?}) and reviews ({} chars, {:?})",
            selected.description.chars().count(),
            selected.description_source,
            selected.reviews.chars().count(),
            selected.reviews_source
        );

        ExtractedJobData {
            description: selected.description,
            reviews: selected.reviews,
            client_stats,
            error: None,
        }
    }

    pub fn locator(&self) -> &TargetLocator {
        &self.locator
    }

    pub fn parser(&self) -> &FieldParser {
        &self.parser
    }
}

impl PageScript for TextExtractor {
    fn run(&mut self, page: &mut DomTree) -> ExtractedJobData {
        self.extract(page)
    }
}

/// Keep at most `max` characters of `text`
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

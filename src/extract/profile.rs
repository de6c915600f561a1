use crate::error::{CopilotError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Keywords one locale uses for the client financial fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleKeywords {
    /// Labels for the client's total spend, e.g. "Total spent"
    pub spent: Vec<String>,

    /// Labels for the average hourly rate, e.g. "Avg hourly rate"
    pub hourly_rate: Vec<String>,

    /// Currency words written after an amount, e.g. "美元"
    pub currency_words: Vec<String>,
}

impl LocaleKeywords {
    /// Builder-style constructor
    pub fn new(spent: &[&str], hourly_rate: &[&str], currency_words: &[&str]) -> Self {
        let owned = |words: &[&str]| words.iter().map(|w| w.to_string()).collect();
        Self {
            spent: owned(spent),
            hourly_rate: owned(hourly_rate),
            currency_words: owned(currency_words),
        }
    }
}

/// Where to look on a listing page and how to read it
///
/// Selectors are kept as text and compiled when the extractor is built, so a
/// profile can be loaded from JSON and validated in one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionProfile {
    /// Overlay-like panels (dialogs, side panels) that may hold the active listing
    pub overlay_selectors: Vec<String>,

    /// Regions tried in order when no overlay qualifies; the body is the last resort
    pub fallback_selectors: Vec<String>,

    /// Structured job description markers, in preference order
    pub description_markers: Vec<String>,

    /// Structured client review markers, in preference order
    pub review_markers: Vec<String>,

    /// An overlay must be strictly wider and taller than this to count as visible
    pub min_region_size: f64,

    /// Upper bound on description and review length, in characters
    pub max_text_chars: usize,

    /// Locale keyword tables; rules are generated in this order
    pub locales: IndexMap<String, LocaleKeywords>,
}

impl Default for ExtractionProfile {
    fn default() -> Self {
        let mut locales = IndexMap::new();
        locales.insert("en".to_string(), LocaleKeywords::new(&["Total spent"], &["Avg hourly rate"], &[]));
        locales.insert("zh".to_string(), LocaleKeywords::new(&["已花费"], &["平均时薪"], &["美元"]));

        Self {
            overlay_selectors: vec![
                "[role='dialog']".to_string(),
                "[role='complementary']".to_string(),
                ".air3-slider-container".to_string(),
            ],
            fallback_selectors: vec!["main".to_string()],
            description_markers: vec![
                ".job-description".to_string(),
                "[data-test='job-description-text']".to_string(),
            ],
            review_markers: vec![
                ".client-activity-items".to_string(),
                "[data-test='client-history']".to_string(),
            ],
            min_region_size: 50.0,
            max_text_chars: 1500,
            locales,
        }
    }
}

impl ExtractionProfile {
    /// Load a profile from a JSON file; missing keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let profile: Self = serde_json::from_str(&content)
            .map_err(|e| CopilotError::Config(format!("{}: {}", path.display(), e)))?;
        profile.validate()?;
        log::debug!("Loaded extraction profile from {}", path.display());
        Ok(profile)
    }

    /// Check numeric bounds
    pub fn validate(&self) -> Result<()> {
        if !self.min_region_size.is_finite() || self.min_region_size < 0.0 {
            return Err(CopilotError::Config(format!(
                "min_region_size must be a non-negative number, got {}",
                self.min_region_size
            )));
        }
        if self.max_text_chars == 0 {
            return Err(CopilotError::Config("max_text_chars must be positive".to_string()));
        }
        Ok(())
    }
}

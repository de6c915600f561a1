use crate::error::{CopilotError, Result};
use crate::extract::profile::LocaleKeywords;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// `spent` value when neither a spend figure nor a budget is on the page
pub const SPENT_PLACEHOLDER: &str = "Hidden/New";

/// `rate` value when no hourly rate is on the page
pub const RATE_PLACEHOLDER: &str = "Fixed/Hidden";

/// Currency symbol, then a number with an optional `k` multiplier and `+`.
/// The symbol is required so a hire count next to the label is never read as spend.
const SPENT_AMOUNT: &str = r"[$€£¥]\s?\d[\d.,]*[kK]?\+?";
/// Optional currency symbol, then a number; keyword rules keep it on the label's line
const RATE_AMOUNT: &str = r"[$€£¥]?\s?\d[\d.,]*";
const PER_HOUR_AMOUNT: &str = r"[$€£¥]?\s?\d[\d.,]*";
const NUMBER: &str = r"\d[\d.,]*";

/// Normalized client financials. Both fields are always populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialStats {
    pub spent: String,
    pub rate: String,
}

impl Default for FinancialStats {
    fn default() -> Self {
        Self {
            spent: SPENT_PLACEHOLDER.to_string(),
            rate: RATE_PLACEHOLDER.to_string(),
        }
    }
}

/// Which tier produced the `spent` value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpentSource {
    Keyword,
    Budget,
    Placeholder,
}

/// Which tier produced the `rate` value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    Keyword,
    PerHourSuffix,
    Placeholder,
}

/// Parsed stats together with the rule that produced each field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStats {
    pub stats: FinancialStats,
    pub spent_source: SpentSource,
    pub spent_rule: Option<String>,
    pub rate_source: RateSource,
    pub rate_rule: Option<String>,
}

/// One ordered matching rule: a pattern and the capture group holding the value
#[derive(Debug, Clone)]
pub struct PatternRule {
    name: String,
    regex: Regex,
    group: usize,
}

impl PatternRule {
    fn new(name: impl Into<String>, pattern: &str, group: usize) -> Result<Self> {
        let name = name.into();
        let regex = Regex::new(pattern).map_err(|source| CopilotError::InvalidRule {
            rule: name.clone(),
            source,
        })?;
        Ok(Self { name, regex, group })
    }

    /// Rule name, e.g. `spent/keyword-first`
    pub fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, text: &str) -> Option<String> {
        let value = self.regex.captures(text)?.get(self.group)?.as_str();
        let value = value.trim().trim_end_matches(['.', ',']);
        (!value.is_empty()).then(|| value.to_string())
    }
}

/// Extracts client financials from free text with first-match-wins rule lists
///
/// Resolution order for `spent`: explicit spend figure, then budget (as a
/// dollar amount), then [`SPENT_PLACEHOLDER`]. For `rate`: labelled average
/// hourly rate, then a bare `amount/hr`, then [`RATE_PLACEHOLDER`].
#[derive(Debug, Clone)]
pub struct FieldParser {
    spent_rules: Vec<PatternRule>,
    budget_rules: Vec<PatternRule>,
    rate_rules: Vec<PatternRule>,
    rate_suffix_rules: Vec<PatternRule>,
}

impl FieldParser {
    /// Build the rule lists from locale keyword tables, keywords of earlier
    /// locales taking precedence within each pattern
    pub fn from_locales(locales: &IndexMap<String, LocaleKeywords>) -> Result<Self> {
        let spent = alternation(locales.values().flat_map(|l| &l.spent));
        let rate = alternation(locales.values().flat_map(|l| &l.hourly_rate));
        let currency = alternation(locales.values().flat_map(|l| &l.currency_words));

        let mut spent_rules = Vec::new();
        if let Some(kw) = &spent {
            spent_rules.push(PatternRule::new(
                "spent/keyword-first",
                &format!(r"(?i)({kw})\s*({SPENT_AMOUNT})"),
                2,
            )?);
            spent_rules.push(PatternRule::new(
                "spent/amount-first",
                &format!(r"(?i)({SPENT_AMOUNT})\s*({kw})"),
                1,
            )?);
        }

        let mut budget_rules = Vec::new();
        if let Some(words) = &currency {
            budget_rules.push(PatternRule::new(
                "budget/currency-word",
                &format!(r"({NUMBER})\s*(?:{words})"),
                1,
            )?);
        }
        budget_rules.push(PatternRule::new("budget/dollar", &format!(r"\$\s*({NUMBER})"), 1)?);

        let mut rate_rules = Vec::new();
        if let Some(kw) = &rate {
            rate_rules.push(PatternRule::new(
                "rate/keyword-first",
                &format!(r"(?i)({kw}).*?({RATE_AMOUNT})"),
                2,
            )?);
        }
        let rate_suffix_rules = vec![PatternRule::new(
            "rate/per-hour",
            &format!(r"(?i)({PER_HOUR_AMOUNT})\s*/\s*hr\b"),
            1,
        )?];

        Ok(Self {
            spent_rules,
            budget_rules,
            rate_rules,
            rate_suffix_rules,
        })
    }

    /// Parse `text` into financial stats
    pub fn parse(&self, text: &str) -> FinancialStats {
        self.parse_detailed(text).stats
    }

    /// Parse `text`, reporting which rule produced each field
    pub fn parse_detailed(&self, text: &str) -> ParsedStats {
        let (spent, spent_source, spent_rule) = if let Some((value, rule)) = first_match(&self.spent_rules, text) {
            (value, SpentSource::Keyword, Some(rule))
        } else if let Some((value, rule)) = first_match(&self.budget_rules, text) {
            (format!("${}", value), SpentSource::Budget, Some(rule))
        } else {
            (SPENT_PLACEHOLDER.to_string(), SpentSource::Placeholder, None)
        };

        let (rate, rate_source, rate_rule) = if let Some((value, rule)) = first_match(&self.rate_rules, text) {
            (value, RateSource::Keyword, Some(rule))
        } else if let Some((value, rule)) = first_match(&self.rate_suffix_rules, text) {
            (value, RateSource::PerHourSuffix, Some(rule))
        } else {
            (RATE_PLACEHOLDER.to_string(), RateSource::Placeholder, None)
        };

        log::debug!("Parsed stats: spent={} ({:?}), rate={} ({:?})", spent, spent_source, rate, rate_source);

        ParsedStats {
            stats: FinancialStats { spent, rate },
            spent_source,
            spent_rule,
            rate_source,
            rate_rule,
        }
    }

    /// All rules in evaluation order
    pub fn rules(&self) -> impl Iterator<Item = &PatternRule> {
        self.spent_rules
            .iter()
            .chain(&self.budget_rules)
            .chain(&self.rate_rules)
            .chain(&self.rate_suffix_rules)
    }
}

fn first_match(rules: &[PatternRule], text: &str) -> Option<(String, String)> {
    rules
        .iter()
        .find_map(|rule| rule.apply(text).map(|value| (value, rule.name.clone())))
}

fn alternation<'a>(words: impl Iterator<Item = &'a String>) -> Option<String> {
    let escaped: Vec<String> = words
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .map(regex::escape)
        .collect();
    (!escaped.is_empty()).then(|| escaped.join("|"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::profile::ExtractionProfile;

    fn parser() -> FieldParser {
        FieldParser::from_locales(&ExtractionProfile::default().locales).unwrap()
    }

    #[test]
    fn test_keyword_first_spent_and_suffix_rate() {
        let parsed = parser().parse_detailed("Client history\nTotal spent $50k\n$45/hr\n12 hires");

        assert_eq!(parsed.stats.spent, "$50k");
        assert_eq!(parsed.stats.rate, "$45");
        assert_eq!(parsed.spent_source, SpentSource::Keyword);
        assert_eq!(parsed.rate_source, RateSource::PerHourSuffix);
        assert_eq!(parsed.spent_rule.as_deref(), Some("spent/keyword-first"));
    }

    #[test]
    fn test_amount_first_spent_yields_amount() {
        let stats = parser().parse("Payment verified\n$1.2K+ total spent\n5 hires");
        assert_eq!(stats.spent, "$1.2K+");
    }

    #[test]
    fn test_keyword_rate() {
        let parsed = parser().parse_detailed("Avg hourly rate paid: $32.50 /hr\n$8k total spent");

        assert_eq!(parsed.stats.rate, "$32.50");
        assert_eq!(parsed.rate_source, RateSource::Keyword);
        assert_eq!(parsed.stats.spent, "$8k");
    }

    #[test]
    fn test_keyword_rate_without_symbol() {
        let parsed = parser().parse_detailed("Avg hourly rate paid 32.50");
        assert_eq!(parsed.stats.rate, "32.50");
        assert_eq!(parsed.rate_source, RateSource::Keyword);

        let stats = parser().parse("已花费 $3K+\n平均时薪 25.00 美元");
        assert_eq!(stats.rate, "25.00");
    }

    #[test]
    fn test_spent_requires_symbol() {
        let parsed = parser().parse_detailed("Total spent\n5 hires\n2 active");
        assert_eq!(parsed.stats.spent, SPENT_PLACEHOLDER);
        assert_eq!(parsed.spent_source, SpentSource::Placeholder);
    }

    #[test]
    fn test_chinese_keywords() {
        let stats = parser().parse("已花费 $3K+\n平均时薪 $25.00");
        assert_eq!(stats.spent, "$3K+");
        assert_eq!(stats.rate, "$25.00");
    }

    #[test]
    fn test_budget_substitutes_for_spent() {
        let parsed = parser().parse_detailed("Fixed-price\nBudget: $200.00\nIntermediate");
        assert_eq!(parsed.stats.spent, "$200.00");
        assert_eq!(parsed.spent_source, SpentSource::Budget);
        assert_eq!(parsed.stats.rate, RATE_PLACEHOLDER);

        let stats = parser().parse("预算 500.00 美元");
        assert_eq!(stats.spent, "$500.00");
    }

    #[test]
    fn test_currency_word_budget_beats_dollar_budget() {
        let parsed = parser().parse_detailed("$15 bonus\n预算 300 美元");
        assert_eq!(parsed.stats.spent, "$300");
        assert_eq!(parsed.spent_rule.as_deref(), Some("budget/currency-word"));
    }

    #[test]
    fn test_spend_keyword_beats_budget() {
        let stats = parser().parse("Budget $900\nTotal spent $0");
        assert_eq!(stats.spent, "$0");
    }

    #[test]
    fn test_placeholders_when_nothing_matches() {
        let parsed = parser().parse_detailed("Looking for a logo designer. Payment method not verified.");

        assert_eq!(
            parsed.stats,
            FinancialStats {
                spent: "Hidden/New".to_string(),
                rate: "Fixed/Hidden".to_string()
            }
        );
        assert_eq!(parsed.spent_source, SpentSource::Placeholder);
        assert_eq!(parsed.rate_source, RateSource::Placeholder);
        assert!(parsed.spent_rule.is_none());
    }

    #[test]
    fn test_trailing_punctuation_trimmed() {
        let stats = parser().parse("They have Total spent $500. So far.");
        assert_eq!(stats.spent, "$500");
    }

    #[test]
    fn test_custom_locale_table() {
        let mut locales = IndexMap::new();
        locales.insert(
            "de".to_string(),
            LocaleKeywords::new(&["Gesamtausgaben"], &["Durchschn. Stundensatz"], &["Euro"]),
        );
        let parser = FieldParser::from_locales(&locales).unwrap();

        let stats = parser.parse("Gesamtausgaben €4k\nDurchschn. Stundensatz €30");
        assert_eq!(stats.spent, "€4k");
        assert_eq!(stats.rate, "€30");

        // English keywords are not part of this table
        let stats = parser.parse("Total spent 4k\n250 Euro");
        assert_eq!(stats.spent, "$250");
    }

    #[test]
    fn test_rule_order() {
        let parser = parser();
        let names: Vec<&str> = parser.rules().map(|r| r.name()).collect();
        assert_eq!(
            names,
            vec![
                "spent/keyword-first",
                "spent/amount-first",
                "budget/currency-word",
                "budget/dollar",
                "rate/keyword-first",
                "rate/per-hour",
            ]
        );
    }
}

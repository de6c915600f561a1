//! Result rendering
//!
//! Turns a [`ScoreResponse`] into a display fragment. Scores strictly above
//! [`HIGH_RISK_THRESHOLD`] render as high risk.

use crate::scoring::ScoreResponse;
use std::fmt::Write;

/// Scores above this value are high risk; the threshold itself is not
pub const HIGH_RISK_THRESHOLD: u8 = 50;

pub const HIGH_RISK_COLOR: &str = "#dc2626";
pub const LOW_RISK_COLOR: &str = "#16a34a";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    High,
    LowOrModerate,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        if score > HIGH_RISK_THRESHOLD {
            RiskLevel::High
        } else {
            RiskLevel::LowOrModerate
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            RiskLevel::High => HIGH_RISK_COLOR,
            RiskLevel::LowOrModerate => LOW_RISK_COLOR,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::High => "High risk",
            RiskLevel::LowOrModerate => "Low/moderate risk",
        }
    }
}

/// Renderable result card
#[derive(Debug, Clone, PartialEq)]
pub struct ResultFragment {
    pub risk_score: u8,
    pub level: RiskLevel,
    /// Reasons in the order the scoring service gave them
    pub reasons: Vec<String>,
    /// Editable proposal draft
    pub draft: String,
}

impl ResultFragment {
    pub fn color(&self) -> &'static str {
        self.level.color()
    }

    /// HTML card; every piece of service-provided text is escaped
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        html.push_str("<div class=\"result-card\">\n");
        html.push_str("  <div class=\"score-box\">\n    <span>Risk Score</span>\n");
        let _ = writeln!(
            html,
            "    <span class=\"score-val\" style=\"color: {};\">{}/100</span>",
            self.color(),
            self.risk_score
        );
        html.push_str("  </div>\n");
        html.push_str("  <div class=\"risk-factors\">\n    <strong>Risk Factors:</strong>\n    <ol>\n");
        for reason in &self.reasons {
            let _ = writeln!(html, "      <li>{}</li>", escape_html(reason));
        }
        html.push_str("    </ol>\n  </div>\n");
        html.push_str("  <div class=\"strategy\">\n    <strong>Strategy Draft:</strong>\n");
        let _ = writeln!(html, "    <textarea rows=\"6\">{}</textarea>", escape_html(&self.draft));
        html.push_str("  </div>\n</div>\n");
        html
    }

    /// Plain-text card for terminals
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        let _ = writeln!(text, "Risk Score: {}/100 ({})", self.risk_score, self.level.label());
        text.push_str("\nRisk Factors:\n");
        if self.reasons.is_empty() {
            text.push_str("  (none)\n");
        }
        for (i, reason) in self.reasons.iter().enumerate() {
            let _ = writeln!(text, "  {}. {}", i + 1, reason);
        }
        text.push_str("\nStrategy Draft:\n");
        for line in self.draft.lines() {
            let _ = writeln!(text, "  {}", line);
        }
        text
    }
}

/// Build the display fragment for a response
pub fn render(response: &ScoreResponse) -> ResultFragment {
    ResultFragment {
        risk_score: response.risk_score,
        level: RiskLevel::from_score(response.risk_score),
        reasons: response.risk_reasons.clone(),
        draft: response.proposal_draft.clone(),
    }
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(score: u8) -> ScoreResponse {
        ScoreResponse {
            risk_score: score,
            risk_reasons: vec!["new client".to_string(), "vague description".to_string()],
            proposal_draft: "I noticed your scraper keeps timing out...".to_string(),
        }
    }

    #[test]
    fn test_threshold_boundary() {
        assert_eq!(render(&response(50)).level, RiskLevel::LowOrModerate);
        assert_eq!(render(&response(51)).level, RiskLevel::High);
        assert_eq!(render(&response(0)).color(), LOW_RISK_COLOR);
        assert_eq!(render(&response(100)).color(), HIGH_RISK_COLOR);
    }

    #[test]
    fn test_high_risk_html_lists_reasons_in_order() {
        let html = render(&response(72)).to_html();

        assert!(html.contains("color: #dc2626;"));
        assert!(html.contains("72/100"));
        let first = html.find("<li>new client</li>").unwrap();
        let second = html.find("<li>vague description</li>").unwrap();
        assert!(first < second);
        assert!(html.contains("<textarea rows=\"6\">I noticed your scraper keeps timing out...</textarea>"));
    }

    #[test]
    fn test_html_escapes_service_text() {
        let mut resp = response(10);
        resp.risk_reasons = vec!["<script>alert(1)</script>".to_string()];
        resp.proposal_draft = "</textarea><b>\"hi\" & 'bye'</b>".to_string();

        let html = render(&resp).to_html();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("&lt;/textarea&gt;&lt;b&gt;&quot;hi&quot; &amp; &#39;bye&#39;&lt;/b&gt;"));
    }

    #[test]
    fn test_text_card() {
        let text = render(&response(72)).to_text();

        assert!(text.starts_with("Risk Score: 72/100 (High risk)"));
        assert!(text.contains("  1. new client\n  2. vague description\n"));
        assert!(text.contains("Strategy Draft:\n  I noticed"));
    }
}

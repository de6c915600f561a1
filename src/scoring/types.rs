use crate::error::{CopilotError, Result};
use crate::extract::{ExtractedJobData, FinancialStats};
use serde::{Deserialize, Serialize};

/// Highest risk score the scoring service may return
pub const MAX_RISK_SCORE: u8 = 100;

/// Body of the scoring request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub job_description: String,
    pub client_reviews: String,
    pub client_stats: FinancialStats,
}

impl TryFrom<ExtractedJobData> for ScoreRequest {
    type Error = CopilotError;

    /// Extraction results that carry an error are never submitted
    fn try_from(data: ExtractedJobData) -> Result<Self> {
        if let Some(error) = data.error {
            return Err(CopilotError::ExtractionRejected(error));
        }

        Ok(Self {
            job_description: data.description,
            client_reviews: data.reviews,
            client_stats: data.client_stats,
        })
    }
}

/// Risk assessment returned by the scoring service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub risk_score: u8,
    pub risk_reasons: Vec<String>,
    pub proposal_draft: String,
}

impl ScoreResponse {
    /// Decode and validate a response body
    ///
    /// Anything that does not fit the schema, including a score above
    /// [`MAX_RISK_SCORE`], is a malformed response.
    pub fn from_json(body: &str) -> Result<Self> {
        let response: Self =
            serde_json::from_str(body).map_err(|e| CopilotError::MalformedResponse(e.to_string()))?;
        response.validate()?;
        Ok(response)
    }

    pub fn validate(&self) -> Result<()> {
        if self.risk_score > MAX_RISK_SCORE {
            return Err(CopilotError::MalformedResponse(format!(
                "risk_score {} is outside 0..={}",
                self.risk_score, MAX_RISK_SCORE
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extracted() -> ExtractedJobData {
        ExtractedJobData {
            description: "Build a scraper".to_string(),
            reviews: "No reviews found.".to_string(),
            client_stats: FinancialStats {
                spent: "$50k".to_string(),
                rate: "$45".to_string(),
            },
            error: None,
        }
    }

    #[test]
    fn test_request_from_extracted() {
        let request = ScoreRequest::try_from(extracted()).unwrap();
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["job_description"], "Build a scraper");
        assert_eq!(json["client_reviews"], "No reviews found.");
        assert_eq!(json["client_stats"]["spent"], "$50k");
        assert_eq!(json["client_stats"]["rate"], "$45");
    }

    #[test]
    fn test_request_rejects_errored_extraction() {
        let err = ScoreRequest::try_from(ExtractedJobData::failed("not a listing")).unwrap_err();
        assert!(matches!(err, CopilotError::ExtractionRejected(msg) if msg == "not a listing"));
    }

    #[test]
    fn test_response_parsing() {
        let response = ScoreResponse::from_json(
            r#"{"risk_score": 72, "risk_reasons": ["new client", "vague description"], "proposal_draft": "Hi"}"#,
        )
        .unwrap();

        assert_eq!(response.risk_score, 72);
        assert_eq!(response.risk_reasons, vec!["new client", "vague description"]);
    }

    #[test]
    fn test_malformed_responses() {
        let cases = [
            r#"{"risk_score": 101, "risk_reasons": [], "proposal_draft": ""}"#,
            r#"{"risk_score": -1, "risk_reasons": [], "proposal_draft": ""}"#,
            r#"{"risk_score": "high", "risk_reasons": [], "proposal_draft": ""}"#,
            r#"{"risk_score": 10, "proposal_draft": ""}"#,
            r#"{"risk_score": 10, "risk_reasons": "one", "proposal_draft": ""}"#,
            "not json",
        ];

        for body in cases {
            let err = ScoreResponse::from_json(body).unwrap_err();
            assert!(matches!(err, CopilotError::MalformedResponse(_)), "accepted {}", body);
        }
    }
}

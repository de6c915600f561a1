use thiserror::Error;

/// Errors produced by browser control, extraction, scoring and the analysis lifecycle
#[derive(Debug, Error)]
pub enum CopilotError {
    /// Chrome could not be launched
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Could not attach to a running browser
    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// The page context could not run the extraction script at all
    #[error("Page context unavailable: {0}")]
    PageUnavailable(String),

    /// The page snapshot could not be decoded
    #[error("Failed to parse page snapshot: {0}")]
    DomParseFailed(String),

    #[error("Script evaluation failed: {0}")]
    EvaluationFailed(String),

    /// A locale table produced a pattern the regex engine rejects
    #[error("Invalid extraction rule '{rule}': {source}")]
    InvalidRule {
        rule: String,
        #[source]
        source: regex::Error,
    },

    /// The request to the scoring service did not complete
    #[error("Scoring request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The scoring service answered with a non-success status
    #[error("Scoring service returned {status}: {body}")]
    ServerStatus { status: u16, body: String },

    /// The scoring service answered with data outside the expected schema
    #[error("Malformed scoring response: {0}")]
    MalformedResponse(String),

    /// An event arrived that the current lifecycle phase does not handle
    #[error("Event '{event}' is not accepted in phase '{phase}'")]
    InvalidTransition { phase: String, event: String },

    /// Extracted data carried an error and cannot be submitted
    #[error("Extraction reported an error: {0}")]
    ExtractionRejected(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, CopilotError>;

//! Scoring service boundary
//!
//! Request and response types for the external risk scoring service, and the
//! HTTP client that talks to it.

pub mod client;
pub mod types;

pub use client::{DEFAULT_ENDPOINT, HttpScoringClient, ScoringConfig, ScoringService};
pub use types::{MAX_RISK_SCORE, ScoreRequest, ScoreResponse};

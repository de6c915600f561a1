//! # listing-audit
//!
//! Risk assessment for freelance marketplace job listings, driven over the
//! Chrome DevTools Protocol (CDP).
//!
//! ## Features
//!
//! - **Page access**: launch or attach to Chrome/Chromium and run extraction against the active tab
//! - **Extraction**: locate the active content region, read the description and client history, and parse client spend and hourly rate
//! - **Scoring**: submit extracted data to an external risk scoring service over HTTP
//! - **Rendering**: turn the service's verdict into an HTML or terminal result card
//!
//! ## Command line
//!
//! ```bash
//! # Analyze the listing open in a running browser
//! listing-audit analyze --ws-endpoint ws://127.0.0.1:9222/devtools/browser/<id>
//!
//! # Replay a saved snapshot and print the extracted data only
//! listing-audit extract --snapshot page.json
//! ```
//!
//! ## Library usage
//!
//! ```rust,no_run
//! use listing_audit::{BrowserSession, HttpScoringClient, LaunchOptions, Orchestrator, ScoringConfig, TextExtractor};
//!
//! # async fn run() -> listing_audit::Result<()> {
//! let mut session = BrowserSession::launch(LaunchOptions::default())?;
//! session.navigate("https://www.upwork.com/jobs/~0123456789")?;
//!
//! let mut extractor = TextExtractor::with_defaults()?;
//! let scorer = HttpScoringClient::new(ScoringConfig::default())?;
//!
//! let mut orchestrator = Orchestrator::new();
//! orchestrator.run(&mut session, &mut extractor, &scorer).await?;
//!
//! if let Some(fragment) = &orchestrator.view().fragment {
//!     print!("{}", fragment.to_text());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Extraction is a pure function over a [`DomTree`] snapshot, so it runs the
//! same against a live tab ([`BrowserSession`]) or a saved page ([`SnapshotAgent`]).
//!
//! ## Module Overview
//!
//! - [`agent`]: the page access capability and the snapshot-backed agent
//! - [`browser`]: browser session management and configuration
//! - [`dom`]: page snapshots, simple selectors and the region marker
//! - [`extract`]: region location, structured text selection and field parsing
//! - [`scoring`]: scoring service wire types and HTTP client
//! - [`orchestrator`]: the analysis lifecycle state machine
//! - [`render`]: result cards
//! - [`error`]: error types and result aliases

pub mod agent;
pub mod browser;
pub mod dom;
pub mod error;
pub mod extract;
pub mod orchestrator;
pub mod render;
pub mod scoring;

pub use agent::{PageAgent, PageScript, SnapshotAgent};
pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions};
pub use dom::{BoundingBox, DomTree, ElementNode, parse_selector};
pub use error::{CopilotError, Result};
pub use extract::{ExtractedJobData, ExtractionProfile, FieldParser, FinancialStats, TargetLocator, TextExtractor};
pub use orchestrator::{Effect, Event, Failure, Orchestrator, PanelView, Phase, UiSink};
pub use render::{ResultFragment, RiskLevel};
pub use scoring::{HttpScoringClient, ScoreRequest, ScoreResponse, ScoringConfig, ScoringService};

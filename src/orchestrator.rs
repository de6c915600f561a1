//! Analysis lifecycle
//!
//! ```text
//! Idle ──trigger──▶ Extracting ──data──▶ Submitting ──response──▶ Rendered
//!                        │                    │
//!                        └──────failure───────┴──────▶ Failed
//! ```
//!
//! `Rendered` and `Failed` accept a fresh trigger, which starts over at
//! `Extracting`. The trigger is disabled while a run is in flight, so at most
//! one extraction or submission is ever outstanding. Nothing is retried
//! automatically.

use crate::agent::{PageAgent, PageScript};
use crate::error::{CopilotError, Result};
use crate::extract::ExtractedJobData;
use crate::render::{self, ResultFragment};
use crate::scoring::{ScoreRequest, ScoreResponse, ScoringService};
use std::fmt;

pub const STATUS_READY: &str = "Ready";
pub const STATUS_SCANNING: &str = "Scanning page data...";
pub const STATUS_SUBMITTING: &str = "Sending for analysis...";
pub const STATUS_COMPLETE: &str = "Analysis complete";
pub const STATUS_REFRESH: &str = "Error: Please refresh the page.";
pub const STATUS_CONNECTION: &str = "Connection error. Is the scoring service running?";

pub const LABEL_ANALYZE: &str = "Analyze Job";
pub const LABEL_BUSY: &str = "Analyzing...";
pub const LABEL_AGAIN: &str = "Analyze Again";
pub const LABEL_RETRY: &str = "Retry Analysis";

/// Lifecycle phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Extracting,
    Submitting,
    Rendered,
    Failed,
}

impl Phase {
    /// Whether a user trigger is accepted in this phase
    pub fn accepts_trigger(&self) -> bool {
        matches!(self, Phase::Idle | Phase::Rendered | Phase::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Extracting => "extracting",
            Phase::Submitting => "submitting",
            Phase::Rendered => "rendered",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Why a run ended in [`Phase::Failed`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The page script could not run at all
    Injection(String),
    /// The script ran but the page is not a usable listing
    Extraction(String),
    /// The scoring exchange failed or returned a non-success status
    Transport(String),
    /// The scoring service returned data outside the expected schema
    MalformedResponse(String),
}

impl Failure {
    /// Status line shown to the user
    pub fn status(&self) -> String {
        match self {
            Failure::Injection(_) => STATUS_REFRESH.to_string(),
            Failure::Extraction(message) => message.clone(),
            Failure::Transport(_) | Failure::MalformedResponse(_) => STATUS_CONNECTION.to_string(),
        }
    }

    fn from_scoring_error(err: CopilotError) -> Self {
        match err {
            CopilotError::MalformedResponse(detail) => Failure::MalformedResponse(detail),
            other => Failure::Transport(other.to_string()),
        }
    }
}

/// Inputs to the state machine
#[derive(Debug)]
pub enum Event {
    /// The user asked for an analysis
    Trigger,
    /// The page script finished, or could not run
    ExtractionFinished(Result<ExtractedJobData>),
    /// The scoring exchange finished
    ScoringFinished(Result<ScoreResponse>),
}

impl Event {
    fn name(&self) -> &'static str {
        match self {
            Event::Trigger => "trigger",
            Event::ExtractionFinished(_) => "extraction-finished",
            Event::ScoringFinished(_) => "scoring-finished",
        }
    }
}

/// Work the driver must start after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    RunExtraction,
    Submit(ScoreRequest),
    None,
}

/// Everything a control panel displays
#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub status: String,
    pub trigger_enabled: bool,
    pub trigger_label: String,
    pub busy: bool,
    pub fragment: Option<ResultFragment>,
}

impl Default for PanelView {
    fn default() -> Self {
        Self {
            status: STATUS_READY.to_string(),
            trigger_enabled: true,
            trigger_label: LABEL_ANALYZE.to_string(),
            busy: false,
            fragment: None,
        }
    }
}

/// Receives the panel state after every transition
pub trait UiSink: Send {
    fn update(&mut self, phase: Phase, view: &PanelView);
}

impl<F> UiSink for F
where
    F: FnMut(Phase, &PanelView) + Send,
{
    fn update(&mut self, phase: Phase, view: &PanelView) {
        self(phase, view)
    }
}

/// Sequences extraction, submission and rendering, and owns the panel state
#[derive(Default)]
pub struct Orchestrator {
    phase: Phase,
    view: PanelView,
    failure: Option<Failure>,
    sink: Option<Box<dyn UiSink>>,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: report every transition to `sink`
    pub fn with_sink(mut self, sink: impl UiSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn view(&self) -> &PanelView {
        &self.view
    }

    /// Cause of the last failure, while in [`Phase::Failed`]
    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    /// Apply one event
    ///
    /// Each phase handles exactly one kind of event; anything else is an
    /// [`CopilotError::InvalidTransition`] and leaves the state untouched.
    pub fn handle(&mut self, event: Event) -> Result<Effect> {
        let effect = match (self.phase, event) {
            (phase, Event::Trigger) if phase.accepts_trigger() => {
                self.failure = None;
                self.view = PanelView {
                    status: STATUS_SCANNING.to_string(),
                    trigger_enabled: false,
                    trigger_label: LABEL_BUSY.to_string(),
                    busy: true,
                    fragment: None,
                };
                self.enter(Phase::Extracting);
                Effect::RunExtraction
            }

            (Phase::Extracting, Event::ExtractionFinished(outcome)) => match outcome {
                Err(err) => {
                    log::warn!("Page script could not run: {}", err);
                    self.fail(Failure::Injection(err.to_string()));
                    Effect::None
                }
                Ok(data) => match ScoreRequest::try_from(data) {
                    Err(err) => {
                        let message = match err {
                            CopilotError::ExtractionRejected(message) => message,
                            other => other.to_string(),
                        };
                        log::warn!("Extraction rejected the page: {}", message);
                        self.fail(Failure::Extraction(message));
                        Effect::None
                    }
                    Ok(request) => {
                        self.view.status = STATUS_SUBMITTING.to_string();
                        self.enter(Phase::Submitting);
                        Effect::Submit(request)
                    }
                },
            },

            (Phase::Submitting, Event::ScoringFinished(outcome)) => {
                match outcome.and_then(|response| response.validate().map(|_| response)) {
                    Err(err) => {
                        log::warn!("Scoring failed: {}", err);
                        self.fail(Failure::from_scoring_error(err));
                    }
                    Ok(response) => {
                        self.view = PanelView {
                            status: STATUS_COMPLETE.to_string(),
                            trigger_enabled: true,
                            trigger_label: LABEL_AGAIN.to_string(),
                            busy: false,
                            fragment: Some(render::render(&response)),
                        };
                        self.enter(Phase::Rendered);
                    }
                }
                Effect::None
            }

            (phase, event) => {
                return Err(CopilotError::InvalidTransition {
                    phase: phase.to_string(),
                    event: event.name().to_string(),
                });
            }
        };

        Ok(effect)
    }

    /// Run one full analysis: extract through `agent`, score through `scorer`
    ///
    /// Failures end in [`Phase::Failed`] rather than an error; `Err` is only
    /// returned when the machine is not in a phase that accepts a trigger.
    pub async fn run(
        &mut self,
        agent: &mut dyn PageAgent,
        script: &mut dyn PageScript,
        scorer: &dyn ScoringService,
    ) -> Result<Phase> {
        if self.handle(Event::Trigger)? != Effect::RunExtraction {
            return Ok(self.phase);
        }

        let extracted = agent.execute(script).await;
        if let Effect::Submit(request) = self.handle(Event::ExtractionFinished(extracted))? {
            let scored = scorer.score(&request).await;
            self.handle(Event::ScoringFinished(scored))?;
        }

        Ok(self.phase)
    }

    fn fail(&mut self, failure: Failure) {
        self.view = PanelView {
            status: failure.status(),
            trigger_enabled: true,
            trigger_label: LABEL_RETRY.to_string(),
            busy: false,
            fragment: None,
        };
        self.failure = Some(failure);
        self.enter(Phase::Failed);
    }

    fn enter(&mut self, phase: Phase) {
        log::info!("Lifecycle {} -> {}: {}", self.phase, phase, self.view.status);
        self.phase = phase;
        if let Some(sink) = self.sink.as_mut() {
            sink.update(self.phase, &self.view);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::FinancialStats;

    fn data() -> ExtractedJobData {
        ExtractedJobData {
            description: "Build a scraper".to_string(),
            reviews: "No reviews found.".to_string(),
            client_stats: FinancialStats::default(),
            error: None,
        }
    }

    fn response(score: u8) -> ScoreResponse {
        ScoreResponse {
            risk_score: score,
            risk_reasons: vec!["new client".to_string()],
            proposal_draft: "Hello".to_string(),
        }
    }

    #[test]
    fn test_initial_view() {
        let orchestrator = Orchestrator::new();
        assert_eq!(orchestrator.phase(), Phase::Idle);
        assert!(orchestrator.view().trigger_enabled);
        assert_eq!(orchestrator.view().trigger_label, LABEL_ANALYZE);
    }

    #[test]
    fn test_happy_path() {
        let mut o = Orchestrator::new();

        assert_eq!(o.handle(Event::Trigger).unwrap(), Effect::RunExtraction);
        assert_eq!(o.phase(), Phase::Extracting);
        assert!(!o.view().trigger_enabled);
        assert!(o.view().busy);
        assert_eq!(o.view().status, STATUS_SCANNING);

        let effect = o.handle(Event::ExtractionFinished(Ok(data()))).unwrap();
        assert!(matches!(effect, Effect::Submit(ref r) if r.job_description == "Build a scraper"));
        assert_eq!(o.phase(), Phase::Submitting);
        assert_eq!(o.view().status, STATUS_SUBMITTING);
        assert!(!o.view().trigger_enabled);

        assert_eq!(o.handle(Event::ScoringFinished(Ok(response(30)))).unwrap(), Effect::None);
        assert_eq!(o.phase(), Phase::Rendered);
        assert_eq!(o.view().trigger_label, LABEL_AGAIN);
        assert_eq!(o.view().status, STATUS_COMPLETE);
        assert!(o.view().trigger_enabled);
        assert!(!o.view().busy);
        assert_eq!(o.view().fragment.as_ref().unwrap().risk_score, 30);
    }

    #[test]
    fn test_injection_failure() {
        let mut o = Orchestrator::new();
        o.handle(Event::Trigger).unwrap();
        o.handle(Event::ExtractionFinished(Err(CopilotError::PageUnavailable("gone".to_string()))))
            .unwrap();

        assert_eq!(o.phase(), Phase::Failed);
        assert_eq!(o.view().status, STATUS_REFRESH);
        assert_eq!(o.view().trigger_label, LABEL_RETRY);
        assert!(o.view().trigger_enabled);
        assert!(matches!(o.failure(), Some(Failure::Injection(_))));
    }

    #[test]
    fn test_extraction_error_surfaced_verbatim() {
        let mut o = Orchestrator::new();
        o.handle(Event::Trigger).unwrap();
        let effect = o
            .handle(Event::ExtractionFinished(Ok(ExtractedJobData::failed("Not a job page"))))
            .unwrap();

        assert_eq!(effect, Effect::None);
        assert_eq!(o.phase(), Phase::Failed);
        assert_eq!(o.view().status, "Not a job page");
        assert!(o.view().trigger_enabled);
        assert!(!o.view().busy);

        // The failed run leaves the machine ready for another trigger
        assert_eq!(o.handle(Event::Trigger).unwrap(), Effect::RunExtraction);
    }

    #[test]
    fn test_scoring_failures_share_connectivity_message() {
        let failures = [
            CopilotError::ServerStatus {
                status: 500,
                body: "boom".to_string(),
            },
            CopilotError::MalformedResponse("missing field".to_string()),
        ];

        for err in failures {
            let mut o = Orchestrator::new();
            o.handle(Event::Trigger).unwrap();
            o.handle(Event::ExtractionFinished(Ok(data()))).unwrap();
            o.handle(Event::ScoringFinished(Err(err))).unwrap();

            assert_eq!(o.phase(), Phase::Failed);
            assert_eq!(o.view().status, STATUS_CONNECTION);
            assert!(o.view().fragment.is_none());
        }
    }

    #[test]
    fn test_out_of_range_score_is_malformed() {
        let mut o = Orchestrator::new();
        o.handle(Event::Trigger).unwrap();
        o.handle(Event::ExtractionFinished(Ok(data()))).unwrap();
        o.handle(Event::ScoringFinished(Ok(response(150)))).unwrap();

        assert!(matches!(o.failure(), Some(Failure::MalformedResponse(_))));
        assert!(o.view().fragment.is_none());
    }

    #[test]
    fn test_unexpected_events_rejected() {
        let mut o = Orchestrator::new();
        assert!(o.handle(Event::ScoringFinished(Ok(response(1)))).is_err());
        assert!(o.handle(Event::ExtractionFinished(Ok(data()))).is_err());
        assert_eq!(o.phase(), Phase::Idle);

        o.handle(Event::Trigger).unwrap();
        let err = o.handle(Event::Trigger).unwrap_err();
        assert!(matches!(err, CopilotError::InvalidTransition { ref phase, .. } if phase == "extracting"));
        assert!(o.handle(Event::ScoringFinished(Ok(response(1)))).is_err());
        assert_eq!(o.phase(), Phase::Extracting);

        o.handle(Event::ExtractionFinished(Ok(data()))).unwrap();
        assert!(o.handle(Event::Trigger).is_err());
        assert!(o.handle(Event::ExtractionFinished(Ok(data()))).is_err());
        assert_eq!(o.phase(), Phase::Submitting);
    }

    #[test]
    fn test_retrigger_from_terminal_phases() {
        let mut o = Orchestrator::new();
        o.handle(Event::Trigger).unwrap();
        o.handle(Event::ExtractionFinished(Err(CopilotError::PageUnavailable("x".to_string()))))
            .unwrap();
        assert_eq!(o.handle(Event::Trigger).unwrap(), Effect::RunExtraction);
        assert!(o.failure().is_none());

        o.handle(Event::ExtractionFinished(Ok(data()))).unwrap();
        o.handle(Event::ScoringFinished(Ok(response(10)))).unwrap();
        assert_eq!(o.phase(), Phase::Rendered);
        assert_eq!(o.handle(Event::Trigger).unwrap(), Effect::RunExtraction);
        assert!(o.view().fragment.is_none());
    }

    #[test]
    fn test_sink_sees_every_transition() {
        use std::sync::{Arc, Mutex};

        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let mut o = Orchestrator::new().with_sink(move |phase: Phase, view: &PanelView| {
            log.lock().unwrap().push((phase, view.trigger_enabled));
        });

        o.handle(Event::Trigger).unwrap();
        o.handle(Event::ExtractionFinished(Ok(data()))).unwrap();
        o.handle(Event::ScoringFinished(Ok(response(10)))).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(Phase::Extracting, false), (Phase::Submitting, false), (Phase::Rendered, true)]
        );
    }
}

//! Page access capability
//!
//! The extraction logic never reads a page directly. A [`PageAgent`] runs a
//! [`PageScript`] against whatever page it hosts and hands back the result,
//! or reports that the page could not be reached. [`BrowserSession`](crate::BrowserSession)
//! hosts a live Chrome tab; [`SnapshotAgent`] hosts an in-memory snapshot.

use crate::dom::DomTree;
use crate::error::{CopilotError, Result};
use crate::extract::ExtractedJobData;
use async_trait::async_trait;
use std::path::Path;

/// A pure function over a page snapshot
pub trait PageScript: Send {
    fn run(&mut self, page: &mut DomTree) -> ExtractedJobData;
}

impl<F> PageScript for F
where
    F: FnMut(&mut DomTree) -> ExtractedJobData + Send,
{
    fn run(&mut self, page: &mut DomTree) -> ExtractedJobData {
        self(page)
    }
}

/// Runs page scripts inside a host-managed page
///
/// An `Err` means the script could not run at all; problems the script itself
/// detects travel inside [`ExtractedJobData::error`].
#[async_trait]
pub trait PageAgent: Send {
    async fn execute(&mut self, script: &mut dyn PageScript) -> Result<ExtractedJobData>;
}

/// Agent over a snapshot held in memory
///
/// The snapshot persists across runs, so marker state carries over exactly as
/// it would on a live page.
#[derive(Debug, Clone, Default)]
pub struct SnapshotAgent {
    page: Option<DomTree>,
}

impl SnapshotAgent {
    pub fn new(page: DomTree) -> Self {
        Self { page: Some(page) }
    }

    /// An agent with no page loaded; every run fails as unavailable
    pub fn unavailable() -> Self {
        Self { page: None }
    }

    /// Load a snapshot saved as JSON
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let page = DomTree::from_json(&json)?;
        log::info!("Loaded page snapshot from {} ({} elements)", path.display(), page.count_elements());
        Ok(Self::new(page))
    }

    pub fn page(&self) -> Option<&DomTree> {
        self.page.as_ref()
    }

    pub fn page_mut(&mut self) -> Option<&mut DomTree> {
        self.page.as_mut()
    }
}

#[async_trait]
impl PageAgent for SnapshotAgent {
    async fn execute(&mut self, script: &mut dyn PageScript) -> Result<ExtractedJobData> {
        let page = self
            .page
            .as_mut()
            .ok_or_else(|| CopilotError::PageUnavailable("no page snapshot loaded".to_string()))?;
        Ok(script.run(page))
    }
}

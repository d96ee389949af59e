//! Mock media probe for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::media::{MediaError, MediaProbe, MediaReport, ProbeFidelity};

/// Mock implementation of the MediaProbe trait.
///
/// Returns the configured report for every path. A separate report can be
/// served for the fast pass to exercise the two-pass strategy.
#[derive(Debug, Clone)]
pub struct MockMediaProbe {
    report: Arc<RwLock<MediaReport>>,
    fast_report: Arc<RwLock<Option<MediaReport>>>,
    text_report: Arc<RwLock<String>>,
    fidelities: Arc<RwLock<Vec<ProbeFidelity>>>,
    next_error: Arc<RwLock<Option<MediaError>>>,
}

impl MockMediaProbe {
    /// Create a probe that always answers with `report`.
    pub fn new(report: MediaReport) -> Self {
        Self {
            report: Arc::new(RwLock::new(report)),
            fast_report: Arc::new(RwLock::new(None)),
            text_report: Arc::new(RwLock::new("General\nComplete name : a.mkv\n".to_string())),
            fidelities: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Serve `report` for fast passes only.
    pub async fn set_fast_report(&self, report: MediaReport) {
        *self.fast_report.write().await = Some(report);
    }

    pub async fn set_text_report(&self, text: impl Into<String>) {
        *self.text_report.write().await = text.into();
    }

    /// Fail the next probe with `error`.
    pub async fn set_next_error(&self, error: MediaError) {
        *self.next_error.write().await = Some(error);
    }

    /// Fidelities requested so far, in order.
    pub async fn recorded_fidelities(&self) -> Vec<ProbeFidelity> {
        self.fidelities.read().await.clone()
    }
}

#[async_trait]
impl MediaProbe for MockMediaProbe {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(
        &self,
        _path: &Path,
        fidelity: ProbeFidelity,
    ) -> Result<MediaReport, MediaError> {
        self.fidelities.write().await.push(fidelity);

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        if fidelity == ProbeFidelity::Fast {
            if let Some(report) = self.fast_report.read().await.clone() {
                return Ok(report);
            }
        }
        Ok(self.report.read().await.clone())
    }

    async fn text_report(&self, _path: &Path) -> Result<String, MediaError> {
        Ok(self.text_report.read().await.clone())
    }
}

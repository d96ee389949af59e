//! Mock provider API for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::upload::{
    download_url, Provider, ProviderApi, ProviderError, TorrentPayload, UploadForm, UploadResult,
};

/// A recorded submission attempt.
#[derive(Debug, Clone)]
pub struct RecordedSubmission {
    pub provider: String,
    pub torrent_file_name: String,
    pub form: UploadForm,
}

/// A recorded edit attempt.
#[derive(Debug, Clone)]
pub struct RecordedEdit {
    pub provider: String,
    pub id: u64,
    pub form: UploadForm,
}

/// Mock implementation of the ProviderApi trait.
///
/// Submissions succeed with `{domain}/view/{n}` where `n` counts accepted
/// submissions, starting at 1. Sessions are invalid unless set otherwise.
///
/// # Example
///
/// ```rust,ignore
/// let api = MockProviderApi::new();
/// api.fail_submissions_for("nyaa", "banned").await;
/// api.set_session_valid(true).await;
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockProviderApi {
    submissions: Arc<RwLock<Vec<RecordedSubmission>>>,
    edits: Arc<RwLock<Vec<RecordedEdit>>>,
    /// Providers whose submissions are always rejected, with the message.
    rejecting: Arc<RwLock<HashMap<String, String>>>,
    /// One-shot errors returned by the next submissions.
    queued_errors: Arc<RwLock<VecDeque<ProviderError>>>,
    session_valid: Arc<RwLock<bool>>,
    /// Number of upcoming edits answered with "not accepted".
    edit_failures: Arc<RwLock<usize>>,
    accepted: Arc<RwLock<u64>>,
}

impl MockProviderApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every submission to `provider` with `message`.
    pub async fn fail_submissions_for(&self, provider: &str, message: &str) {
        self.rejecting
            .write()
            .await
            .insert(provider.to_string(), message.to_string());
    }

    /// Queue an error for the next submission.
    pub async fn push_submit_error(&self, error: ProviderError) {
        self.queued_errors.write().await.push_back(error);
    }

    pub async fn set_session_valid(&self, valid: bool) {
        *self.session_valid.write().await = valid;
    }

    /// Answer the next `count` edits as not accepted.
    pub async fn set_edit_failures(&self, count: usize) {
        *self.edit_failures.write().await = count;
    }

    pub async fn submissions(&self) -> Vec<RecordedSubmission> {
        self.submissions.read().await.clone()
    }

    pub async fn edits(&self) -> Vec<RecordedEdit> {
        self.edits.read().await.clone()
    }
}

#[async_trait]
impl ProviderApi for MockProviderApi {
    async fn check_session(&self, _provider: &Provider) -> Result<bool, ProviderError> {
        Ok(*self.session_valid.read().await)
    }

    async fn submit(
        &self,
        provider: &Provider,
        torrent: &TorrentPayload,
        form: &UploadForm,
    ) -> Result<UploadResult, ProviderError> {
        self.submissions.write().await.push(RecordedSubmission {
            provider: provider.name.clone(),
            torrent_file_name: torrent.file_name.clone(),
            form: form.clone(),
        });

        if let Some(error) = self.queued_errors.write().await.pop_front() {
            return Err(error);
        }
        if let Some(message) = self.rejecting.read().await.get(&provider.name) {
            return Err(ProviderError::Rejected(message.clone()));
        }

        let mut accepted = self.accepted.write().await;
        *accepted += 1;
        let url = format!("{}/view/{}", provider.domain, *accepted);
        Ok(UploadResult {
            download_url: download_url(&url),
            url,
            id: *accepted,
            name: form.display_name.clone(),
        })
    }

    async fn edit(
        &self,
        provider: &Provider,
        id: u64,
        form: &UploadForm,
    ) -> Result<bool, ProviderError> {
        self.edits.write().await.push(RecordedEdit {
            provider: provider.name.clone(),
            id,
            form: form.clone(),
        });

        let mut failures = self.edit_failures.write().await;
        if *failures > 0 {
            *failures -= 1;
            return Ok(false);
        }
        Ok(true)
    }
}

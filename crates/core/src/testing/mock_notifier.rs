//! Mock notifier for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::notify::{Notifier, NotifyError};
use crate::upload::UploadResult;

/// Mock implementation of the Notifier trait. Records `(provider, result)`.
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    sent: Arc<RwLock<Vec<(String, UploadResult)>>>,
    failing: Arc<RwLock<bool>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_failing(&self, failing: bool) {
        *self.failing.write().await = failing;
    }

    pub async fn sent(&self) -> Vec<(String, UploadResult)> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn notify(&self, provider: &str, result: &UploadResult) -> Result<(), NotifyError> {
        if *self.failing.read().await {
            return Err(NotifyError::Request("connection refused".to_string()));
        }
        self.sent
            .write()
            .await
            .push((provider.to_string(), result.clone()));
        Ok(())
    }
}

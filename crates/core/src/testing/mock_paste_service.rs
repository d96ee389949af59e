//! Mock paste service for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::paste::{Paste, PasteError, PasteService};

/// Mock implementation of the PasteService trait.
///
/// Each publish answers `https://paste.test/{n}` and records the text.
#[derive(Debug, Clone, Default)]
pub struct MockPasteService {
    published: Arc<RwLock<Vec<String>>>,
    failing: Arc<RwLock<bool>>,
}

impl MockPasteService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_failing(&self, failing: bool) {
        *self.failing.write().await = failing;
    }

    /// Texts published so far.
    pub async fn published(&self) -> Vec<String> {
        self.published.read().await.clone()
    }
}

#[async_trait]
impl PasteService for MockPasteService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn publish(&self, text: &str, edit_code: Option<&str>) -> Result<Paste, PasteError> {
        if *self.failing.read().await {
            return Err(PasteError::Rejected {
                status: 503,
                body: "unavailable".to_string(),
            });
        }

        let mut published = self.published.write().await;
        published.push(text.to_string());
        Ok(Paste {
            url: format!("https://paste.test/{}", published.len()),
            edit_code: edit_code.unwrap_or("generated").to_string(),
        })
    }
}

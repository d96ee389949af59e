//! Provider uploads.
//!
//! [`ProviderApi`] covers the wire calls (session check, submission, edit);
//! [`UploadOrchestrator`] sequences them per provider with retries.

mod client;
mod error;
mod orchestrator;
mod types;

pub use client::{HttpProviderApi, ProviderApi};
pub use error::ProviderError;
pub use orchestrator::{ProviderOutcome, ReleaseUpload, SnapshotSource, UploadOrchestrator};
pub use types::{
    download_url, first_error_message, parse_submit_response, Provider, ReleaseFlags,
    TorrentPayload, UploadForm, UploadResult,
};

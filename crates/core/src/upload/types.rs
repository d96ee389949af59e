//! Provider and submission types.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::category::Category;
use crate::config::{ConfigError, Credentials, ProviderConfig, SessionCookies};

use super::error::ProviderError;

static VIEW_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"view/(\d+)").unwrap());

/// An upload destination, resolved from configuration.
#[derive(Debug, Clone)]
pub struct Provider {
    pub name: String,
    /// Base URL without trailing slash.
    pub domain: String,
    pub proxy: Option<String>,
    pub credentials: Credentials,
    pub announces: Vec<String>,
    /// Browser session used for the profile check and post-upload edits.
    pub cookies: Option<SessionCookies>,
}

impl Provider {
    /// Resolve a provider entry. An unreadable cookies file is a warning and
    /// leaves the provider without a session.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let credentials = Credentials::parse(&config.credentials)?;

        let cookies = match &config.cookies_file {
            Some(path) => match SessionCookies::load(path) {
                Ok(cookies) if !cookies.is_empty() => Some(cookies),
                Ok(_) => None,
                Err(e) => {
                    warn!(provider = %config.name, error = %e, "Ignoring cookies file");
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            name: config.name.clone(),
            domain: config.domain.trim_end_matches('/').to_string(),
            proxy: config.proxy.clone().filter(|p| !p.is_empty()),
            credentials,
            announces: config.announces.clone(),
            cookies,
        })
    }

    pub fn has_session(&self) -> bool {
        self.cookies.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// Release flags sent with the submission and the edit form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReleaseFlags {
    pub anonymous: bool,
    pub hidden: bool,
    pub complete: bool,
    pub remake: bool,
    pub trusted: bool,
}

/// Everything a provider needs besides the torrent bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadForm {
    pub display_name: String,
    pub category: Category,
    /// Information link.
    pub information: String,
    pub description: String,
    pub flags: ReleaseFlags,
}

impl UploadForm {
    /// JSON document of the `torrent_data` multipart field.
    pub fn torrent_data(&self) -> Value {
        serde_json::json!({
            "name": self.display_name,
            "category": self.category.provider_id(),
            "information": self.information,
            "description": self.description,
            "anonymous": self.flags.anonymous,
            "hidden": self.flags.hidden,
            "complete": self.flags.complete,
            "remake": self.flags.remake,
            "trusted": self.flags.trusted,
        })
    }

    /// Text fields of the web edit form. Checkboxes are only sent when set.
    pub fn edit_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("display_name", self.display_name.clone())];
        let checkboxes = [
            ("is_anonymous", self.flags.anonymous),
            ("is_remake", self.flags.remake),
            ("is_complete", self.flags.complete),
            ("is_hidden", self.flags.hidden),
        ];
        fields.extend(
            checkboxes
                .into_iter()
                .filter(|(_, set)| *set)
                .map(|(name, _)| (name, "y".to_string())),
        );
        fields.push(("category", self.category.provider_id().to_string()));
        fields.push(("information", self.information.clone()));
        fields.push(("description", self.description.clone()));
        fields.push(("submit", "Save Changes".to_string()));
        fields
    }
}

/// The `.torrent` file sent with a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentPayload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// Page URL.
    pub url: String,
    pub id: u64,
    pub download_url: String,
    /// Display name the release was submitted under.
    pub name: String,
}

/// `…/view/{id}` → `…/download/{id}.torrent`.
pub fn download_url(page_url: &str) -> String {
    VIEW_ID_RE
        .replace(page_url, "download/${1}.torrent")
        .into_owned()
}

/// Interpret an upload API response body.
pub fn parse_submit_response(
    status: u16,
    body: &str,
    display_name: &str,
) -> Result<UploadResult, ProviderError> {
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) if !(200..300).contains(&status) => return Err(ProviderError::http(status, body)),
        Err(e) => return Err(ProviderError::MalformedResponse(e.to_string())),
    };

    if let Some(errors) = value.get("errors").filter(|e| !e.is_null()) {
        return Err(ProviderError::Rejected(first_error_message(errors)));
    }

    let url = value
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::MalformedResponse(format!("missing url in {}", body)))?;
    let id = match value.get("id") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| ProviderError::MalformedResponse(format!("missing id in {}", body)))?;

    Ok(UploadResult {
        url: url.to_string(),
        id,
        download_url: download_url(url),
        name: display_name.to_string(),
    })
}

/// The errors field is a string, a list (first entry) or a map of field to
/// messages (first field in response order, first message).
pub fn first_error_message(errors: &Value) -> String {
    match errors {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.first().map(value_text).unwrap_or_default(),
        Value::Object(map) => match map.iter().next() {
            Some((field, messages)) => {
                let message = match messages {
                    Value::Array(items) => items.first().map(value_text).unwrap_or_default(),
                    other => value_text(other),
                };
                format!("{}: {}", field, message)
            }
            None => String::new(),
        },
        other => other.to_string(),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

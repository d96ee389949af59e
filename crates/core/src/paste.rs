//! Paste service for the full media report.

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::REFERER;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::PasteConfig;
use crate::retry::RetryPolicy;

#[derive(Debug, Error)]
pub enum PasteError {
    #[error("Paste request failed: {0}")]
    Request(String),

    #[error("No csrftoken cookie returned by {0}")]
    MissingCsrfToken(String),

    #[error("Paste rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Unexpected paste response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for PasteError {
    fn from(e: reqwest::Error) -> Self {
        Self::Request(e.to_string())
    }
}

/// A created paste.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Paste {
    pub url: String,
    pub edit_code: String,
}

/// Publishes text documents.
#[async_trait]
pub trait PasteService: Send + Sync {
    fn name(&self) -> &str;

    async fn publish(&self, text: &str, edit_code: Option<&str>) -> Result<Paste, PasteError>;
}

#[derive(Debug, Deserialize)]
struct NewPasteResponse {
    url: Option<String>,
    edit_code: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// rentry.co client: CSRF token from the landing page, then `POST /api/new`.
///
/// The landing page's cookies land in a shared jar that also sends them
/// back with the POST.
pub struct RentryClient {
    client: Client,
    jar: Arc<Jar>,
    base: Url,
    base_url: String,
    policy: RetryPolicy,
}

impl RentryClient {
    pub fn new(config: &PasteConfig) -> Result<Self, PasteError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let base = Url::parse(&base_url)
            .map_err(|e| PasteError::Request(format!("invalid paste URL {}: {}", base_url, e)))?;
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(jar.clone())
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            jar,
            base,
            base_url,
            policy: RetryPolicy::fixed(
                config.max_attempts,
                Duration::from_millis(config.retry_delay_ms),
            ),
        })
    }

    async fn csrf_token(&self) -> Result<String, PasteError> {
        self.client.get(self.base.clone()).send().await?;

        let cookies = self.jar.cookies(&self.base);
        cookies
            .as_ref()
            .and_then(|header| header.to_str().ok())
            .and_then(|header| {
                header.split("; ").find_map(|pair| {
                    let (name, value) = pair.split_once('=')?;
                    (name == "csrftoken").then(|| value.to_string())
                })
            })
            .ok_or_else(|| PasteError::MissingCsrfToken(self.base_url.clone()))
    }

    async fn try_publish(&self, text: &str, edit_code: &str) -> Result<Paste, PasteError> {
        let token = self.csrf_token().await?;

        let response = self
            .client
            .post(format!("{}/api/new", self.base_url))
            .header(REFERER, &self.base_url)
            .form(&[
                ("csrfmiddlewaretoken", token.as_str()),
                ("edit_code", edit_code),
                ("text", text),
                ("url", ""),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(PasteError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: NewPasteResponse = serde_json::from_str(&body)
            .map_err(|e| PasteError::MalformedResponse(e.to_string()))?;
        match (parsed.url, parsed.edit_code) {
            (Some(url), Some(edit_code)) => Ok(Paste { url, edit_code }),
            _ => Err(PasteError::MalformedResponse(
                parsed.content.unwrap_or(body),
            )),
        }
    }
}

#[async_trait]
impl PasteService for RentryClient {
    fn name(&self) -> &str {
        "rentry"
    }

    async fn publish(&self, text: &str, edit_code: Option<&str>) -> Result<Paste, PasteError> {
        let edit_code = edit_code.unwrap_or_default();
        debug!(bytes = text.len(), "Publishing paste");

        let paste = self
            .policy
            .run("paste", |_| self.try_publish(text, edit_code), |_| true)
            .await?;
        info!(url = %paste.url, "Media report published");
        Ok(paste)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> PasteConfig {
        PasteConfig {
            base_url: server.uri(),
            max_attempts: 2,
            retry_delay_ms: 1,
        }
    }

    async fn mount_landing(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "csrftoken=tok123; Path=/; SameSite=Lax"),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_publish() {
        let server = MockServer::start().await;
        mount_landing(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/new"))
            .and(header("cookie", "csrftoken=tok123"))
            .and(body_string_contains("csrfmiddlewaretoken=tok123"))
            .and(body_string_contains("edit_code=secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "200",
                "content": "OK",
                "url": "https://rentry.co/abcd",
                "edit_code": "secret"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RentryClient::new(&config(&server)).unwrap();
        let paste = client.publish("General\n...", Some("secret")).await.unwrap();
        assert_eq!(paste.url, "https://rentry.co/abcd");
        assert_eq!(paste.edit_code, "secret");
    }

    #[tokio::test]
    async fn test_landing_cookies_are_sent_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "sessionid=s1; Path=/; HttpOnly")
                    .append_header("set-cookie", "csrftoken=tok456; Path=/"),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "url": "https://rentry.co/efgh",
                "edit_code": "generated"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RentryClient::new(&config(&server)).unwrap();
        let paste = client.publish("text", None).await.unwrap();
        assert_eq!(paste.edit_code, "generated");

        let requests = server.received_requests().await.unwrap();
        let post = requests
            .iter()
            .find(|r| r.method.as_str() == "POST")
            .unwrap();
        let cookie = post.headers.get("cookie").unwrap().to_str().unwrap();
        assert!(cookie.contains("sessionid=s1"));
        assert!(cookie.contains("csrftoken=tok456"));
        assert!(String::from_utf8_lossy(&post.body).contains("csrfmiddlewaretoken=tok456"));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = RentryClient::new(&PasteConfig {
            base_url: "not a url".to_string(),
            max_attempts: 1,
            retry_delay_ms: 1,
        })
        .err()
        .unwrap();
        assert!(matches!(err, PasteError::Request(_)));
    }

    #[tokio::test]
    async fn test_missing_token_retries_then_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let client = RentryClient::new(&config(&server)).unwrap();
        let err = client.publish("text", None).await.unwrap_err();
        assert!(matches!(err, PasteError::MissingCsrfToken(_)));
    }

    #[tokio::test]
    async fn test_error_body() {
        let server = MockServer::start().await;
        mount_landing(&server).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "400",
                "content": "Text too long"
            })))
            .mount(&server)
            .await;

        let client = RentryClient::new(&config(&server)).unwrap();
        let err = client.publish("text", None).await.unwrap_err();
        assert!(err.to_string().contains("Text too long"));
    }
}

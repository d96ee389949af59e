//! Provider HTTP API.

use async_trait::async_trait;
use reqwest::header::{COOKIE, ORIGIN, REFERER};
use reqwest::{multipart, redirect, Client, Proxy, StatusCode};
use std::time::Duration;
use tracing::debug;

use super::error::ProviderError;
use super::types::{parse_submit_response, Provider, TorrentPayload, UploadForm, UploadResult};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:136.0) Gecko/20100101 Firefox/136.0";

/// Operations a provider supports.
#[async_trait]
pub trait ProviderApi: Send + Sync {
    /// Whether the stored session cookies are still accepted.
    async fn check_session(&self, provider: &Provider) -> Result<bool, ProviderError>;

    /// Submit a release through the upload API.
    async fn submit(
        &self,
        provider: &Provider,
        torrent: &TorrentPayload,
        form: &UploadForm,
    ) -> Result<UploadResult, ProviderError>;

    /// Rewrite an uploaded release through the web edit form.
    /// Returns whether the provider accepted the edit.
    async fn edit(
        &self,
        provider: &Provider,
        id: u64,
        form: &UploadForm,
    ) -> Result<bool, ProviderError>;
}

/// reqwest implementation of the nyaa-style upload API and edit form.
pub struct HttpProviderApi {
    timeout: Duration,
    client: Client,
}

impl HttpProviderApi {
    pub fn new(timeout_secs: u64) -> Result<Self, ProviderError> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = Self::build_client(timeout, None)?;
        Ok(Self { timeout, client })
    }

    // Redirects are not followed: the edit form answers 302 on success.
    fn build_client(timeout: Duration, proxy: Option<&str>) -> Result<Client, ProviderError> {
        let mut builder = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(redirect::Policy::none());
        if let Some(proxy) = proxy {
            let proxy = Proxy::all(proxy).map_err(|e| ProviderError::Client(e.to_string()))?;
            builder = builder.proxy(proxy);
        }
        builder.build().map_err(|e| ProviderError::Client(e.to_string()))
    }

    fn client_for(&self, provider: &Provider) -> Result<Client, ProviderError> {
        match &provider.proxy {
            Some(proxy) => Self::build_client(self.timeout, Some(proxy)),
            None => Ok(self.client.clone()),
        }
    }
}

#[async_trait]
impl ProviderApi for HttpProviderApi {
    async fn check_session(&self, provider: &Provider) -> Result<bool, ProviderError> {
        let Some(cookies) = provider.cookies.as_ref().filter(|c| !c.is_empty()) else {
            return Ok(false);
        };

        let response = self
            .client_for(provider)?
            .get(format!("{}/profile", provider.domain))
            .header(COOKIE, cookies.header_value())
            .header("cache-control", "no-cache")
            .send()
            .await?;

        debug!(provider = %provider.name, status = response.status().as_u16(), "Session check");
        Ok(response.status() == StatusCode::OK)
    }

    async fn submit(
        &self,
        provider: &Provider,
        torrent: &TorrentPayload,
        form: &UploadForm,
    ) -> Result<UploadResult, ProviderError> {
        let torrent_part = multipart::Part::bytes(torrent.bytes.clone())
            .file_name(torrent.file_name.clone())
            .mime_str("application/x-bittorrent")
            .map_err(|e| ProviderError::Client(e.to_string()))?;
        let body = multipart::Form::new()
            .part("torrent", torrent_part)
            .text("torrent_data", form.torrent_data().to_string());

        let response = self
            .client_for(provider)?
            .post(format!("{}/api/v2/upload", provider.domain))
            .basic_auth(&provider.credentials.username, Some(&provider.credentials.password))
            .multipart(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        debug!(provider = %provider.name, status, "Upload response received");
        parse_submit_response(status, &text, &form.display_name)
    }

    async fn edit(
        &self,
        provider: &Provider,
        id: u64,
        form: &UploadForm,
    ) -> Result<bool, ProviderError> {
        let edit_url = format!("{}/view/{}/edit", provider.domain, id);
        let body = form
            .edit_fields()
            .into_iter()
            .fold(multipart::Form::new(), |body, (name, value)| {
                body.text(name, value)
            });

        let mut request = self
            .client_for(provider)?
            .post(&edit_url)
            .header(ORIGIN, &provider.domain)
            .header(REFERER, &edit_url)
            .multipart(body);
        if let Some(cookies) = &provider.cookies {
            request = request.header(COOKIE, cookies.header_value());
        }

        let response = request.send().await?;
        debug!(provider = %provider.name, id, status = response.status().as_u16(), "Edit response");
        Ok(response.status() == StatusCode::FOUND)
    }
}

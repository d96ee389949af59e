//! Public tracker list.

use reqwest::Client;
use tracing::debug;

use super::error::TorrentError;

/// Fetch a newline-separated tracker list.
pub async fn fetch_public_trackers(client: &Client, url: &str) -> Result<Vec<String>, TorrentError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| TorrentError::TrackerFetch(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(TorrentError::TrackerFetch(format!("HTTP {}", status)));
    }

    let body = response
        .text()
        .await
        .map_err(|e| TorrentError::TrackerFetch(e.to_string()))?;

    let trackers = parse_tracker_list(&body);
    debug!(count = trackers.len(), "Fetched public trackers");
    Ok(trackers)
}

/// Non-empty trimmed lines.
pub fn parse_tracker_list(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Append `extra` to `base`, skipping URLs already present.
pub fn merge_announces(base: &mut Vec<String>, extra: impl IntoIterator<Item = String>) {
    for url in extra {
        if !base.contains(&url) {
            base.push(url);
        }
    }
}

//! Public tracker list loading
//!
//! The registry refreshes its tracker list once at construction from a
//! newline-delimited endpoint. Failures are tolerated by the caller;
//! this module only reports them.

use crate::config::NetworkConfig;
use crate::torrent::TorrentError;

/// Fast-responding public trackers used when no list could be loaded
/// and a torrent brings none of its own.
pub const DEFAULT_TRACKERS: &[&str] = &[
    "udp://tracker.opentrackr.org:1337/announce",
    "http://tracker.opentrackr.org:1337/announce",
];

/// Fetches tracker URL lists over HTTP.
pub struct TrackerListClient {
    url: String,
    client: reqwest::Client,
}

impl TrackerListClient {
    /// Creates a client for the configured tracker list endpoint.
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            url: config.tracker_list_url.clone(),
            client: reqwest::Client::builder()
                .timeout(config.http_timeout)
                .user_agent(config.user_agent)
                .build()
                .expect("HTTP client creation should not fail"),
        }
    }

    /// Fetches and parses the tracker list.
    ///
    /// # Errors
    /// - `TorrentError::TrackerListUnavailable` - Endpoint unreachable or returned an error status
    pub async fn fetch(&self) -> Result<Vec<String>, TorrentError> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| TorrentError::TrackerListUnavailable {
                url: self.url.clone(),
                reason: e.to_string(),
            })?
            .text()
            .await
            .map_err(|e| TorrentError::TrackerListUnavailable {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        Ok(parse_tracker_list(&body))
    }
}

/// Splits a newline-delimited tracker list into trimmed, non-empty URLs.
///
/// Public lists separate entries with blank lines; both those and
/// surrounding whitespace are dropped.
pub(crate) fn parse_tracker_list(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

//! Link resolution: one entry point for every supported torrent link form

use url::Url;

use super::bencode;
use super::magnet::MagnetParser;
use super::types::TorrentDescriptor;
use crate::config::NetworkConfig;
use crate::torrent::TorrentError;

/// Resolves torrent links into a unified descriptor.
///
/// Accepts magnet URIs, HTTP(S) links to .torrent files, and local
/// filesystem paths. Remote fetches go through a shared HTTP client
/// configured with the crate's timeout and user agent.
pub struct LinkResolver {
    client: reqwest::Client,
}

impl LinkResolver {
    /// Creates a resolver with HTTP settings from the network configuration.
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(config.http_timeout)
                .user_agent(config.user_agent)
                .redirect(reqwest::redirect::Policy::limited(3))
                .build()
                .expect("HTTP client creation should not fail"),
        }
    }

    /// Resolves a link into a torrent descriptor.
    ///
    /// Any failure here means the caller supplied something that cannot
    /// be interpreted as a torrent; the registry reports it as an input
    /// error with the offending link attached.
    ///
    /// # Errors
    /// - `TorrentError::InvalidTorrentFile` - Unreadable or malformed link
    pub async fn resolve(&self, link: &str) -> Result<TorrentDescriptor, TorrentError> {
        let link = link.trim();
        if link.is_empty() {
            return Err(TorrentError::InvalidTorrentFile {
                reason: "Empty torrent link".to_string(),
            });
        }

        if link.starts_with("magnet:") {
            return Ok(MagnetParser::parse(link)?.into());
        }

        if let Ok(url) = Url::parse(link) {
            if matches!(url.scheme(), "http" | "https") {
                return Ok(self.fetch_torrent(link).await?.into());
            }
        }

        let bytes =
            tokio::fs::read(link)
                .await
                .map_err(|e| TorrentError::InvalidTorrentFile {
                    reason: format!("Cannot read torrent file: {e}"),
                })?;
        Ok(bencode::parse_summary(&bytes)?.into())
    }

    /// Downloads and parses a remote .torrent file.
    async fn fetch_torrent(
        &self,
        link: &str,
    ) -> Result<super::types::TorrentSummary, TorrentError> {
        let bytes = self
            .client
            .get(link)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| TorrentError::InvalidTorrentFile {
                reason: format!("Failed to fetch torrent: {e}"),
            })?
            .bytes()
            .await
            .map_err(|e| TorrentError::InvalidTorrentFile {
                reason: format!("Failed to fetch torrent: {e}"),
            })?;

        bencode::parse_summary(&bytes)
    }
}

//! Magnet link parsing and canonical magnet composition

use super::types::MagnetLink;
use crate::torrent::{InfoHash, TorrentError};

/// Magnet link parsing utilities.
pub struct MagnetParser;

impl MagnetParser {
    /// Parses magnet link to extract torrent information.
    ///
    /// # Errors
    /// - `TorrentError::InvalidTorrentFile` - Malformed magnet URI
    pub fn parse(magnet_url: &str) -> Result<MagnetLink, TorrentError> {
        let magnet =
            magnet_url::Magnet::new(magnet_url).map_err(|e| TorrentError::InvalidTorrentFile {
                reason: format!("Invalid magnet link: {e}"),
            })?;

        let info_hash = Self::extract_info_hash(magnet_url)?;

        Ok(MagnetLink {
            info_hash,
            display_name: magnet.display_name().map(|s| s.to_string()),
            trackers: magnet.trackers().to_vec(),
        })
    }

    /// Extract info hash from the xt=urn:btih parameter.
    fn extract_info_hash(magnet_url: &str) -> Result<InfoHash, TorrentError> {
        let query = magnet_url.split_once('?').map(|(_, q)| q).unwrap_or("");

        for param in query.split('&') {
            if let Some(hash_str) = param.strip_prefix("xt=urn:btih:") {
                return InfoHash::from_hex(hash_str);
            }
        }

        Err(TorrentError::InvalidTorrentFile {
            reason: format!("Missing or invalid info hash in magnet link: {magnet_url}"),
        })
    }
}

/// Composes the canonical magnet URI handed to the torrent engine.
///
/// Trackers and the display name are percent-encoded; the info hash is
/// rendered as lowercase hex so the same torrent always produces the
/// same URI regardless of which link form it was added from.
pub fn compose_magnet(
    info_hash: InfoHash,
    display_name: Option<&str>,
    trackers: &[String],
) -> String {
    let mut magnet = format!("magnet:?xt=urn:btih:{info_hash}");

    if let Some(name) = display_name {
        magnet.push_str("&dn=");
        magnet.push_str(&urlencoding::encode(name));
    }

    for tracker in trackers {
        magnet.push_str("&tr=");
        magnet.push_str(&urlencoding::encode(tracker));
    }

    magnet
}

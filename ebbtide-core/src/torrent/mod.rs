//! Torrent domain types, link parsing, and the download registry

pub mod adapter;
pub mod parsing;
pub mod registry;
#[cfg(test)]
pub(crate) mod test_mocks;

use std::fmt;

use serde::Serialize;

pub use adapter::{AdapterFile, AdapterTorrent, SimulationTorrentAdapter, TorrentAdapter};
pub use parsing::{LinkResolver, MagnetLink, TorrentDescriptor, TorrentFileEntry, TorrentSummary};
pub use registry::{FileRecord, TorrentRecord, TorrentRegistry};

/// SHA-1 hash identifying a unique torrent.
///
/// 20-byte SHA-1 hash of the info dictionary from a torrent file.
/// Used as the registry key for tracked downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct InfoHash([u8; 20]);

impl InfoHash {
    /// Creates InfoHash from 20-byte SHA-1 hash.
    pub fn new(hash: [u8; 20]) -> Self {
        Self(hash)
    }

    /// Parses a 40-character hex string into an InfoHash.
    ///
    /// Accepts either case; this is the format info hashes take in
    /// magnet URIs and HTTP APIs.
    ///
    /// # Errors
    /// - `TorrentError::InvalidTorrentFile` - Wrong length or non-hex characters
    pub fn from_hex(hash_str: &str) -> Result<Self, TorrentError> {
        if hash_str.len() != 40 {
            return Err(TorrentError::InvalidTorrentFile {
                reason: format!("Invalid hash length: {} (expected 40)", hash_str.len()),
            });
        }

        let bytes = hex::decode(hash_str).map_err(|_| TorrentError::InvalidTorrentFile {
            reason: format!("Invalid hex character in hash: {hash_str}"),
        })?;

        let mut hash = [0u8; 20];
        hash.copy_from_slice(&bytes);
        Ok(Self(hash))
    }

    /// Returns reference to underlying 20-byte hash.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<InfoHash> for String {
    fn from(hash: InfoHash) -> Self {
        hash.to_string()
    }
}

/// Errors that can occur during registry and torrent operations.
///
/// Covers link validation, adapter failures, and the tolerated
/// infrastructure failures around tracker list loading.
#[derive(Debug, thiserror::Error)]
pub enum TorrentError {
    #[error("Failed to add torrent {link}: {reason}")]
    InvalidTorrentLink { link: String, reason: String },

    #[error("Failed to parse torrent file: {reason}")]
    InvalidTorrentFile { reason: String },

    #[error("Torrent {info_hash} not found")]
    TorrentNotFound { info_hash: InfoHash },

    #[error("Torrent engine error: {reason}")]
    Adapter { reason: String },

    #[error("Tracker list unavailable from {url}: {reason}")]
    TrackerListUnavailable { url: String, reason: String },

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("HTTP error")]
    Http(#[from] reqwest::Error),
}

impl TorrentError {
    /// Checks if this error is due to user input validation.
    ///
    /// A downstream HTTP layer maps these to 4xx responses; everything
    /// else is an internal failure.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            TorrentError::InvalidTorrentLink { .. } | TorrentError::InvalidTorrentFile { .. }
        )
    }

    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            TorrentError::InvalidTorrentLink { link, reason } => {
                format!("Failed to add torrent {link}: {reason}")
            }
            TorrentError::InvalidTorrentFile { reason } => {
                format!("Invalid torrent: {reason}")
            }
            TorrentError::TorrentNotFound { info_hash } => {
                format!("Torrent {info_hash} not found")
            }
            TorrentError::Adapter { .. } => "Download engine error occurred".to_string(),
            TorrentError::TrackerListUnavailable { .. } => {
                "Tracker list is currently unavailable".to_string()
            }
            TorrentError::Io(_) => "File system error occurred".to_string(),
            TorrentError::Http(_) => "Network error occurred".to_string(),
        }
    }
}

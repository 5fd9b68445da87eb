//! Core types produced by torrent link parsing

use crate::torrent::InfoHash;

/// Magnet link components.
///
/// Parsed magnet URI containing minimal torrent metadata: the info hash
/// plus optional display name and tracker URLs.
#[derive(Debug, Clone, PartialEq)]
pub struct MagnetLink {
    pub info_hash: InfoHash,
    pub display_name: Option<String>,
    pub trackers: Vec<String>,
}

/// Metadata summary extracted from a .torrent file.
///
/// Carries only what the registry needs to identify a torrent and
/// compose a magnet URI for the engine; piece-level fields are the
/// engine's concern and are not extracted.
#[derive(Debug, Clone, PartialEq)]
pub struct TorrentSummary {
    pub info_hash: InfoHash,
    pub name: String,
    pub total_length: u64,
    pub files: Vec<TorrentFileEntry>,
    pub announce_urls: Vec<String>,
}

/// Individual file within a torrent.
///
/// Represents a single file entry in multi-file torrents with its
/// relative path components and byte length.
#[derive(Debug, Clone, PartialEq)]
pub struct TorrentFileEntry {
    pub path: Vec<String>,
    pub length: u64,
}

/// Unified result of resolving any supported torrent link.
///
/// Whether the link was a magnet URI, a local .torrent file, or an
/// HTTP-hosted .torrent, resolution produces the same descriptor the
/// registry needs to deduplicate and hand off to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TorrentDescriptor {
    pub info_hash: InfoHash,
    pub display_name: Option<String>,
    pub trackers: Vec<String>,
}

impl From<MagnetLink> for TorrentDescriptor {
    fn from(magnet: MagnetLink) -> Self {
        Self {
            info_hash: magnet.info_hash,
            display_name: magnet.display_name,
            trackers: magnet.trackers,
        }
    }
}

impl From<TorrentSummary> for TorrentDescriptor {
    fn from(summary: TorrentSummary) -> Self {
        Self {
            info_hash: summary.info_hash,
            display_name: Some(summary.name),
            trackers: summary.announce_urls,
        }
    }
}

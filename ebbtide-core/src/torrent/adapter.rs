//! Torrent engine adapter seam
//!
//! The registry never talks to a torrent engine directly; it goes
//! through [`TorrentAdapter`]. Engine-backed adapters live outside this
//! crate. [`SimulationTorrentAdapter`] is the in-process variant for
//! development and tests.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::TorrentError;
use super::parsing::MagnetParser;

/// Interface to the torrent engine that performs actual downloads.
#[async_trait]
pub trait TorrentAdapter: Send + Sync {
    /// Begins downloading the torrent described by the magnet URI into
    /// `download_dir`, returning the engine's view of the torrent.
    ///
    /// # Errors
    /// - `TorrentError::Adapter` - Engine rejected or failed the add
    async fn add(
        &self,
        magnet: &str,
        download_dir: &Path,
    ) -> Result<AdapterTorrent, TorrentError>;
}

/// Removal capability for a single torrent held by the engine.
///
/// Handles are embedded in registry records so that removal reaches the
/// same engine session that started the download.
#[async_trait]
pub trait TorrentHandle: Send + Sync {
    /// Stops the download and releases engine resources.
    ///
    /// # Errors
    /// - `TorrentError::Adapter` - Engine could not release the torrent
    async fn remove(&self) -> Result<(), TorrentError>;
}

/// Engine view of a torrent returned by [`TorrentAdapter::add`].
#[derive(Clone)]
pub struct AdapterTorrent {
    pub name: String,
    pub files: Vec<AdapterFile>,
    pub handle: Arc<dyn TorrentHandle>,
}

/// File descriptor reported by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterFile {
    /// Path relative to the torrent's download directory
    pub path: String,
    pub length: u64,
}

/// Deterministic in-process adapter for development and tests.
///
/// Derives the torrent name and a plausible file list from the magnet
/// URI alone and never touches the network. Removal always succeeds.
#[derive(Debug, Clone, Default)]
pub struct SimulationTorrentAdapter;

impl SimulationTorrentAdapter {
    /// Creates a new simulation adapter.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TorrentAdapter for SimulationTorrentAdapter {
    async fn add(
        &self,
        magnet: &str,
        download_dir: &Path,
    ) -> Result<AdapterTorrent, TorrentError> {
        let parsed = MagnetParser::parse(magnet).map_err(|e| TorrentError::Adapter {
            reason: format!("Simulation adapter rejected magnet: {e}"),
        })?;

        let name = parsed.display_name.unwrap_or_else(|| {
            format!("torrent_{}", hex::encode(&parsed.info_hash.as_bytes()[..8]))
        });

        tracing::debug!(
            "Simulation adapter starting {} in {}",
            name,
            download_dir.display()
        );

        // A single video payload named after the torrent
        let files = vec![AdapterFile {
            path: format!("{name}/{name}.mkv"),
            length: 1_073_741_824,
        }];

        Ok(AdapterTorrent {
            handle: Arc::new(SimulationTorrentHandle { name: name.clone() }),
            name,
            files,
        })
    }
}

/// Handle issued by [`SimulationTorrentAdapter`].
#[derive(Debug, Clone)]
struct SimulationTorrentHandle {
    name: String,
}

#[async_trait]
impl TorrentHandle for SimulationTorrentHandle {
    async fn remove(&self) -> Result<(), TorrentError> {
        tracing::debug!("Simulation adapter removed {}", self.name);
        Ok(())
    }
}

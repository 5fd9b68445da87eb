//! Ebbtide Core - Torrent download registry and lifecycle management
//!
//! This crate provides the coordination layer between torrent links and an
//! external torrent engine: adding torrents by link, tracking their metadata
//! in memory, and expiring inactive downloads after a configurable timeout.
//! The engine itself sits behind the [`TorrentAdapter`] seam.

pub mod config;
pub mod torrent;
pub mod tracker;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use config::EbbtideConfig;
pub use torrent::adapter::{
    AdapterFile, AdapterTorrent, SimulationTorrentAdapter, TorrentAdapter, TorrentHandle,
};
pub use torrent::registry::{FileRecord, TorrentRecord, TorrentRegistry};
pub use torrent::{InfoHash, TorrentError};

pub type Result<T> = std::result::Result<T, TorrentError>;

//! Mock adapter for exercising the registry without an engine.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::TorrentError;
use super::adapter::{AdapterFile, AdapterTorrent, TorrentAdapter, TorrentHandle};
use super::parsing::MagnetParser;

/// Mock adapter that records every add and removal.
///
/// Torrent names are taken from the magnet's display name so tests can
/// assert which torrents the engine was asked to release.
#[derive(Debug, Clone, Default)]
pub struct MockTorrentAdapter {
    adds: Arc<RwLock<Vec<String>>>,
    removals: Arc<RwLock<Vec<String>>>,
    removal_attempts: Arc<RwLock<u32>>,
    fail_removals: bool,
    removal_delay: Duration,
}

impl MockTorrentAdapter {
    /// Creates a well-behaved mock adapter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every removal fails with an adapter error.
    pub fn with_failing_removals(mut self) -> Self {
        self.fail_removals = true;
        self
    }

    /// Removals take `millis` before completing.
    pub fn with_removal_delay(mut self, millis: u64) -> Self {
        self.removal_delay = Duration::from_millis(millis);
        self
    }

    /// Number of downloads the engine was asked to start.
    pub async fn add_count(&self) -> usize {
        self.adds.read().await.len()
    }

    /// Names of torrents the engine successfully released, in order.
    pub async fn removed_names(&self) -> Vec<String> {
        self.removals.read().await.clone()
    }

    /// Number of removal attempts, successful or not.
    pub async fn removal_attempts(&self) -> u32 {
        *self.removal_attempts.read().await
    }
}

#[async_trait]
impl TorrentAdapter for MockTorrentAdapter {
    async fn add(
        &self,
        magnet: &str,
        _download_dir: &Path,
    ) -> Result<AdapterTorrent, TorrentError> {
        let parsed = MagnetParser::parse(magnet).map_err(|e| TorrentError::Adapter {
            reason: format!("Mock adapter rejected magnet: {e}"),
        })?;
        let name = parsed.display_name.unwrap_or_else(|| "unnamed".to_string());

        self.adds.write().await.push(magnet.to_string());

        let files = vec![
            AdapterFile {
                path: format!("{name}/{name}.mkv"),
                length: 734_003_200,
            },
            AdapterFile {
                path: format!("{name}/{name}.xyz123"),
                length: 1_024,
            },
        ];

        Ok(AdapterTorrent {
            handle: Arc::new(MockTorrentHandle {
                name: name.clone(),
                removals: self.removals.clone(),
                removal_attempts: self.removal_attempts.clone(),
                fail: self.fail_removals,
                delay: self.removal_delay,
            }),
            name,
            files,
        })
    }
}

#[derive(Debug)]
struct MockTorrentHandle {
    name: String,
    removals: Arc<RwLock<Vec<String>>>,
    removal_attempts: Arc<RwLock<u32>>,
    fail: bool,
    delay: Duration,
}

#[async_trait]
impl TorrentHandle for MockTorrentHandle {
    async fn remove(&self) -> Result<(), TorrentError> {
        *self.removal_attempts.write().await += 1;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.fail {
            return Err(TorrentError::Adapter {
                reason: format!("Mock removal failure for {}", self.name),
            });
        }

        self.removals.write().await.push(self.name.clone());
        Ok(())
    }
}

//! In-memory registry of active torrent downloads
//!
//! Tracks every torrent handed to the engine, deduplicates adds by info
//! hash, and expires inactive torrents after the configured interval.
//! Each successful add schedules a deferred expiry sweep, so the
//! registry maintains itself without a dedicated timer task.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use super::adapter::{TorrentAdapter, TorrentHandle};
use super::parsing::{LinkResolver, TorrentDescriptor, compose_magnet};
use super::{InfoHash, TorrentError};
use crate::config::EbbtideConfig;
use crate::tracker::{DEFAULT_TRACKERS, TrackerListClient};

/// Delay between a successful add and the expiry sweep it triggers.
const SWEEP_DELAY: Duration = Duration::from_secs(1);

/// A torrent tracked by the registry.
///
/// Combines the engine's view of the download with the link it was
/// added from, the canonical magnet URI, and the timestamps driving
/// expiry. `created` is set once; `updated` is refreshed whenever the
/// same torrent is added again.
#[derive(Clone, Serialize)]
pub struct TorrentRecord {
    pub info_hash: InfoHash,
    /// Original link this torrent was added from
    pub link: String,
    /// Canonical magnet URI handed to the engine
    pub magnet: String,
    pub name: String,
    pub files: Vec<FileRecord>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(skip)]
    handle: Arc<dyn TorrentHandle>,
}

impl TorrentRecord {
    /// Stops the download and releases engine resources for this torrent.
    ///
    /// # Errors
    /// - `TorrentError::Adapter` - Engine could not release the torrent
    pub async fn remove(&self) -> Result<(), TorrentError> {
        self.handle.remove().await
    }

    /// Copy of this record with only the `updated` timestamp replaced.
    fn touched(&self, now: DateTime<Utc>) -> Self {
        Self {
            updated: now,
            ..self.clone()
        }
    }
}

impl fmt::Debug for TorrentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TorrentRecord")
            .field("info_hash", &self.info_hash)
            .field("link", &self.link)
            .field("name", &self.name)
            .field("files", &self.files)
            .field("created", &self.created)
            .field("updated", &self.updated)
            .finish_non_exhaustive()
    }
}

/// File within a tracked torrent, enriched with a MIME type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRecord {
    /// Path relative to the torrent's download directory
    pub path: String,
    pub length: u64,
    /// MIME type guessed from the file name; empty when unrecognized
    pub content_type: String,
}

/// Registry of active torrent downloads.
///
/// Cheap to clone; all clones share the same state. The registry owns
/// only coordination state (the record map and the sweep flag); actual
/// downloading is delegated to the configured [`TorrentAdapter`].
#[derive(Clone)]
pub struct TorrentRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    config: EbbtideConfig,
    trackers: Vec<String>,
    resolver: LinkResolver,
    adapter: Arc<dyn TorrentAdapter>,
    torrents: RwLock<HashMap<InfoHash, TorrentRecord>>,
    /// Guards the expiry sweep; at most one sweep runs at a time
    sweeping: AtomicBool,
}

/// Releases the sweep flag on every exit path, including errors.
struct SweepGuard<'a>(&'a AtomicBool);

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl TorrentRegistry {
    /// Creates a registry, loading the public tracker list first.
    ///
    /// Tracker list failures are absorbed: the registry starts with an
    /// empty list and a warning, never an error. Construction cannot
    /// fail.
    pub async fn create(config: EbbtideConfig, adapter: Arc<dyn TorrentAdapter>) -> Self {
        let tracker_client = TrackerListClient::new(&config.network);
        let trackers = match tracker_client.fetch().await {
            Ok(trackers) => {
                tracing::info!(
                    "Loaded {} trackers from {}",
                    trackers.len(),
                    config.network.tracker_list_url
                );
                trackers
            }
            Err(e) => {
                tracing::warn!("Failed to load tracker list, continuing without: {e}");
                Vec::new()
            }
        };

        Self::with_trackers(config, adapter, trackers)
    }

    /// Creates a registry with an explicit tracker list, skipping the fetch.
    pub fn with_trackers(
        config: EbbtideConfig,
        adapter: Arc<dyn TorrentAdapter>,
        trackers: Vec<String>,
    ) -> Self {
        let resolver = LinkResolver::new(&config.network);

        Self {
            inner: Arc::new(RegistryInner {
                config,
                trackers,
                resolver,
                adapter,
                torrents: RwLock::new(HashMap::new()),
                sweeping: AtomicBool::new(false),
            }),
        }
    }

    /// All currently tracked torrents, in no particular order.
    pub async fn torrents(&self) -> Vec<TorrentRecord> {
        self.inner.torrents.read().await.values().cloned().collect()
    }

    /// The tracked torrent for `info_hash`, if any.
    pub async fn torrent(&self, info_hash: InfoHash) -> Option<TorrentRecord> {
        self.inner.torrents.read().await.get(&info_hash).cloned()
    }

    /// Adds a torrent by link: magnet URI, .torrent URL, or local path.
    ///
    /// If the torrent is already tracked, no new download is started;
    /// the existing record's `updated` timestamp is refreshed and the
    /// record returned. Otherwise the engine begins a download and the
    /// enriched record is inserted. Each successful add schedules a
    /// deferred expiry sweep.
    ///
    /// # Errors
    /// - `TorrentError::InvalidTorrentLink` - Link could not be resolved to a torrent
    /// - `TorrentError::Adapter` - Engine failed to start the download
    pub async fn add_torrent(&self, link: &str) -> Result<TorrentRecord, TorrentError> {
        let descriptor = self.inner.resolver.resolve(link).await.map_err(|e| {
            TorrentError::InvalidTorrentLink {
                link: link.to_string(),
                reason: e.user_message(),
            }
        })?;
        let info_hash = descriptor.info_hash;

        // Already downloading: refresh the activity timestamp and return.
        {
            let mut torrents = self.inner.torrents.write().await;
            if let Some(existing) = torrents.get(&info_hash) {
                tracing::debug!("Torrent {info_hash} already tracked, refreshing timestamp");
                let refreshed = existing.touched(Utc::now());
                torrents.insert(info_hash, refreshed.clone());
                return Ok(refreshed);
            }
        }

        let magnet = self.engine_magnet(&descriptor);
        let added = self
            .inner
            .adapter
            .add(&magnet, &self.inner.config.registry.download_dir)
            .await?;

        let now = Utc::now();
        let files = added
            .files
            .into_iter()
            .map(|file| FileRecord {
                content_type: content_type_for(&file.path),
                path: file.path,
                length: file.length,
            })
            .collect();

        let record = TorrentRecord {
            info_hash,
            link: link.to_string(),
            magnet,
            name: added.name,
            files,
            created: now,
            updated: now,
            handle: added.handle,
        };

        tracing::info!("Tracking torrent {} ({info_hash})", record.name);
        self.inner
            .torrents
            .write()
            .await
            .insert(info_hash, record.clone());

        self.schedule_sweep();

        Ok(record)
    }

    /// Removes a torrent from the engine and the registry.
    ///
    /// Unknown hashes are a no-op. The registry entry is only deleted
    /// after the engine releases the torrent; if removal fails the
    /// record stays tracked and remains eligible for a later attempt.
    ///
    /// # Errors
    /// - `TorrentError::Adapter` - Engine could not release the torrent
    pub async fn remove_torrent(&self, info_hash: InfoHash) -> Result<(), TorrentError> {
        let record = self.inner.torrents.read().await.get(&info_hash).cloned();
        let Some(record) = record else {
            return Ok(());
        };

        record.remove().await?;
        self.inner.torrents.write().await.remove(&info_hash);
        tracing::info!("Removed torrent {} ({info_hash})", record.name);
        Ok(())
    }

    /// Magnet URI handed to the engine: descriptor trackers first, then
    /// the registry's loaded list, falling back to the builtin trackers
    /// when both are empty.
    fn engine_magnet(&self, descriptor: &TorrentDescriptor) -> String {
        let mut trackers = descriptor.trackers.clone();
        for tracker in &self.inner.trackers {
            if !trackers.contains(tracker) {
                trackers.push(tracker.clone());
            }
        }
        if trackers.is_empty() {
            tracing::debug!(
                "No trackers known for {}, using fallback trackers",
                descriptor.info_hash
            );
            trackers = DEFAULT_TRACKERS.iter().map(|s| s.to_string()).collect();
        }

        compose_magnet(
            descriptor.info_hash,
            descriptor.display_name.as_deref(),
            &trackers,
        )
    }

    /// Schedules a one-shot expiry sweep shortly after an add.
    ///
    /// Sweep failures never reach the caller that triggered them; they
    /// are logged and dropped.
    fn schedule_sweep(&self) {
        let registry = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(SWEEP_DELAY).await;
            if let Err(e) = registry.sweep_expired().await {
                tracing::warn!("Expiry sweep failed: {e}");
            }
        });
    }

    /// Removes every torrent whose `updated` timestamp is older than
    /// the autoclean interval.
    ///
    /// At most one sweep runs at a time; a sweep triggered while
    /// another is in progress returns immediately without scanning.
    /// Removals run sequentially, and a failing removal ends the pass
    /// early; the flag is still released so a later sweep can retry.
    async fn sweep_expired(&self) -> Result<(), TorrentError> {
        if self
            .inner
            .sweeping
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            tracing::debug!("Expiry sweep already in progress, skipping");
            return Ok(());
        }
        let _guard = SweepGuard(&self.inner.sweeping);

        let interval = self.inner.config.registry.autoclean_interval;
        let now = Utc::now();
        let expired: Vec<(InfoHash, String)> = {
            let torrents = self.inner.torrents.read().await;
            torrents
                .values()
                .filter(|record| is_expired(record, now, interval))
                .map(|record| (record.info_hash, record.name.clone()))
                .collect()
        };

        for (info_hash, name) in expired {
            tracing::info!("Removing inactive torrent {name} ({info_hash})");
            self.remove_torrent(info_hash).await?;
        }

        Ok(())
    }
}

/// Whether a record has been inactive for longer than the interval.
fn is_expired(record: &TorrentRecord, now: DateTime<Utc>, interval: Duration) -> bool {
    now.signed_duration_since(record.updated)
        .to_std()
        .map(|age| age > interval)
        .unwrap_or(false)
}

/// MIME type for a file name; empty string when unrecognized.
fn content_type_for(path: &str) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .map(str::to_string)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::torrent::test_mocks::MockTorrentAdapter;

    const HASH_A: &str = "0123456789abcdef0123456789abcdef01234567";
    const HASH_B: &str = "89abcdef0123456789abcdef0123456789abcdef";

    fn magnet_for(hash: &str, name: &str) -> String {
        format!("magnet:?xt=urn:btih:{hash}&dn={name}")
    }

    fn test_registry(adapter: Arc<MockTorrentAdapter>) -> TorrentRegistry {
        TorrentRegistry::with_trackers(
            EbbtideConfig::for_testing(),
            adapter,
            vec!["udp://tracker.test:1337/announce".to_string()],
        )
    }

    async fn backdate(registry: &TorrentRegistry, info_hash: InfoHash, seconds: i64) {
        let mut torrents = registry.inner.torrents.write().await;
        let record = torrents.get(&info_hash).expect("torrent should be tracked");
        let mut backdated = record.clone();
        backdated.updated = Utc::now() - ChronoDuration::seconds(seconds);
        torrents.insert(info_hash, backdated);
    }

    #[tokio::test]
    async fn test_add_torrent_tracks_record() {
        let adapter = Arc::new(MockTorrentAdapter::new());
        let registry = test_registry(adapter.clone());
        let link = magnet_for(HASH_A, "ubuntu");

        let record = registry.add_torrent(&link).await.unwrap();

        assert_eq!(record.info_hash.to_string(), HASH_A);
        assert_eq!(record.link, link);
        assert_eq!(record.created, record.updated);
        assert!(record.magnet.contains("tr="));
        assert_eq!(adapter.add_count().await, 1);
        assert_eq!(registry.torrents().await.len(), 1);
    }

    #[tokio::test]
    async fn test_add_enriches_files_with_mime_types() {
        let adapter = Arc::new(MockTorrentAdapter::new());
        let registry = test_registry(adapter);

        let record = registry
            .add_torrent(&magnet_for(HASH_A, "movie"))
            .await
            .unwrap();

        // Mock adapter reports one .mkv payload and one unknown extension
        assert_eq!(record.files.len(), 2);
        assert_eq!(record.files[0].content_type, "video/x-matroska");
        assert_eq!(record.files[1].content_type, "");
    }

    #[tokio::test]
    async fn test_add_same_link_twice_refreshes_timestamp_only() {
        let adapter = Arc::new(MockTorrentAdapter::new());
        let registry = test_registry(adapter.clone());
        let link = magnet_for(HASH_A, "ubuntu");

        let first = registry.add_torrent(&link).await.unwrap();
        let second = registry.add_torrent(&link).await.unwrap();

        assert_eq!(second.info_hash, first.info_hash);
        assert_eq!(second.created, first.created);
        assert!(second.updated >= first.updated);
        // The engine is never asked to download the same torrent twice
        assert_eq!(adapter.add_count().await, 1);
        assert_eq!(registry.torrents().await.len(), 1);
    }

    #[tokio::test]
    async fn test_add_invalid_link_reports_offending_link() {
        let adapter = Arc::new(MockTorrentAdapter::new());
        let registry = test_registry(adapter.clone());

        let result = registry.add_torrent("magnet:?dn=missing-hash").await;

        let Err(error) = result else {
            panic!("expected invalid link error");
        };
        assert!(error.is_user_error());
        assert!(error.to_string().contains("magnet:?dn=missing-hash"));
        assert_eq!(adapter.add_count().await, 0);
    }

    #[tokio::test]
    async fn test_get_unknown_torrent_is_none() {
        let adapter = Arc::new(MockTorrentAdapter::new());
        let registry = test_registry(adapter);

        let info_hash = InfoHash::from_hex(HASH_A).unwrap();
        assert!(registry.torrent(info_hash).await.is_none());
    }

    #[tokio::test]
    async fn test_remove_unknown_torrent_is_noop() {
        let adapter = Arc::new(MockTorrentAdapter::new());
        let registry = test_registry(adapter.clone());
        registry
            .add_torrent(&magnet_for(HASH_A, "keep"))
            .await
            .unwrap();

        let info_hash = InfoHash::from_hex(HASH_B).unwrap();
        registry.remove_torrent(info_hash).await.unwrap();

        assert_eq!(registry.torrents().await.len(), 1);
        assert!(adapter.removed_names().await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_torrent_releases_engine_and_registry() {
        let adapter = Arc::new(MockTorrentAdapter::new());
        let registry = test_registry(adapter.clone());
        let record = registry
            .add_torrent(&magnet_for(HASH_A, "ubuntu"))
            .await
            .unwrap();

        registry.remove_torrent(record.info_hash).await.unwrap();

        assert_eq!(adapter.removed_names().await, vec!["ubuntu".to_string()]);
        assert!(registry.torrent(record.info_hash).await.is_none());

        // Removing again is a no-op, not a second engine call
        registry.remove_torrent(record.info_hash).await.unwrap();
        assert_eq!(adapter.removed_names().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_removal_keeps_record_tracked() {
        let adapter = Arc::new(MockTorrentAdapter::new().with_failing_removals());
        let registry = test_registry(adapter);
        let record = registry
            .add_torrent(&magnet_for(HASH_A, "stuck"))
            .await
            .unwrap();

        let result = registry.remove_torrent(record.info_hash).await;

        assert!(matches!(result, Err(TorrentError::Adapter { .. })));
        assert!(registry.torrent(record.info_hash).await.is_some());
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired_torrents() {
        let adapter = Arc::new(MockTorrentAdapter::new());
        let registry = test_registry(adapter.clone());
        let expired = registry
            .add_torrent(&magnet_for(HASH_A, "stale"))
            .await
            .unwrap();
        let fresh = registry
            .add_torrent(&magnet_for(HASH_B, "active"))
            .await
            .unwrap();

        // autoclean_interval is 60s in the testing preset: 61s is out, 59s is in
        backdate(&registry, expired.info_hash, 61).await;
        backdate(&registry, fresh.info_hash, 59).await;

        registry.sweep_expired().await.unwrap();

        assert!(registry.torrent(expired.info_hash).await.is_none());
        assert!(registry.torrent(fresh.info_hash).await.is_some());
        assert_eq!(adapter.removed_names().await, vec!["stale".to_string()]);
    }

    #[tokio::test]
    async fn test_concurrent_sweeps_scan_once() {
        let adapter = Arc::new(MockTorrentAdapter::new().with_removal_delay(50));
        let registry = test_registry(adapter.clone());
        let record = registry
            .add_torrent(&magnet_for(HASH_A, "stale"))
            .await
            .unwrap();
        backdate(&registry, record.info_hash, 120).await;

        let (first, second) = tokio::join!(registry.sweep_expired(), registry.sweep_expired());
        first.unwrap();
        second.unwrap();

        // The second sweep saw the flag and dropped out without scanning
        assert_eq!(adapter.removed_names().await.len(), 1);
    }

    #[tokio::test]
    async fn test_sweep_failure_truncates_pass_and_releases_flag() {
        let adapter = Arc::new(MockTorrentAdapter::new().with_failing_removals());
        let registry = test_registry(adapter.clone());
        let a = registry
            .add_torrent(&magnet_for(HASH_A, "stale-a"))
            .await
            .unwrap();
        let b = registry
            .add_torrent(&magnet_for(HASH_B, "stale-b"))
            .await
            .unwrap();
        backdate(&registry, a.info_hash, 120).await;
        backdate(&registry, b.info_hash, 120).await;

        // First failing removal aborts the rest of the pass
        assert!(registry.sweep_expired().await.is_err());
        assert_eq!(adapter.removal_attempts().await, 1);
        assert_eq!(registry.torrents().await.len(), 2);

        // The flag was released, so a later sweep retries
        assert!(registry.sweep_expired().await.is_err());
        assert_eq!(adapter.removal_attempts().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_schedules_deferred_sweep() {
        let adapter = Arc::new(MockTorrentAdapter::new());
        let registry = test_registry(adapter.clone());
        let stale = registry
            .add_torrent(&magnet_for(HASH_A, "stale"))
            .await
            .unwrap();
        backdate(&registry, stale.info_hash, 120).await;

        let fresh = registry
            .add_torrent(&magnet_for(HASH_B, "fresh"))
            .await
            .unwrap();

        // The add above scheduled a sweep one second out
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(registry.torrent(stale.info_hash).await.is_none());
        assert!(registry.torrent(fresh.info_hash).await.is_some());
    }

    #[tokio::test]
    async fn test_fallback_trackers_when_none_known() {
        let adapter = Arc::new(MockTorrentAdapter::new());
        let registry =
            TorrentRegistry::with_trackers(EbbtideConfig::for_testing(), adapter, Vec::new());

        let record = registry
            .add_torrent(&magnet_for(HASH_A, "orphan"))
            .await
            .unwrap();

        assert!(record.magnet.contains("tr="));
    }

    #[tokio::test]
    async fn test_create_tolerates_unreachable_tracker_list() {
        let mut config = EbbtideConfig::for_testing();
        config.network.tracker_list_url = "http://127.0.0.1:9/trackers.txt".to_string();
        config.network.http_timeout = Duration::from_secs(1);

        let adapter = Arc::new(MockTorrentAdapter::new());
        let registry = TorrentRegistry::create(config, adapter).await;

        // Construction absorbed the failure; the registry is usable
        let record = registry
            .add_torrent(&magnet_for(HASH_A, "ubuntu"))
            .await
            .unwrap();
        assert_eq!(record.name, "ubuntu");
    }
}

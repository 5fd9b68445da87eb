//! Centralized configuration for Ebbtide.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::path::PathBuf;
use std::time::Duration;

/// Central configuration for all Ebbtide components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct EbbtideConfig {
    pub registry: RegistryConfig,
    pub network: NetworkConfig,
}

/// Torrent registry behavior configuration.
///
/// Controls how long inactive torrents are retained and where the
/// engine is told to place downloaded data.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// How long a torrent may go without being re-requested before the
    /// expiry sweep removes it
    pub autoclean_interval: Duration,
    /// Directory handed to the torrent engine for downloaded data
    pub download_dir: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            autoclean_interval: Duration::from_secs(3600), // 1 hour
            download_dir: PathBuf::from("downloads"),
        }
    }
}

/// Network communication configuration.
///
/// Controls HTTP timeouts and the endpoint used to refresh the
/// public tracker list at registry construction.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Endpoint serving a newline-delimited list of tracker URLs
    pub tracker_list_url: String,
    /// HTTP request timeout for tracker list and .torrent fetches
    pub http_timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: &'static str,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            tracker_list_url:
                "https://raw.githubusercontent.com/ngosang/trackerslist/master/trackers_best.txt"
                    .to_string(),
            http_timeout: Duration::from_secs(30),
            user_agent: "ebbtide/0.1.0",
        }
    }
}

impl EbbtideConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(interval) = std::env::var("EBBTIDE_AUTOCLEAN_INTERVAL") {
            if let Ok(seconds) = interval.parse::<u64>() {
                config.registry.autoclean_interval = Duration::from_secs(seconds);
            }
        }

        if let Ok(dir) = std::env::var("EBBTIDE_DOWNLOAD_DIR") {
            config.registry.download_dir = PathBuf::from(dir);
        }

        if let Ok(url) = std::env::var("EBBTIDE_TRACKER_LIST_URL") {
            config.network.tracker_list_url = url;
        }

        if let Ok(timeout) = std::env::var("EBBTIDE_HTTP_TIMEOUT") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.network.http_timeout = Duration::from_secs(seconds);
            }
        }

        config
    }

    /// Creates a configuration optimized for testing.
    ///
    /// Uses a short autoclean interval so expiry behavior can be
    /// exercised without waiting out the production default.
    pub fn for_testing() -> Self {
        Self {
            registry: RegistryConfig {
                autoclean_interval: Duration::from_secs(60),
                download_dir: PathBuf::from("target/test-downloads"),
            },
            ..Default::default()
        }
    }
}

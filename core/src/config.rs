//! Runtime configuration for the adapters.
//!
//! Every default can be overridden from the environment:
//! - VOXNODE_BASE_URL, VOXNODE_API_KEY, VOXNODE_USER_AGENT
//! - VOXNODE_REQUEST_TIMEOUT_MS, VOXNODE_CREATE_TIMEOUT_MS, VOXNODE_GENERATE_TIMEOUT_MS
//! - VOXNODE_CACHE_TTL_SECS
//! - VOXNODE_POLL_INTERVAL_SECS, VOXNODE_MAX_WAIT_SECS

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(300);
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_CREATE_TIMEOUT_MS: u64 = 120_000;
pub const DEFAULT_GENERATE_TIMEOUT_MS: u64 = 60_000;

/// HTTP client settings
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// API root, without the `/v1` prefix
    pub base_url: String,
    /// Timeout for listing, status and account requests in milliseconds
    pub request_timeout_ms: u64,
    /// Timeout for job creation uploads in milliseconds
    pub create_timeout_ms: u64,
    /// Timeout for audio generation and transcription calls in milliseconds
    pub generate_timeout_ms: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: env_string("VOXNODE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            request_timeout_ms: env_parse("VOXNODE_REQUEST_TIMEOUT_MS")
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
            create_timeout_ms: env_parse("VOXNODE_CREATE_TIMEOUT_MS")
                .unwrap_or(DEFAULT_CREATE_TIMEOUT_MS),
            generate_timeout_ms: env_parse("VOXNODE_GENERATE_TIMEOUT_MS")
                .unwrap_or(DEFAULT_GENERATE_TIMEOUT_MS),
            user_agent: env_string("VOXNODE_USER_AGENT")
                .unwrap_or_else(|| "voxnode/0.1".to_string()),
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn create_timeout(&self) -> Duration {
        Duration::from_millis(self.create_timeout_ms)
    }

    pub fn generate_timeout(&self) -> Duration {
        Duration::from_millis(self.generate_timeout_ms)
    }
}

/// Discovery cache settings
#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: env_parse("VOXNODE_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CACHE_TTL),
        }
    }
}

/// Job poller settings
#[derive(Clone, Debug)]
pub struct PollerConfig {
    /// Fixed sleep between non-terminal status queries
    pub interval: Duration,
    /// Default wall-clock bound for one wait
    pub max_wait: Duration,
    /// Upper bound for a single status query
    pub query_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: env_parse("VOXNODE_POLL_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            max_wait: env_parse("VOXNODE_MAX_WAIT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_MAX_WAIT),
            query_timeout: env_parse("VOXNODE_REQUEST_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS)),
        }
    }
}

/// Top-level configuration handed to [`crate::Voxnode::new`]
#[derive(Clone, Debug)]
pub struct VoxConfig {
    pub client: ClientConfig,
    pub cache: CacheConfig,
    pub poller: PollerConfig,
    /// Default API key; individual calls may override it
    pub api_key: Option<String>,
}

impl Default for VoxConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            cache: CacheConfig::default(),
            poller: PollerConfig::default(),
            api_key: env_string("VOXNODE_API_KEY"),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn env_parse(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<u64>().ok())
}

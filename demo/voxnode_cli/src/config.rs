use std::fs;
use std::path::Path;
use std::time::Duration;

use voxnode_core::VoxConfig;

const DEFAULT_CONFIG_PATH: &str = "voxnode.toml";

/// Load configuration from a TOML file (path via VOXNODE_CONFIG or ./voxnode.toml),
/// overlaying values onto the env-driven defaults.
pub fn load() -> VoxConfig {
    let path = std::env::var("VOXNODE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    load_from(Path::new(&path), VoxConfig::default())
}

pub fn load_from(path: &Path, default: VoxConfig) -> VoxConfig {
    if !path.exists() {
        tracing::debug!(target: "voxnode", path = %path.display(), "No TOML config found; using defaults/env");
        return default;
    }
    match fs::read_to_string(path) {
        Ok(s) => match toml::from_str::<VoxToml>(&s) {
            Ok(t) => t.overlay(default),
            Err(e) => {
                tracing::warn!(target: "voxnode", error = %e, "Failed to parse TOML; using defaults");
                default
            }
        },
        Err(e) => {
            tracing::warn!(target: "voxnode", error = %e, "Failed to read TOML; using defaults");
            default
        }
    }
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct VoxToml {
    pub api_key: Option<String>,
    pub client: Option<ClientToml>,
    pub cache: Option<CacheToml>,
    pub poller: Option<PollerToml>,
}

impl VoxToml {
    fn overlay(self, mut base: VoxConfig) -> VoxConfig {
        if let Some(k) = self.api_key.filter(|k| !k.is_empty()) {
            base.api_key = Some(k);
        }
        if let Some(c) = self.client {
            if let Some(x) = c.base_url {
                base.client.base_url = x;
            }
            if let Some(x) = c.request_timeout_ms {
                base.client.request_timeout_ms = x;
            }
            if let Some(x) = c.create_timeout_ms {
                base.client.create_timeout_ms = x;
            }
            if let Some(x) = c.generate_timeout_ms {
                base.client.generate_timeout_ms = x;
            }
            if let Some(x) = c.user_agent {
                base.client.user_agent = x;
            }
        }
        if let Some(c) = self.cache {
            if let Some(x) = c.ttl_secs {
                base.cache.ttl = Duration::from_secs(x);
            }
        }
        if let Some(p) = self.poller {
            if let Some(x) = p.interval_secs {
                base.poller.interval = Duration::from_secs(x.max(1));
            }
            if let Some(x) = p.max_wait_secs {
                base.poller.max_wait = Duration::from_secs(x);
            }
            if let Some(x) = p.query_timeout_ms {
                base.poller.query_timeout = Duration::from_millis(x);
            }
        }
        base
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct ClientToml {
    pub base_url: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub create_timeout_ms: Option<u64>,
    pub generate_timeout_ms: Option<u64>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct CacheToml {
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct PollerToml {
    pub interval_secs: Option<u64>,
    pub max_wait_secs: Option<u64>,
    pub query_timeout_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_keeps_defaults() {
        let base = VoxConfig::default();
        let ttl = base.cache.ttl;
        let cfg = load_from(Path::new("/nonexistent/voxnode.toml"), base);
        assert_eq!(cfg.cache.ttl, ttl);
    }

    #[test]
    fn overlay_replaces_only_given_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
api_key = "from-file"

[client]
base_url = "http://localhost:9000"

[cache]
ttl_secs = 120

[poller]
max_wait_secs = 600
"#
        )
        .unwrap();

        let base = VoxConfig::default();
        let interval = base.poller.interval;
        let cfg = load_from(file.path(), base);

        assert_eq!(cfg.api_key.as_deref(), Some("from-file"));
        assert_eq!(cfg.client.base_url, "http://localhost:9000");
        assert_eq!(cfg.cache.ttl, Duration::from_secs(120));
        assert_eq!(cfg.poller.max_wait, Duration::from_secs(600));
        assert_eq!(cfg.poller.interval, interval);
    }

    #[test]
    fn broken_toml_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cache\nttl_secs = ").unwrap();
        let base = VoxConfig::default();
        let url = base.client.base_url.clone();
        let cfg = load_from(file.path(), base);
        assert_eq!(cfg.client.base_url, url);
    }
}

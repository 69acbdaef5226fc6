//! Relay runtime settings

use std::path::PathBuf;
use std::time::Duration;

/// Default directory holding the configuration files
pub const DEFAULT_CONFIG_DIR: &str = "/var/lib/monstream";

/// Default program used to run pipelines
pub const DEFAULT_LAUNCH_PROGRAM: &str = "gst-launch-1.0";

/// Relay configuration options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Directory containing the `config` and `streams` files
    pub config_dir: PathBuf,

    /// Fixed delay between a stream failure and its restart
    pub restart_backoff: Duration,

    /// Jitter buffer latency of the RTSP source in milliseconds
    pub source_latency_ms: u32,

    /// TTL for multicast destinations
    pub multicast_ttl: u32,

    /// Silence on the source before a source-timeout is raised
    pub source_timeout: Duration,

    /// Pipeline launcher executable
    pub launch_program: PathBuf,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            restart_backoff: Duration::from_secs(5),
            source_latency_ms: 0,
            multicast_ttl: 15,
            source_timeout: Duration::from_secs(5),
            launch_program: PathBuf::from(DEFAULT_LAUNCH_PROGRAM),
        }
    }
}

impl RelayConfig {
    /// Defaults overlaid with `POLYSTREAM_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`
    ///
    /// Values that fail to parse are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("POLYSTREAM_CONFIG_DIR") {
            config.config_dir = PathBuf::from(dir);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "POLYSTREAM_RESTART_BACKOFF_MS") {
            config.restart_backoff = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var(&lookup, "POLYSTREAM_LATENCY_MS") {
            config.source_latency_ms = ms;
        }
        if let Some(ttl) = parse_var(&lookup, "POLYSTREAM_MULTICAST_TTL") {
            config = config.multicast_ttl(ttl);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "POLYSTREAM_SOURCE_TIMEOUT_MS") {
            config.source_timeout = Duration::from_millis(ms);
        }
        if let Some(program) = lookup("POLYSTREAM_LAUNCH_PROGRAM") {
            config.launch_program = PathBuf::from(program);
        }

        config
    }

    /// Set the config directory
    pub fn config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    /// Set the restart backoff
    pub fn restart_backoff(mut self, backoff: Duration) -> Self {
        self.restart_backoff = backoff;
        self
    }

    /// Set the source latency
    pub fn source_latency_ms(mut self, ms: u32) -> Self {
        self.source_latency_ms = ms;
        self
    }

    /// Set the multicast TTL
    pub fn multicast_ttl(mut self, ttl: u32) -> Self {
        self.multicast_ttl = ttl.min(255);
        self
    }

    /// Set the source timeout
    pub fn source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = timeout;
        self
    }

    /// Set the pipeline launcher executable
    pub fn launch_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.launch_program = program.into();
        self
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key = key, value = %raw, "Ignoring invalid setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();

        assert_eq!(config.config_dir, PathBuf::from("/var/lib/monstream"));
        assert_eq!(config.restart_backoff, Duration::from_secs(5));
        assert_eq!(config.source_latency_ms, 0);
        assert_eq!(config.multicast_ttl, 15);
        assert_eq!(config.launch_program, PathBuf::from("gst-launch-1.0"));
    }

    #[test]
    fn test_builder_chaining() {
        let config = RelayConfig::default()
            .config_dir("/tmp/relay")
            .restart_backoff(Duration::from_millis(250))
            .source_latency_ms(200)
            .multicast_ttl(4)
            .source_timeout(Duration::from_secs(2))
            .launch_program("/usr/local/bin/gst-launch-1.0");

        assert_eq!(config.config_dir, PathBuf::from("/tmp/relay"));
        assert_eq!(config.restart_backoff, Duration::from_millis(250));
        assert_eq!(config.source_latency_ms, 200);
        assert_eq!(config.multicast_ttl, 4);
        assert_eq!(config.source_timeout, Duration::from_secs(2));
        assert_eq!(
            config.launch_program,
            PathBuf::from("/usr/local/bin/gst-launch-1.0")
        );
    }

    #[test]
    fn test_builder_multicast_ttl_capped() {
        let config = RelayConfig::default().multicast_ttl(1000);

        assert_eq!(config.multicast_ttl, 255);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            ("POLYSTREAM_CONFIG_DIR", "/etc/polystream"),
            ("POLYSTREAM_RESTART_BACKOFF_MS", "1500"),
            ("POLYSTREAM_LATENCY_MS", "100"),
        ]
        .into_iter()
        .collect();

        let config = RelayConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.config_dir, PathBuf::from("/etc/polystream"));
        assert_eq!(config.restart_backoff, Duration::from_millis(1500));
        assert_eq!(config.source_latency_ms, 100);
        assert_eq!(config.multicast_ttl, 15);
    }

    #[test]
    fn test_from_lookup_ignores_invalid() {
        let config = RelayConfig::from_lookup(|k| match k {
            "POLYSTREAM_RESTART_BACKOFF_MS" => Some("soon".to_string()),
            "POLYSTREAM_MULTICAST_TTL" => Some("-1".to_string()),
            _ => None,
        });

        assert_eq!(config, RelayConfig::default());
    }
}

// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::cache::{DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";

/// Gateway settings, read from YAML and overridable from the command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    pub listen: SocketAddr,
    pub cache_dir: PathBuf,
    pub remote_root: Option<PathBuf>,
    #[serde(with = "duration_text")]
    pub poll_interval: Duration,
    #[serde(with = "duration_text")]
    pub max_wait: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8080)),
            cache_dir: PathBuf::from("cache"),
            remote_root: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

impl GatewayConfig {
    pub fn remote_root(&self) -> Result<&Path> {
        self.remote_root
            .as_deref()
            .context("remote_root must be set in the config file or with --remote-root")
    }
}

/// Load configuration from YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GatewayConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

    let config: GatewayConfig = serde_yaml_ng::from_str(&content)
        .with_context(|| "Failed to parse YAML configuration")?;
    Ok(config)
}

/// Validate configuration
pub fn validate_config(config: &GatewayConfig) -> Result<()> {
    let _ = config.remote_root()?;

    if config.cache_dir.as_os_str().is_empty() {
        anyhow::bail!("cache_dir cannot be empty");
    }

    if config.poll_interval.is_zero() {
        anyhow::bail!("poll_interval must be greater than 0");
    }

    if config.max_wait < config.poll_interval {
        anyhow::bail!(
            "max_wait ({:?}) must not be shorter than poll_interval ({:?})",
            config.max_wait,
            config.poll_interval
        );
    }

    Ok(())
}

/// Create example configuration file
pub fn create_example_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let example = format!(
        r#"# cachegate configuration
#
# Credentials are not stored here: set CACHEGATE_USER and CACHEGATE_PASSWORD.

# Address the HTTP gateway listens on
listen: "{DEFAULT_LISTEN}"

# Local cache, mirrors the remote hierarchy (created with mode 0700)
cache_dir: "cache"

# Directory served as the remote tree
remote_root: "/srv/remote"

# How often a waiting request checks for the end of an in-flight download
poll_interval: "1s"

# How long a waiting request waits before answering 408
max_wait: "1h"
"#
    );

    std::fs::write(&path, example).with_context(|| {
        format!(
            "Failed to write example config to: {}",
            path.as_ref().display()
        )
    })?;

    Ok(())
}

/// Durations as `parse_duration` text ("1s", "250ms", "1h"), written in the
/// coarsest unit that loses nothing
mod duration_text {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let text = if value.subsec_nanos() == 0 {
            format!("{}s", value.as_secs())
        } else if value.subsec_nanos() % 1_000_000 == 0 {
            format!("{}ms", value.as_millis())
        } else {
            format!("{}ns", value.as_nanos())
        };
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_duration::parse(&text).map_err(serde::de::Error::custom)
    }
}

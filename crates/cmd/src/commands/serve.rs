// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::common::{credentials_from_env, parse_duration_arg};
use anyhow::{Context, Result};
use clap::Args;
use diagnostics::*;
use gateway::{Gateway, GatewayConfig};
use remotefs::{HostTree, Session};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// YAML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Listen address, e.g. 127.0.0.1:8080
    #[arg(long)]
    pub listen: Option<SocketAddr>,
    /// Local cache directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
    /// Host directory served as the remote tree
    #[arg(long)]
    pub remote_root: Option<PathBuf>,
    /// How often waiting requests check an in-flight download
    #[arg(long, value_parser = parse_duration_arg)]
    pub poll_interval: Option<Duration>,
    /// How long a waiting request waits before giving up
    #[arg(long, value_parser = parse_duration_arg)]
    pub max_wait: Option<Duration>,
}

impl ServeArgs {
    /// The config file (or defaults) with command-line flags applied on top
    pub fn resolve_config(&self) -> Result<GatewayConfig> {
        let mut config = match &self.config {
            Some(path) => gateway::load_config(path)?,
            None => GatewayConfig::default(),
        };

        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if let Some(cache_dir) = &self.cache_dir {
            config.cache_dir = cache_dir.clone();
        }
        if let Some(remote_root) = &self.remote_root {
            config.remote_root = Some(remote_root.clone());
        }
        if let Some(poll_interval) = self.poll_interval {
            config.poll_interval = poll_interval;
        }
        if let Some(max_wait) = self.max_wait {
            config.max_wait = max_wait;
        }

        gateway::validate_config(&config)?;
        Ok(config)
    }
}

pub async fn serve_command(args: ServeArgs) -> Result<()> {
    let config = args.resolve_config()?;
    let credentials = credentials_from_env()?;

    let remote_root = config.remote_root()?;
    let tree = HostTree::connect(remote_root, &credentials)
        .await
        .with_context(|| format!("Failed to log in to remote tree at {}", remote_root.display()))?;
    let root = tree.root_path().display().to_string();
    let user = tree.user().to_string();
    info!("serving remote tree {root} as {user}", root: root, user: user);

    gateway::prepare_cache_root(&config.cache_dir)
        .await
        .with_context(|| format!("Failed to prepare cache directory {}", config.cache_dir.display()))?;

    let gateway = Gateway::from_config(Session::new(tree), &config);
    gateway::serve(gateway, config.listen).await
}

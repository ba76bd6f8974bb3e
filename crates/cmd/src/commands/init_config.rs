// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result, anyhow};
use diagnostics::*;
use std::path::Path;

pub fn init_config_command(path: &Path, force: bool) -> Result<()> {
    let config_path = path.display().to_string();
    if path.exists() && !force {
        return Err(anyhow!(
            "Configuration file already exists: {} (use --force to overwrite)",
            config_path
        ));
    }

    gateway::create_example_config(path)
        .with_context(|| format!("Failed to create configuration file: {}", config_path))?;

    info!("Created example configuration file: {config_path}", config_path: config_path);
    info!("Edit remote_root and cache_dir, then set CACHEGATE_USER and CACHEGATE_PASSWORD");
    info!("Then run: cachegate serve --config {config_path}", config_path: config_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_config_writes_loadable_file() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("cachegate.yaml");

        init_config_command(&path, false)?;
        let config = gateway::load_config(&path)?;
        gateway::validate_config(&config)?;

        // Refuses to clobber unless forced
        assert!(init_config_command(&path, false).is_err());
        init_config_command(&path, true)?;
        Ok(())
    }
}

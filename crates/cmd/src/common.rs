// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Result, anyhow};
use remotefs::Credentials;
use std::time::Duration;

pub const USER_ENV: &str = "CACHEGATE_USER";
pub const PASSWORD_ENV: &str = "CACHEGATE_PASSWORD";

/// Reads the remote store login from the environment
pub fn credentials_from_env() -> Result<Credentials> {
    credentials_from(|name| std::env::var(name).ok())
}

/// Both variables must be present and non-empty
pub fn credentials_from<F>(lookup: F) -> Result<Credentials>
where
    F: Fn(&str) -> Option<String>,
{
    let user = lookup(USER_ENV)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("{} environment variable not set", USER_ENV))?;
    let password = lookup(PASSWORD_ENV)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("{} environment variable not set", PASSWORD_ENV))?;
    Ok(Credentials::new(user, password))
}

/// clap value parser for "1s", "250ms", "1h" style durations
pub fn parse_duration_arg(text: &str) -> std::result::Result<Duration, String> {
    parse_duration::parse(text).map_err(|e| format!("invalid duration {:?}: {}", text, e))
}

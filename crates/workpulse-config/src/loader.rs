// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./workpulse.toml` > `~/.config/workpulse/workpulse.toml`
//! > `/etc/workpulse/workpulse.toml` with environment variable overrides via
//! the `WORKPULSE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::WorkpulseConfig;

/// Top-level sections, used to map `WORKPULSE_SECTION_KEY` onto `section.key`.
const SECTIONS: &[&str] = &[
    "app",
    "server",
    "storage",
    "schedule",
    "slack",
    "telegram",
    "rate_limit",
    "anthropic",
];

pub(crate) const SYSTEM_CONFIG: &str = "/etc/workpulse/workpulse.toml";
pub(crate) const LOCAL_CONFIG: &str = "workpulse.toml";

pub(crate) fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("workpulse/workpulse.toml"))
        .unwrap_or_default()
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/workpulse/workpulse.toml` (system-wide)
/// 3. `~/.config/workpulse/workpulse.toml` (user XDG config)
/// 4. `./workpulse.toml` (local directory)
/// 5. `WORKPULSE_*` environment variables
pub fn load_config() -> Result<WorkpulseConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<WorkpulseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WorkpulseConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<WorkpulseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WorkpulseConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(WorkpulseConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: key names contain
/// underscores, so `WORKPULSE_RATE_LIMIT_MAX_REQUESTS` must become
/// `rate_limit.max_requests`, not `rate.limit.max.requests`.
fn env_provider() -> Env {
    Env::prefixed("WORKPULSE_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    SECTIONS
        .iter()
        .find_map(|section| {
            key.strip_prefix(section)
                .and_then(|rest| rest.strip_prefix('_'))
                .map(|field| format!("{section}.{field}"))
        })
        .unwrap_or_else(|| key.to_string())
}

// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./bayan.toml` > `~/.config/bayan/bayan.toml` >
//! `/etc/bayan/bayan.toml` with environment variable overrides via the
//! `BAYAN_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::BayanConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/bayan/bayan.toml` (system-wide)
/// 3. `~/.config/bayan/bayan.toml` (user XDG config)
/// 4. `./bayan.toml` (local directory)
/// 5. `BAYAN_*` environment variables
pub fn load_config() -> Result<BayanConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BayanConfig::default()))
        .merge(Toml::file("/etc/bayan/bayan.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("bayan/bayan.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("bayan.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<BayanConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BayanConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<BayanConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BayanConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `BAYAN_WAREHOUSE_DATABASE_PATH` must map
/// to `warehouse.database_path`, not `warehouse.database.path`.
fn env_provider() -> Env {
    Env::prefixed("BAYAN_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: BAYAN_POOL_COOLDOWN_SECS -> "pool_cooldown_secs"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("gemini_", "gemini.", 1)
            .replacen("pool_", "pool.", 1)
            .replacen("warehouse_", "warehouse.", 1)
            .replacen("catalog_", "catalog.", 1)
            .replacen("composer_", "composer.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_from_str_merges_over_defaults() {
        let config = load_config_from_str(
            r#"
[pool]
cooldown_secs = 5
"#,
        )
        .unwrap();
        assert_eq!(config.pool.cooldown_secs, 5);
        assert_eq!(config.agent.name, "bayan");
    }

    #[test]
    fn empty_string_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.warehouse.query_timeout_secs, 15);
    }
}

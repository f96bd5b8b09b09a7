// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Merge order, later wins: compiled defaults, `/etc/leadhound/leadhound.toml`,
//! `$XDG_CONFIG_HOME/leadhound/leadhound.toml`, `./leadhound.toml`, then
//! `LEADHOUND_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::LeadhoundConfig;

pub(crate) const SYSTEM_CONFIG: &str = "/etc/leadhound/leadhound.toml";
pub(crate) const LOCAL_CONFIG: &str = "leadhound.toml";

pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("leadhound").join("leadhound.toml"))
}

/// Load configuration from the standard file hierarchy with env var overrides.
pub fn load_config() -> Result<LeadhoundConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from an inline TOML string over compiled defaults.
///
/// No files or environment variables are consulted.
pub fn load_config_from_str(toml_content: &str) -> Result<LeadhoundConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LeadhoundConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LeadhoundConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LeadhoundConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment used by [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(LeadhoundConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Maps `LEADHOUND_<SECTION>_<KEY>` onto `section.key`.
///
/// Uses explicit prefixes instead of `Env::split("_")` because keys contain
/// underscores: `LEADHOUND_DISCORD_MAX_RETRIES` is `discord.max_retries`.
fn env_provider() -> Env {
    Env::prefixed("LEADHOUND_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    const NESTED: [(&str, &str); 2] = [
        ("openai_stage_one_", "openai.stage_one."),
        ("openai_stage_two_", "openai.stage_two."),
    ];
    const SECTIONS: [&str; 7] = [
        "app", "filter", "discord", "backfill", "openai", "storage", "export",
    ];

    for (prefix, dotted) in NESTED {
        if let Some(rest) = key.strip_prefix(prefix) {
            return format!("{dotted}{rest}");
        }
    }
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("discord_max_retries"), "discord.max_retries");
        assert_eq!(map_env_key("openai_api_key"), "openai.api_key");
        assert_eq!(map_env_key("openai_stage_two_model"), "openai.stage_two.model");
        assert_eq!(map_env_key("export_write_mode"), "export.write_mode");
        assert_eq!(map_env_key("unknown"), "unknown");
    }
}

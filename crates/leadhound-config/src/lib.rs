// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for Leadhound.
//!
//! TOML files layered with Figment, strict `deny_unknown_fields` parsing,
//! `LEADHOUND_*` environment overrides, and miette diagnostics with typo
//! suggestions.
//!
//! ```no_run
//! use leadhound_config::load_and_validate;
//!
//! let config = load_and_validate(None).expect("config errors");
//! println!("keywords: {:?}", config.filter.keywords);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::LeadhoundConfig;

/// Loads configuration and validates it.
///
/// With `path`, only that file plus environment overrides are used; otherwise
/// the standard hierarchy is searched. Figment errors are converted into
/// diagnostics pointing at the offending source line where possible.
pub fn load_and_validate(path: Option<&Path>) -> Result<LeadhoundConfig, Vec<ConfigError>> {
    let loaded = match path {
        Some(p) => loader::load_config_from_path(p),
        None => loader::load_config(),
    };
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = match path {
                Some(p) => read_sources([p.canonicalize().unwrap_or_else(|_| p.to_path_buf())]),
                None => collect_toml_sources(),
            };
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Loads configuration from an inline TOML string and validates it.
pub fn load_and_validate_str(toml_content: &str) -> Result<LeadhoundConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![std::path::PathBuf::from(loader::SYSTEM_CONFIG)];
    candidates.extend(loader::user_config_path());
    candidates.push(
        std::env::current_dir()
            .map(|d| d.join(loader::LOCAL_CONFIG))
            .unwrap_or_else(|_| loader::LOCAL_CONFIG.into()),
    );
    read_sources(candidates)
}

fn read_sources(paths: impl IntoIterator<Item = std::path::PathBuf>) -> Vec<(String, String)> {
    paths
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}

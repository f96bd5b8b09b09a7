// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation.
//!
//! Collects every semantic problem instead of failing on the first.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::LeadhoundConfig;

/// Platform ceiling for one history page.
const MAX_PAGE_LIMIT: u16 = 100;

/// Longest lookback accepted for a backfill. Discord history starts in 2015.
const MAX_HISTORY_DAYS: u32 = 36_500;

pub fn validate_config(config: &LeadhoundConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    for (i, keyword) in config.filter.keywords.iter().enumerate() {
        if keyword.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "filter.keywords[{i}] must not be blank"
            )));
        }
    }

    let discord = &config.discord;
    if discord.concurrent_channels == 0 {
        errors.push(ConfigError::validation(
            "discord.concurrent_channels must be at least 1",
        ));
    }
    if discord.message_page_limit == 0 || discord.message_page_limit > MAX_PAGE_LIMIT {
        errors.push(ConfigError::validation(format!(
            "discord.message_page_limit must be between 1 and {MAX_PAGE_LIMIT}, got {}",
            discord.message_page_limit
        )));
    }
    if discord.max_retries == 0 {
        errors.push(ConfigError::validation(
            "discord.max_retries must be at least 1",
        ));
    }
    for (name, value) in [
        ("request_interval_secs", discord.request_interval_secs),
        ("retry_fallback_secs", discord.retry_fallback_secs),
        ("retry_margin_secs", discord.retry_margin_secs),
    ] {
        if !value.is_finite() || value < 0.0 {
            errors.push(ConfigError::validation(format!(
                "discord.{name} must be a non-negative number, got {value}"
            )));
        }
    }

    let mut seen_accounts = HashSet::new();
    for (i, account) in discord.accounts.iter().enumerate() {
        if account.name.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "discord.accounts[{i}].name must not be empty"
            )));
        } else if !seen_accounts.insert(account.name.as_str()) {
            errors.push(ConfigError::validation(format!(
                "duplicate account name `{}` in [[discord.accounts]]",
                account.name
            )));
        }
        if account.token.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "discord.accounts[{i}].token must not be empty"
            )));
        }
    }

    let history_days = config.backfill.history_days;
    if history_days == 0 {
        errors.push(ConfigError::validation(
            "backfill.history_days must be at least 1",
        ));
    } else if history_days > MAX_HISTORY_DAYS {
        errors.push(ConfigError::validation(format!(
            "backfill.history_days must be at most {MAX_HISTORY_DAYS}, got {history_days}"
        )));
    }

    let openai = &config.openai;
    if openai.concurrency == 0 {
        errors.push(ConfigError::validation(
            "openai.concurrency must be at least 1",
        ));
    }
    if openai.timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "openai.timeout_secs must be at least 1",
        ));
    }
    for (stage, cfg) in [("stage_one", &openai.stage_one), ("stage_two", &openai.stage_two)] {
        if cfg.model.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "openai.{stage}.model must not be empty"
            )));
        }
        if cfg.max_retries == 0 {
            errors.push(ConfigError::validation(format!(
                "openai.{stage}.max_retries must be at least 1"
            )));
        }
        if !(0.0..=2.0).contains(&cfg.temperature) {
            errors.push(ConfigError::validation(format!(
                "openai.{stage}.temperature must be between 0 and 2, got {}",
                cfg.temperature
            )));
        }
    }

    if let Some(path) = &config.export.csv_path
        && path.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "export.csv_path must not be empty when set",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

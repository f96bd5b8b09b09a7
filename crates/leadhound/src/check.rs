// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `leadhound check` command implementation.
//!
//! Runs the health check of every adapter the pipeline would use and prints
//! one line per check.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use leadhound_config::LeadhoundConfig;
use leadhound_config::model::DiscordAccount;
use leadhound_core::{HealthStatus, LeadhoundError, PluginAdapter};
use leadhound_discord::DiscordSource;
use leadhound_openai::OpenAiClassifier;
use leadhound_storage::SqliteStore;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(
        name: impl Into<String>,
        status: CheckStatus,
        message: impl Into<String>,
        start: Instant,
    ) -> Self {
        Self {
            name: name.into(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }

    /// Maps an adapter health check onto a check line.
    fn from_health(
        name: impl Into<String>,
        health: Result<HealthStatus, LeadhoundError>,
        ok_message: &str,
        start: Instant,
    ) -> Self {
        match health {
            Ok(HealthStatus::Healthy) => Self::new(name, CheckStatus::Pass, ok_message, start),
            Ok(HealthStatus::Degraded(reason)) => Self::new(name, CheckStatus::Warn, reason, start),
            Ok(HealthStatus::Unhealthy(reason)) => {
                Self::new(name, CheckStatus::Fail, reason, start)
            }
            Err(e) => Self::new(name, CheckStatus::Fail, e.to_string(), start),
        }
    }
}

pub async fn run_check(config: &LeadhoundConfig, plain: bool) -> Result<(), LeadhoundError> {
    let use_color = !plain && std::io::stdout().is_terminal();

    let mut results = vec![
        check_config(config),
        check_database(config).await,
        check_classifier(config).await,
    ];
    if config.discord.accounts.is_empty() {
        results.push(CheckResult::new(
            "Discord",
            CheckStatus::Warn,
            "no accounts configured",
            Instant::now(),
        ));
    }
    for account in &config.discord.accounts {
        results.push(check_account(account).await);
    }

    println!();
    println!("  leadhound check");
    println!("  {}", "-".repeat(50));
    for result in &results {
        println!("{}", render_line(result, use_color));
    }
    println!();

    let failed = results
        .iter()
        .filter(|r| r.status == CheckStatus::Fail)
        .count();
    let warned = results
        .iter()
        .filter(|r| r.status == CheckStatus::Warn)
        .count();
    if failed + warned == 0 {
        println!("  All checks passed.");
    } else {
        let issues = failed + warned;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    }
    println!();

    if failed > 0 {
        return Err(LeadhoundError::Internal(format!("{failed} check(s) failed")));
    }
    Ok(())
}

fn render_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.normal().to_string()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow().to_string()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red().to_string()),
        };
        format!("    {symbol} {:<20} {message} ({duration_ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

/// Configuration already passed validation; this flags settings that are
/// valid but probably unintended.
fn check_config(config: &LeadhoundConfig) -> CheckResult {
    let start = Instant::now();
    if config.filter.keywords.is_empty() {
        return CheckResult::new(
            "Configuration",
            CheckStatus::Warn,
            "no keywords configured, every message goes to the classifier",
            start,
        );
    }
    CheckResult::new(
        "Configuration",
        CheckStatus::Pass,
        format!("valid ({} keywords)", config.filter.keywords.len()),
        start,
    )
}

async fn check_database(config: &LeadhoundConfig) -> CheckResult {
    let start = Instant::now();
    let db_path = &config.storage.database_path;
    if !Path::new(db_path).exists() {
        return CheckResult::new(
            "Database",
            CheckStatus::Warn,
            format!("not found: {db_path} (will be created on first run)"),
            start,
        );
    }

    let store = SqliteStore::new(config.storage.clone());
    if let Err(e) = store.initialize().await {
        let message = format!("open failed: {e}");
        return CheckResult::new("Database", CheckStatus::Fail, message, start);
    }
    CheckResult::from_health("Database", store.health_check().await, "connected", start)
}

async fn check_classifier(config: &LeadhoundConfig) -> CheckResult {
    let start = Instant::now();
    match OpenAiClassifier::new(&config.openai) {
        Ok(classifier) => CheckResult::from_health(
            "Classifier",
            classifier.health_check().await,
            &format!("{} / {}", config.openai.stage_one.model, config.openai.stage_two.model),
            start,
        ),
        Err(e) => CheckResult::new("Classifier", CheckStatus::Fail, e.to_string(), start),
    }
}

async fn check_account(account: &DiscordAccount) -> CheckResult {
    let start = Instant::now();
    let name = format!("Discord {}", account.name);
    match DiscordSource::connect(account).await {
        Ok(source) => {
            CheckResult::from_health(name, source.health_check().await, "authenticated", start)
        }
        Err(e) => CheckResult::new(name, CheckStatus::Fail, e.to_string(), start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_database_warns() {
        let mut config = LeadhoundConfig::default();
        config.storage.database_path = "/tmp/nonexistent-leadhound-test-xyz.db".to_string();
        let result = check_database(&config).await;
        assert_eq!(result.status, CheckStatus::Warn);
        assert!(result.message.contains("not found"));
    }

    #[tokio::test]
    async fn existing_database_passes() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = LeadhoundConfig::default();
        config.storage.database_path = dir.path().join("lh.db").display().to_string();
        std::fs::write(&config.storage.database_path, b"").unwrap();

        let result = check_database(&config).await;
        assert_eq!(result.status, CheckStatus::Pass, "{}", result.message);
    }

    #[test]
    fn empty_keywords_warn() {
        let result = check_config(&LeadhoundConfig::default());
        assert_eq!(result.status, CheckStatus::Warn);

        let mut config = LeadhoundConfig::default();
        config.filter.keywords = vec!["hiring".into()];
        assert_eq!(check_config(&config).status, CheckStatus::Pass);
    }

    #[test]
    fn health_states_map_to_check_status() {
        let start = Instant::now();
        let degraded = CheckResult::from_health(
            "x",
            Ok(HealthStatus::Degraded("slow".into())),
            "ok",
            start,
        );
        assert_eq!(degraded.status, CheckStatus::Warn);
        assert_eq!(degraded.message, "slow");

        let failed =
            CheckResult::from_health("x", Err(LeadhoundError::storage("gone")), "ok", start);
        assert_eq!(failed.status, CheckStatus::Fail);
    }

    #[test]
    fn plain_lines_use_text_tags() {
        let result =
            CheckResult::new("Database", CheckStatus::Fail, "open failed", Instant::now());
        let line = render_line(&result, false);
        assert!(line.contains("[FAIL]"));
        assert!(line.contains("open failed"));
    }
}

// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Leadhound configuration system.

use std::io::Write;

use leadhound_config::diagnostic::ConfigError;
use leadhound_config::model::LeadhoundConfig;
use leadhound_config::{load_and_validate, load_and_validate_str, load_config_from_str};
use leadhound_core::WriteMode;

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[app]
log_level = "debug"

[filter]
keywords = ["hiring", "freelance", "paid gig"]

[discord]
concurrent_channels = 4
message_page_limit = 50
max_retries = 3
request_interval_secs = 0.5
track_all_channels = false
channel_whitelist = [1234, 5678]

[[discord.accounts]]
name = "scout"
token = "abc.def"

[backfill]
history_days = 14

[openai]
api_key = "sk-test"
concurrency = 2

[openai.stage_two]
model = "gpt-4o"
system_prompt = "judge"
max_retries = 2
temperature = 0.2

[storage]
database_path = "/tmp/leadhound.db"
wal_mode = false

[export]
write_mode = "qualified"
csv_path = "/tmp/leads.csv"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.app.log_level, "debug");
    assert_eq!(config.filter.keywords.len(), 3);
    assert_eq!(config.discord.concurrent_channels, 4);
    assert_eq!(config.discord.message_page_limit, 50);
    assert_eq!(config.discord.max_retries, 3);
    assert!(!config.discord.track_all_channels);
    assert_eq!(config.discord.channel_whitelist, vec![1234, 5678]);
    assert_eq!(config.discord.accounts[0].name, "scout");
    assert_eq!(config.backfill.history_days, 14);
    assert_eq!(config.openai.api_key.as_deref(), Some("sk-test"));
    assert_eq!(config.openai.concurrency, 2);
    assert_eq!(config.openai.stage_two.model, "gpt-4o");
    assert_eq!(config.openai.stage_one.model, "gpt-3.5-turbo");
    assert_eq!(config.storage.database_path, "/tmp/leadhound.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.export.write_mode, WriteMode::Qualified);
    assert_eq!(config.export.csv_path.as_deref(), Some("/tmp/leads.csv"));
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.app.log_level, "info");
    assert!(config.filter.keywords.is_empty());
    assert_eq!(config.discord.concurrent_channels, 12);
    assert_eq!(config.discord.message_page_limit, 100);
    assert_eq!(config.discord.max_retries, 5);
    assert!((config.discord.request_interval_secs - 0.3).abs() < f64::EPSILON);
    assert!(config.discord.track_all_channels);
    assert_eq!(config.backfill.history_days, 7);
    assert_eq!(config.openai.concurrency, 5);
    assert_eq!(config.openai.timeout_secs, 30);
    assert_eq!(config.openai.stage_one.max_retries, 1);
    assert_eq!(config.openai.stage_two.max_retries, 3);
    assert_eq!(config.export.write_mode, WriteMode::All);
    assert_eq!(
        config.export.lead_type_labels.get("direct_hire").map(String::as_str),
        Some("Direct Hire")
    );
}

#[test]
fn unknown_key_gets_suggestion() {
    let toml = r#"
[filter]
keywrods = ["hiring"]
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject unknown key");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey { suggestion, .. } => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("keywords"));
}

#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[discord]
concurrent_channels = "many"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject wrong type");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("concurrent_channels"))),
        "got: {errors:?}"
    );
}

#[test]
fn unknown_write_mode_is_rejected() {
    let toml = r#"
[export]
write_mode = "some"
"#;
    assert!(load_and_validate_str(toml).is_err());
}

#[test]
fn account_without_token_is_missing_key() {
    let toml = r#"
[[discord.accounts]]
name = "scout"
"#;
    let errors = load_and_validate_str(toml).expect_err("token is required");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::MissingKey { key } if key.ends_with("token"))),
        "got: {errors:?}"
    );
}

#[test]
fn semantic_errors_surface_through_load_and_validate() {
    let toml = r#"
[backfill]
history_days = 0
"#;
    let errors = load_and_validate_str(toml).expect_err("zero days is invalid");
    assert!(matches!(&errors[0], ConfigError::Validation { message } if message.contains("history_days")));
}

#[test]
fn dotted_override_wins_over_file() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: LeadhoundConfig = Figment::new()
        .merge(Serialized::defaults(LeadhoundConfig::default()))
        .merge(Toml::string("[openai]\nconcurrency = 3\n"))
        .merge(("openai.concurrency", 9))
        .extract()
        .expect("should merge override");
    assert_eq!(config.openai.concurrency, 9);
}

#[test]
fn explicit_path_is_loaded() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[filter]\nkeywords = [\"contract\"]").expect("write");
    let config = load_and_validate(Some(file.path())).expect("file should load");
    assert_eq!(config.filter.keywords, vec!["contract"]);
}

#[test]
fn unknown_key_in_file_points_at_source() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[storage]\nwal = true").expect("write");
    let errors = load_and_validate(Some(file.path())).expect_err("should reject");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { key, span: Some(_), .. } if key == "wal"
    )));
}

#[test]
fn serialized_defaults_load_back() {
    let rendered = toml::to_string(&LeadhoundConfig::default()).expect("defaults should serialize");
    let config = load_config_from_str(&rendered).expect("rendered defaults should load");
    assert_eq!(config.discord.max_retries, 5);
    assert_eq!(config.storage.database_path, LeadhoundConfig::default().storage.database_path);
    assert_eq!(config.export.status_labels, LeadhoundConfig::default().export.status_labels);
    assert_eq!(config.openai.stage_two.model, LeadhoundConfig::default().openai.stage_two.model);
}

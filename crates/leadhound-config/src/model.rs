// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a mistyped key fails at
//! startup instead of being silently ignored.

use std::collections::BTreeMap;
use std::time::Duration;

use leadhound_core::{ValidationStatus, WriteMode};
use serde::{Deserialize, Serialize};

/// Top-level Leadhound configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LeadhoundConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub app: AppConfig,

    /// Keyword pre-filter.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Discord accounts and crawl pacing.
    #[serde(default)]
    pub discord: DiscordConfig,

    /// History backfill window.
    #[serde(default)]
    pub backfill: BackfillConfig,

    /// Classification service.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// SQLite store.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Export sinks.
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Whole-word keywords, matched case-insensitively. Empty admits everything.
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// One chat account to read as.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DiscordAccount {
    /// Label used in logs and stored as the discovering account name.
    pub name: String,
    /// Bot token.
    pub token: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DiscordConfig {
    #[serde(default)]
    pub accounts: Vec<DiscordAccount>,

    /// Channels crawled at the same time during backfill.
    #[serde(default = "default_concurrent_channels")]
    pub concurrent_channels: usize,

    /// Messages requested per history page (platform maximum is 100).
    #[serde(default = "default_message_page_limit")]
    pub message_page_limit: u16,

    /// Attempts per history page before a rate-limited channel is abandoned.
    #[serde(default = "default_discord_max_retries")]
    pub max_retries: u32,

    /// Minimum spacing between any two history requests, in seconds.
    #[serde(default = "default_request_interval_secs")]
    pub request_interval_secs: f64,

    /// Wait used when a rate-limit response carries no retry-after.
    #[serde(default = "default_retry_fallback_secs")]
    pub retry_fallback_secs: f64,

    /// Added on top of every rate-limit wait.
    #[serde(default = "default_retry_margin_secs")]
    pub retry_margin_secs: f64,

    /// When false, only `channel_whitelist` is processed in live mode.
    #[serde(default = "default_true")]
    pub track_all_channels: bool,

    #[serde(default)]
    pub channel_whitelist: Vec<u64>,
}

impl DiscordConfig {
    pub fn request_interval(&self) -> Duration {
        secs(self.request_interval_secs)
    }

    pub fn retry_fallback(&self) -> Duration {
        secs(self.retry_fallback_secs)
    }

    pub fn retry_margin(&self) -> Duration {
        secs(self.retry_margin_secs)
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            concurrent_channels: default_concurrent_channels(),
            message_page_limit: default_message_page_limit(),
            max_retries: default_discord_max_retries(),
            request_interval_secs: default_request_interval_secs(),
            retry_fallback_secs: default_retry_fallback_secs(),
            retry_margin_secs: default_retry_margin_secs(),
            track_all_channels: true,
            channel_whitelist: Vec::new(),
        }
    }
}

fn default_concurrent_channels() -> usize {
    12
}

fn default_message_page_limit() -> u16 {
    100
}

fn default_discord_max_retries() -> u32 {
    5
}

fn default_request_interval_secs() -> f64 {
    0.3
}

fn default_retry_fallback_secs() -> f64 {
    5.0
}

fn default_retry_margin_secs() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackfillConfig {
    /// Lookback window in days.
    #[serde(default = "default_history_days")]
    pub history_days: u32,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            history_days: default_history_days(),
        }
    }
}

fn default_history_days() -> u32 {
    7
}

/// Per-stage model settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StageConfig {
    pub model: String,
    pub system_prompt: String,
    /// Total attempts for one call, including the first.
    pub max_retries: u32,
    #[serde(default)]
    pub temperature: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key. Falls back to `OPENAI_API_KEY` when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    #[serde(default = "default_openai_timeout_secs")]
    pub timeout_secs: u64,

    /// Stage calls in flight at once, shared by both stages and all channels.
    #[serde(default = "default_openai_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_stage_one")]
    pub stage_one: StageConfig,

    #[serde(default = "default_stage_two")]
    pub stage_two: StageConfig,
}

impl OpenAiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            timeout_secs: default_openai_timeout_secs(),
            concurrency: default_openai_concurrency(),
            stage_one: default_stage_one(),
            stage_two: default_stage_two(),
        }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_timeout_secs() -> u64 {
    30
}

fn default_openai_concurrency() -> usize {
    5
}

const STAGE_ONE_PROMPT: &str = "You triage chat messages for a freelance developer. \
Decide whether the message could be someone looking to hire, commission, or pay for \
software work. Reply with a JSON object: {\"verdict\": \"POTENTIAL\" or \"JUNK\", \
\"confidence\": number between 0 and 1, \"reason\": short explanation}.";

const STAGE_TWO_PROMPT: &str = "You assess chat messages as sales leads for a freelance \
developer. Reply with a JSON object: {\"is_lead\": bool, \"confidence\": number between \
0 and 1, \"lead_type\": one of \"direct_hire\", \"project_work\", \"paid_help\", \"other\", \
\"summary\": one sentence, \"tech_stack\": list of technologies mentioned}.";

fn default_stage_one() -> StageConfig {
    StageConfig {
        model: "gpt-3.5-turbo".to_string(),
        system_prompt: STAGE_ONE_PROMPT.to_string(),
        max_retries: 1,
        temperature: 0.0,
    }
}

fn default_stage_two() -> StageConfig {
    StageConfig {
        model: "gpt-4o-mini".to_string(),
        system_prompt: STAGE_TWO_PROMPT.to_string(),
        max_retries: 3,
        temperature: 0.0,
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("leadhound").join("leadhound.db"))
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "leadhound.db".to_string())
}

/// Display strings for each final status in exported rows.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StatusLabels {
    pub relevant: String,
    pub possibly_relevant: String,
    pub possibly_unrelevant: String,
    pub unrelevant: String,
    pub error: String,
}

impl StatusLabels {
    pub fn label(&self, status: ValidationStatus) -> &str {
        match status {
            ValidationStatus::Relevant => &self.relevant,
            ValidationStatus::PossiblyRelevant => &self.possibly_relevant,
            ValidationStatus::PossiblyUnrelevant => &self.possibly_unrelevant,
            ValidationStatus::Unrelevant => &self.unrelevant,
            ValidationStatus::Error => &self.error,
        }
    }
}

impl Default for StatusLabels {
    fn default() -> Self {
        Self {
            relevant: "🔥 Hot Lead".to_string(),
            possibly_relevant: "💡 Good Lead".to_string(),
            possibly_unrelevant: "🤔 Possible".to_string(),
            unrelevant: "❌ Not a Lead".to_string(),
            error: "⚠️ Error".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Which persisted opportunities reach the sinks.
    #[serde(default)]
    pub write_mode: WriteMode,

    /// Append-only CSV sink. `None` disables it.
    #[serde(default)]
    pub csv_path: Option<String>,

    #[serde(default)]
    pub status_labels: StatusLabels,

    /// Lead type tag to display string. Unknown tags are shown as-is.
    #[serde(default = "default_lead_type_labels")]
    pub lead_type_labels: BTreeMap<String, String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            write_mode: WriteMode::default(),
            csv_path: None,
            status_labels: StatusLabels::default(),
            lead_type_labels: default_lead_type_labels(),
        }
    }
}

fn default_lead_type_labels() -> BTreeMap<String, String> {
    [
        ("direct_hire", "Direct Hire"),
        ("project_work", "Project Work"),
        ("paid_help", "Paid Help"),
        ("other", "Other"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

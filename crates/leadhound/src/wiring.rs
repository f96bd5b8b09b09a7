// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Construction of the adapters and pipeline stages shared by the commands.

use std::sync::Arc;

use leadhound_config::LeadhoundConfig;
use leadhound_config::model::ExportConfig;
use leadhound_core::{LeadhoundError, OpportunitySink};
use leadhound_discord::DiscordSource;
use leadhound_export::{CsvSink, RowFormatter};
use leadhound_openai::OpenAiClassifier;
use leadhound_pipeline::{Classifier, KeywordFilter, Recorder};
use leadhound_storage::SqliteStore;
use tracing::{error, info};

/// Opens the SQLite store and applies migrations.
pub async fn open_store(config: &LeadhoundConfig) -> Result<Arc<SqliteStore>, LeadhoundError> {
    let store = SqliteStore::new(config.storage.clone());
    store.initialize().await?;
    Ok(Arc::new(store))
}

/// Export sinks enabled in configuration.
pub fn build_sinks(export: &ExportConfig) -> Vec<Arc<dyn OpportunitySink>> {
    let mut sinks: Vec<Arc<dyn OpportunitySink>> = Vec::new();
    if let Some(path) = &export.csv_path {
        info!(path = %path, "csv export enabled");
        sinks.push(Arc::new(CsvSink::new(path, RowFormatter::from_config(export))));
    }
    sinks
}

/// Stages used by both live mode and backfill.
pub struct Pipeline {
    pub store: Arc<SqliteStore>,
    pub filter: Arc<KeywordFilter>,
    pub classifier: Arc<Classifier>,
    pub recorder: Arc<Recorder>,
}

impl Pipeline {
    pub async fn build(config: &LeadhoundConfig) -> Result<Self, LeadhoundError> {
        let store = open_store(config).await?;
        let filter = Arc::new(KeywordFilter::new(&config.filter.keywords)?);
        let port = Arc::new(OpenAiClassifier::new(&config.openai)?);
        let classifier = Arc::new(Classifier::new(port, config.openai.concurrency));
        let recorder = Arc::new(Recorder::new(
            store.clone(),
            build_sinks(&config.export),
            config.export.write_mode,
        ));
        Ok(Self {
            store,
            filter,
            classifier,
            recorder,
        })
    }
}

/// Authenticates every configured account, skipping the ones that fail.
///
/// Errors only when no account could be connected.
pub async fn connect_sources(
    config: &LeadhoundConfig,
) -> Result<Vec<Arc<DiscordSource>>, LeadhoundError> {
    if config.discord.accounts.is_empty() {
        return Err(LeadhoundError::Config(
            "no discord accounts configured".to_string(),
        ));
    }
    let mut sources = Vec::new();
    for account in &config.discord.accounts {
        match DiscordSource::connect(account).await {
            Ok(source) => sources.push(Arc::new(source)),
            Err(e) => error!(account = %account.name, error = %e, "skipping discord account"),
        }
    }
    if sources.is_empty() {
        return Err(LeadhoundError::Source {
            message: "no discord account could be authenticated".to_string(),
            source: None,
        });
    }
    Ok(sources)
}

// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `leadhound backfill` command implementation.
//!
//! Runs one orchestrator per authenticated account, one after another. The
//! accounts share the store, the classifier and one request rate limiter.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use leadhound_config::LeadhoundConfig;
use leadhound_core::LeadhoundError;
use leadhound_pipeline::{
    BackfillOrchestrator, BackfillPorts, BackfillReport, BackfillSettings, RateLimiter,
};
use tracing::{error, info, warn};

use crate::wiring::{Pipeline, connect_sources};

pub async fn run_backfill(
    config: LeadhoundConfig,
    report_path: Option<PathBuf>,
) -> Result<(), LeadhoundError> {
    let stages = Pipeline::build(&config).await?;
    let sources = connect_sources(&config).await?;
    let limiter = Arc::new(RateLimiter::new(config.discord.request_interval()));
    let settings = BackfillSettings::from_config(&config);

    let mut reports = Vec::with_capacity(sources.len());
    for source in sources {
        let orchestrator = BackfillOrchestrator::new(
            BackfillPorts {
                source,
                store: stages.store.clone(),
                filter: stages.filter.clone(),
                classifier: stages.classifier.clone(),
                limiter: limiter.clone(),
                recorder: stages.recorder.clone(),
            },
            settings,
        );
        let report = orchestrator.run().await;
        log_report(&report);
        reports.push(report);
    }

    stages.store.checkpoint().await?;
    if let Some(path) = report_path {
        write_report(&path, &reports)?;
        info!(path = %path.display(), "backfill report written");
    }
    Ok(())
}

fn log_report(report: &BackfillReport) {
    info!(
        account = %report.account,
        channels = report.channels_discovered,
        skipped = report.channels_skipped,
        succeeded = report.channels_succeeded,
        aborted = report.channels_aborted,
        failed = report.channels_failed,
        scanned = report.messages_scanned,
        matches = report.keyword_matches,
        duplicates = report.duplicates_skipped,
        found = report.opportunities_found,
        inserted = report.opportunities_inserted,
        classification_calls = report.classification_calls,
        "backfill complete"
    );
    if let Some(e) = &report.listing_error {
        error!(account = %report.account, error = %e, "backfill could not list channels");
    }
    if let Some(e) = &report.record_error {
        warn!(account = %report.account, error = %e, "backfill results were not recorded");
    }
}

fn write_report(path: &Path, reports: &[BackfillReport]) -> Result<(), LeadhoundError> {
    let json = serde_json::to_string_pretty(reports)
        .map_err(|e| LeadhoundError::Internal(format!("failed to serialize report: {e}")))?;
    std::fs::write(path, json).map_err(|e| {
        LeadhoundError::Internal(format!("failed to write {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_file_is_a_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_report(&path, &[]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, serde_json::json!([]));
    }

    #[test]
    fn unwritable_report_path_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.json");
        assert!(write_report(&path, &[]).is_err());
    }
}

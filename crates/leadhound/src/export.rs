// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `leadhound export` and `leadhound review` command implementations.

use std::path::Path;

use leadhound_config::LeadhoundConfig;
use leadhound_core::{LeadhoundError, OpportunityStore};
use leadhound_export::{RowFormatter, export_to_file};
use leadhound_storage::SqliteStore;
use tracing::info;

use crate::wiring::open_store;

/// Dumps every stored opportunity, newest first, to `output`.
pub async fn run_export(config: &LeadhoundConfig, output: &Path) -> Result<(), LeadhoundError> {
    let store = open_store(config).await?;
    let written = export_store(&store, &RowFormatter::from_config(&config.export), output).await?;
    info!(rows = written, path = %output.display(), "export complete");
    println!("exported {written} opportunities to {}", output.display());
    Ok(())
}

async fn export_store(
    store: &SqliteStore,
    formatter: &RowFormatter,
    output: &Path,
) -> Result<usize, LeadhoundError> {
    let opportunities = store.list_opportunities(None).await?;
    export_to_file(output, formatter, &opportunities)
}

/// Records a reviewer's verdict on one opportunity.
pub async fn run_review(
    config: &LeadhoundConfig,
    permalink: &str,
    status: &str,
) -> Result<(), LeadhoundError> {
    let store = open_store(config).await?;
    let status = review_status(status)?;
    apply_review(&store, permalink, &status).await?;
    println!("{permalink}: {status}");
    Ok(())
}

fn review_status(raw: &str) -> Result<String, LeadhoundError> {
    let status = raw.trim().to_lowercase();
    if status.is_empty() {
        return Err(LeadhoundError::Config(
            "review status must not be empty".to_string(),
        ));
    }
    Ok(status)
}

async fn apply_review(
    store: &SqliteStore,
    permalink: &str,
    status: &str,
) -> Result<(), LeadhoundError> {
    if store.set_manual_status(permalink, status).await? {
        info!(permalink, status, "review recorded");
        Ok(())
    } else {
        Err(LeadhoundError::Internal(format!(
            "no stored opportunity with link {permalink}"
        )))
    }
}

// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only CSV opportunity sink.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use leadhound_core::{LeadhoundError, Opportunity, OpportunitySink};
use tokio::sync::Mutex;
use tracing::debug;

use crate::row::{HEADER, RowFormatter};

/// Appends one row per opportunity to a CSV file, writing the header when
/// the file is new or empty.
pub struct CsvSink {
    path: PathBuf,
    formatter: RowFormatter,
    /// Serializes appends from concurrent live tasks.
    write_lock: Mutex<()>,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>, formatter: RowFormatter) -> Self {
        Self {
            path: path.into(),
            formatter,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub(crate) fn sink_error(
    context: &str,
    err: impl std::error::Error + Send + Sync + 'static,
) -> LeadhoundError {
    LeadhoundError::Sink {
        message: format!("{context}: {err}"),
        source: Some(Box::new(err)),
    }
}

fn append_rows(path: &Path, rows: &[Vec<String>]) -> Result<(), LeadhoundError> {
    let needs_header = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| sink_error(&format!("failed to open {}", path.display()), e))?;

    let mut writer = csv::Writer::from_writer(file);
    if needs_header {
        writer
            .write_record(HEADER)
            .map_err(|e| sink_error("failed to write csv header", e))?;
    }
    for row in rows {
        writer
            .write_record(row)
            .map_err(|e| sink_error("failed to write csv row", e))?;
    }
    writer
        .flush()
        .map_err(|e| sink_error("failed to flush csv file", e))
}

#[async_trait]
impl OpportunitySink for CsvSink {
    fn name(&self) -> &str {
        "csv"
    }

    async fn save(&self, opportunities: &[Opportunity]) -> Result<(), LeadhoundError> {
        if opportunities.is_empty() {
            return Ok(());
        }
        let rows: Vec<Vec<String>> = opportunities
            .iter()
            .map(|o| self.formatter.row(o, None))
            .collect();
        let count = rows.len();

        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || append_rows(&path, &rows))
            .await
            .map_err(|e| LeadhoundError::Internal(format!("csv writer task failed: {e}")))??;

        debug!(path = %self.path.display(), rows = count, "appended csv rows");
        Ok(())
    }
}

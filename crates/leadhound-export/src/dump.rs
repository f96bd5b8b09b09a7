// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Full export of persisted opportunities.

use std::io::Write;
use std::path::Path;

use leadhound_core::{LeadhoundError, StoredOpportunity};

use crate::csv_sink::sink_error;
use crate::row::{HEADER, RowFormatter};

/// Writes a header and one row per stored opportunity, including its manual
/// review status. Returns the number of data rows written.
pub fn write_export<W: Write>(
    writer: W,
    formatter: &RowFormatter,
    opportunities: &[StoredOpportunity],
) -> Result<usize, LeadhoundError> {
    let mut writer = csv::Writer::from_writer(writer);
    writer
        .write_record(HEADER)
        .map_err(|e| sink_error("failed to write csv header", e))?;
    for stored in opportunities {
        let row = formatter.row(&stored.opportunity, stored.manual_status.as_deref());
        writer
            .write_record(&row)
            .map_err(|e| sink_error("failed to write csv row", e))?;
    }
    writer
        .flush()
        .map_err(|e| sink_error("failed to flush csv output", e))?;
    Ok(opportunities.len())
}

/// Replaces the file at `path` with a full export.
pub fn export_to_file(
    path: &Path,
    formatter: &RowFormatter,
    opportunities: &[StoredOpportunity],
) -> Result<usize, LeadhoundError> {
    let file = std::fs::File::create(path)
        .map_err(|e| sink_error(&format!("failed to create {}", path.display()), e))?;
    write_export(file, formatter, opportunities)
}

// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CSV export for Leadhound: an append-only [`OpportunitySink`] used by the
//! recorder, and a full dump of the store for the `export` command.
//!
//! [`OpportunitySink`]: leadhound_core::OpportunitySink

pub mod csv_sink;
pub mod dump;
pub mod row;

pub use csv_sink::CsvSink;
pub use dump::{export_to_file, write_export};
pub use row::{HEADER, RowFormatter};

// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for classified opportunities.
//!
//! WAL-mode SQLite with embedded migrations and a single writer thread via
//! `tokio-rusqlite`. Permalink uniqueness is enforced by the schema, which
//! makes every insert idempotent.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteStore;
pub use database::Database;
pub use models::{KeywordStats, ServerStats};

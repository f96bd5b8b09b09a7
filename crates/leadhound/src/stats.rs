// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `leadhound stats` command implementation.
//!
//! Aggregates stored opportunities per server and per keyword: hits,
//! qualified leads, reviewer approvals, and the conversion between them.

use leadhound_config::LeadhoundConfig;
use leadhound_core::LeadhoundError;
use leadhound_storage::{KeywordStats, ServerStats};
use serde::Serialize;

use crate::wiring::open_store;

/// One line of a stats table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsRow {
    pub name: String,
    pub hits: u64,
    pub qualified: u64,
    pub approved: u64,
    pub qualification_rate: f64,
    pub approval_rate: f64,
}

impl From<&ServerStats> for StatsRow {
    fn from(s: &ServerStats) -> Self {
        Self {
            name: s.guild_name.clone(),
            hits: s.keyword_hits,
            qualified: s.qualified,
            approved: s.manually_approved,
            qualification_rate: s.qualification_rate(),
            approval_rate: s.approval_rate(),
        }
    }
}

impl From<&KeywordStats> for StatsRow {
    fn from(s: &KeywordStats) -> Self {
        Self {
            name: s.keyword.clone(),
            hits: s.mentions,
            qualified: s.qualified,
            approved: s.manually_approved,
            qualification_rate: s.qualification_rate(),
            approval_rate: s.approval_rate(),
        }
    }
}

/// Structured output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub servers: Vec<StatsRow>,
    pub keywords: Vec<StatsRow>,
}

pub async fn run_stats(config: &LeadhoundConfig, json: bool) -> Result<(), LeadhoundError> {
    let store = open_store(config).await?;
    let report = StatsReport {
        servers: store.server_stats().await?.iter().map(StatsRow::from).collect(),
        keywords: store.keyword_stats().await?.iter().map(StatsRow::from).collect(),
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        println!();
        print!("{}", render_table("Server", &report.servers));
        println!();
        print!("{}", render_table("Keyword", &report.keywords));
        println!();
    }
    Ok(())
}

fn percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

fn render_table(title: &str, rows: &[StatsRow]) -> String {
    let mut out = format!(
        "  {title:<30} {:>6} {:>9} {:>8} {:>9} {:>9}\n  {}\n",
        "Hits",
        "Qualified",
        "Approved",
        "Qual %",
        "Appr %",
        "-".repeat(76)
    );
    if rows.is_empty() {
        out.push_str("  (no data)\n");
    }
    for row in rows {
        out.push_str(&format!(
            "  {:<30} {:>6} {:>9} {:>8} {:>9} {:>9}\n",
            row.name,
            row.hits,
            row.qualified,
            row.approved,
            percent(row.qualification_rate),
            percent(row.approval_rate)
        ));
    }
    out
}

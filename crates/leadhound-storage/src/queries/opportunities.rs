// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opportunity inserts, lookups, and listing.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use leadhound_core::{LeadhoundError, Opportunity, StoredOpportunity};
use rusqlite::{OptionalExtension, params, params_from_iter};

use crate::database::{Database, map_tr_err};
use crate::models::{OPPORTUNITY_COLUMNS, OpportunityRow, format_timestamp, parse_timestamp};

/// SQLite caps bound parameters per statement; stay well below it.
const PERMALINK_CHUNK: usize = 500;

fn insert_sql() -> String {
    format!(
        "INSERT OR IGNORE INTO opportunities ({OPPORTUNITY_COLUMNS}) VALUES \
         (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, \
          ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26)"
    )
}

fn insert_row(stmt: &mut rusqlite::Statement<'_>, row: &OpportunityRow) -> rusqlite::Result<usize> {
    let s2 = row.stage_two.as_ref();
    stmt.execute(params![
        row.message_id,
        row.message_url,
        row.channel_id,
        row.channel_name,
        row.guild_id,
        row.guild_name,
        row.author_id,
        row.author_name,
        row.content,
        row.message_timestamp,
        row.keyword,
        row.stage_one.status,
        row.stage_one.score,
        row.stage_one.reason,
        row.stage_one.lead_type,
        row.stage_one.tags,
        s2.map(|s| s.status.as_str()),
        s2.map(|s| s.score),
        s2.and_then(|s| s.reason.as_deref()),
        s2.and_then(|s| s.lead_type.as_deref()),
        s2.and_then(|s| s.tags.as_deref()),
        row.final_status,
        row.account_id,
        row.account_name,
        row.source_mode,
        row.processed_at,
    ])
}

fn now() -> String {
    format_timestamp(&Utc::now())
}

/// Inserts one opportunity. Returns the new row id, or `None` when the
/// permalink is already stored.
pub async fn insert_opportunity(
    db: &Database,
    opportunity: &Opportunity,
) -> Result<Option<i64>, LeadhoundError> {
    let row = OpportunityRow::from_opportunity(opportunity, &now());
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare_cached(&insert_sql())?;
            let changed = insert_row(&mut stmt, &row)?;
            Ok((changed > 0).then(|| conn.last_insert_rowid()))
        })
        .await
        .map_err(map_tr_err)
}

/// Inserts many opportunities in one transaction, ignoring duplicate
/// permalinks. Returns how many rows were inserted.
pub async fn insert_opportunities(
    db: &Database,
    opportunities: &[Opportunity],
) -> Result<usize, LeadhoundError> {
    if opportunities.is_empty() {
        return Ok(0);
    }
    let processed_at = now();
    let rows: Vec<OpportunityRow> = opportunities
        .iter()
        .map(|o| OpportunityRow::from_opportunity(o, &processed_at))
        .collect();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let mut inserted = 0;
            {
                let mut stmt = tx.prepare_cached(&insert_sql())?;
                for row in &rows {
                    inserted += insert_row(&mut stmt, row)?;
                }
            }
            tx.commit()?;
            Ok(inserted)
        })
        .await
        .map_err(map_tr_err)
}

/// Newest stored message timestamp for a channel.
pub async fn latest_timestamp_for_channel(
    db: &Database,
    channel_id: u64,
) -> Result<Option<DateTime<Utc>>, LeadhoundError> {
    let channel_id = channel_id.to_string();
    let latest: Option<String> = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT MAX(message_timestamp) FROM opportunities WHERE channel_id = ?1",
                params![channel_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)?;
    latest.as_deref().map(parse_timestamp).transpose()
}

/// Returns which of `permalinks` are already stored.
pub async fn existing_permalinks(
    db: &Database,
    permalinks: &HashSet<String>,
) -> Result<HashSet<String>, LeadhoundError> {
    if permalinks.is_empty() {
        return Ok(HashSet::new());
    }
    let candidates: Vec<String> = permalinks.iter().cloned().collect();
    db.connection()
        .call(move |conn| {
            let mut found = HashSet::new();
            for chunk in candidates.chunks(PERMALINK_CHUNK) {
                let placeholders = vec!["?"; chunk.len()].join(", ");
                let sql = format!(
                    "SELECT message_url FROM opportunities WHERE message_url IN ({placeholders})"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                    row.get::<_, String>(0)
                })?;
                for url in rows {
                    found.insert(url?);
                }
            }
            Ok(found)
        })
        .await
        .map_err(map_tr_err)
}

/// Lists opportunities, newest message first.
pub async fn list_opportunities(
    db: &Database,
    limit: Option<usize>,
) -> Result<Vec<StoredOpportunity>, LeadhoundError> {
    // SQLite treats a negative LIMIT as unbounded.
    let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
    let rows = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT id, manual_status, {OPPORTUNITY_COLUMNS} FROM opportunities
                 ORDER BY message_timestamp DESC, id DESC LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], OpportunityRow::read)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)?;

    rows.into_iter()
        .map(|(id, manual_status, row)| row.into_stored(id, manual_status))
        .collect()
}

/// Records a reviewer's verdict. Returns false when no row has that permalink.
pub async fn set_manual_status(
    db: &Database,
    permalink: &str,
    status: &str,
) -> Result<bool, LeadhoundError> {
    let permalink = permalink.to_string();
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE opportunities SET manual_status = ?1 WHERE message_url = ?2",
                params![status, permalink],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Fetches a single opportunity by permalink.
pub async fn get_by_permalink(
    db: &Database,
    permalink: &str,
) -> Result<Option<StoredOpportunity>, LeadhoundError> {
    let permalink = permalink.to_string();
    let row = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT id, manual_status, {OPPORTUNITY_COLUMNS} FROM opportunities
                     WHERE message_url = ?1"
                ),
                params![permalink],
                OpportunityRow::read,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    row.map(|(id, manual_status, row)| row.into_stored(id, manual_status))
        .transpose()
}

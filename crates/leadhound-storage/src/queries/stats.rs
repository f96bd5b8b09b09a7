// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregate counts for the `stats` command.

use leadhound_core::LeadhoundError;

use crate::database::{Database, map_tr_err};
use crate::models::{KeywordStats, ServerStats};

const QUALIFIED: &str = "final_status IN ('RELEVANT', 'POSSIBLY_RELEVANT')";
const APPROVED: &str = "LOWER(manual_status) = 'approved'";

/// Per-server counts, busiest server first.
pub async fn server_stats(db: &Database) -> Result<Vec<ServerStats>, LeadhoundError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT COALESCE(guild_name, 'Direct Messages') AS server,
                        COUNT(*),
                        SUM(CASE WHEN {QUALIFIED} THEN 1 ELSE 0 END),
                        SUM(CASE WHEN {APPROVED} THEN 1 ELSE 0 END)
                 FROM opportunities
                 GROUP BY server
                 ORDER BY COUNT(*) DESC, server ASC"
            ))?;
            let rows = stmt.query_map([], |row| {
                Ok(ServerStats {
                    guild_name: row.get(0)?,
                    keyword_hits: row.get::<_, i64>(1)?.unsigned_abs(),
                    qualified: row.get::<_, i64>(2)?.unsigned_abs(),
                    manually_approved: row.get::<_, i64>(3)?.unsigned_abs(),
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Per-keyword counts, most mentioned first. Rows without a keyword are skipped.
pub async fn keyword_stats(db: &Database) -> Result<Vec<KeywordStats>, LeadhoundError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT LOWER(keyword) AS kw,
                        COUNT(*),
                        SUM(CASE WHEN {QUALIFIED} THEN 1 ELSE 0 END),
                        SUM(CASE WHEN {APPROVED} THEN 1 ELSE 0 END)
                 FROM opportunities
                 WHERE keyword IS NOT NULL
                 GROUP BY kw
                 ORDER BY COUNT(*) DESC, kw ASC"
            ))?;
            let rows = stmt.query_map([], |row| {
                Ok(KeywordStats {
                    keyword: row.get(0)?,
                    mentions: row.get::<_, i64>(1)?.unsigned_abs(),
                    qualified: row.get::<_, i64>(2)?.unsigned_abs(),
                    manually_approved: row.get::<_, i64>(3)?.unsigned_abs(),
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

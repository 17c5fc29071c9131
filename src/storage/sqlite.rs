//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::config::CrawlJobConfig;
use crate::content::{NormalizedContent, RenderMode};
use crate::state::{JobStatus, SkipReason, TriggerSource, UrlState};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    ContentWrite, EnqueueOutcome, JobCounters, JobRecord, PageRecord, UrlEntry,
};
use crate::url::url_key;
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

const ENTRY_COLUMNS: &str = "id, project_id, url, depth, origin_url, state, skip_reason, \
     http_status, content_hash, last_error, response_time_ms, claimed_by, claimed_at, \
     first_seen_at, last_crawled_at, last_crawl_job_id";

const JOB_COLUMNS: &str = "id, project_id, base_url, config, config_hash, status, \
     trigger_source, progress, pages_discovered, pages_crawled, pages_failed, pages_skipped, \
     created_at, started_at, completed_at, error_message";

const CONTENT_COLUMNS: &str = "content_hash, title, meta_description, canonical_url, headings, \
     body_text, word_count, links, images, structured_data, raw_html, http_status, \
     response_time_ms, body_bytes";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Resolves a terminal update that touched no row
    ///
    /// Repeating the state the entry already has is a no-op; anything else
    /// is a refused transition.
    fn unchanged_transition(&self, entry_id: i64, to: UrlState) -> StorageResult<bool> {
        let entry = self.get_entry(entry_id)?;
        if entry.state == to {
            Ok(false)
        } else {
            Err(StorageError::InvalidTransition {
                from: entry.state,
                to,
            })
        }
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Oldest `claimed_at` that still counts as a live lease
fn lease_cutoff(lease: Duration) -> i64 {
    now_millis() - i64::try_from(lease.as_millis()).unwrap_or(i64::MAX / 2)
}

fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn optional_u64(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<u64>> {
    Ok(row.get::<_, Option<i64>>(idx)?.map(|v| v.max(0) as u64))
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<UrlEntry> {
    let state: String = row.get(5)?;
    let skip_reason: Option<String> = row.get(6)?;

    Ok(UrlEntry {
        id: row.get(0)?,
        project_id: row.get(1)?,
        url: row.get(2)?,
        depth: row.get(3)?,
        origin_url: row.get(4)?,
        state: UrlState::from_db_string(&state).unwrap_or(UrlState::Failed),
        skip_reason: skip_reason.as_deref().and_then(SkipReason::from_db_string),
        http_status: row.get(7)?,
        content_hash: row.get(8)?,
        last_error: row.get(9)?,
        response_time_ms: optional_u64(row, 10)?,
        claimed_by: row.get(11)?,
        claimed_at: row.get(12)?,
        first_seen_at: row.get(13)?,
        last_crawled_at: row.get(14)?,
        last_crawl_job_id: row.get(15)?,
    })
}

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<JobRecord> {
    let status: String = row.get(5)?;
    let trigger: String = row.get(6)?;
    let config: CrawlJobConfig = json_column(row, 3)?;

    Ok(JobRecord {
        id: row.get(0)?,
        project_id: row.get(1)?,
        base_url: row.get(2)?,
        config,
        config_hash: row.get(4)?,
        status: JobStatus::from_db_string(&status).unwrap_or(JobStatus::Failed),
        trigger: TriggerSource::from_db_string(&trigger).unwrap_or(TriggerSource::Manual),
        progress: row.get(7)?,
        counters: JobCounters {
            discovered: row.get::<_, i64>(8)?.max(0) as u64,
            crawled: row.get::<_, i64>(9)?.max(0) as u64,
            failed: row.get::<_, i64>(10)?.max(0) as u64,
            skipped: row.get::<_, i64>(11)?.max(0) as u64,
        },
        created_at: row.get(12)?,
        started_at: row.get(13)?,
        completed_at: row.get(14)?,
        error_message: row.get(15)?,
    })
}

fn content_from_row(row: &Row<'_>) -> rusqlite::Result<NormalizedContent> {
    Ok(NormalizedContent {
        content_hash: row.get(0)?,
        title: row.get(1)?,
        meta_description: row.get(2)?,
        canonical_url: row.get(3)?,
        headings: json_column(row, 4)?,
        body_text: row.get(5)?,
        word_count: row.get(6)?,
        links: json_column(row, 7)?,
        images: json_column(row, 8)?,
        structured_data: json_column(row, 9)?,
        raw_html: row.get(10)?,
        render_mode: RenderMode::Static,
        http_status: row.get(11)?,
        response_time_ms: row.get::<_, i64>(12)?.max(0) as u64,
        body_bytes: row.get::<_, i64>(13)?.max(0) as u64,
    })
}

impl Storage for SqliteStorage {
    // ===== Job Management =====

    fn create_job(
        &mut self,
        project_id: &str,
        base_url: &str,
        config: &CrawlJobConfig,
        trigger: TriggerSource,
        config_hash: Option<&str>,
    ) -> StorageResult<i64> {
        let config_json = serde_json::to_string(config)?;
        self.conn.execute(
            "INSERT INTO crawl_jobs (project_id, base_url, config, config_hash, status,
             trigger_source, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                project_id,
                base_url,
                config_json,
                config_hash,
                JobStatus::Pending.to_db_string(),
                trigger.to_db_string(),
                now_rfc3339()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_job(&self, job_id: i64) -> StorageResult<JobRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM crawl_jobs WHERE id = ?1", JOB_COLUMNS),
                params![job_id],
                job_from_row,
            )
            .optional()?
            .ok_or(StorageError::JobNotFound(job_id))
    }

    fn list_jobs(&self, project_id: &str, limit: usize) -> StorageResult<Vec<JobRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM crawl_jobs WHERE project_id = ?1 ORDER BY id DESC LIMIT ?2",
            JOB_COLUMNS
        ))?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![project_id, limit], job_from_row)?;

        let mut jobs = Vec::new();
        for row in rows {
            jobs.push(row?);
        }
        Ok(jobs)
    }

    fn transition_job(
        &mut self,
        job_id: i64,
        to: JobStatus,
        error: Option<&str>,
    ) -> StorageResult<()> {
        let current = self.get_job(job_id)?.status;
        if !current.can_transition_to(to) {
            return Err(StorageError::InvalidJobTransition { from: current, to });
        }

        let now = now_rfc3339();
        let error = if to == JobStatus::Failed { error } else { None };

        // Compare-and-set on the status read above
        let changed = self.conn.execute(
            "UPDATE crawl_jobs SET
                status = ?1,
                started_at = CASE WHEN ?1 = 'running' THEN ?2 ELSE started_at END,
                completed_at = CASE WHEN ?3 THEN ?2 ELSE completed_at END,
                progress = CASE WHEN ?1 = 'completed' THEN 100.0 ELSE progress END,
                error_message = COALESCE(?4, error_message)
             WHERE id = ?5 AND status = ?6",
            params![
                to.to_db_string(),
                now,
                to.is_terminal(),
                error,
                job_id,
                current.to_db_string()
            ],
        )?;

        if changed == 0 {
            let from = self.get_job(job_id)?.status;
            return Err(StorageError::InvalidJobTransition { from, to });
        }

        Ok(())
    }

    fn update_job_progress(
        &mut self,
        job_id: i64,
        counters: &JobCounters,
        progress: f64,
    ) -> StorageResult<()> {
        let changed = self.conn.execute(
            "UPDATE crawl_jobs SET
                pages_discovered = ?1,
                pages_crawled = ?2,
                pages_failed = ?3,
                pages_skipped = ?4,
                progress = MAX(progress, ?5)
             WHERE id = ?6 AND status = ?7",
            params![
                counters.discovered as i64,
                counters.crawled as i64,
                counters.failed as i64,
                counters.skipped as i64,
                progress.clamp(0.0, 100.0),
                job_id,
                JobStatus::Running.to_db_string()
            ],
        )?;

        if changed == 0 {
            let from = self.get_job(job_id)?.status;
            return Err(StorageError::InvalidJobTransition {
                from,
                to: JobStatus::Running,
            });
        }

        Ok(())
    }

    fn fail_interrupted_jobs(&mut self, project_id: &str, message: &str) -> StorageResult<usize> {
        let changed = self.conn.execute(
            "UPDATE crawl_jobs SET status = ?1, completed_at = ?2, error_message = ?3
             WHERE project_id = ?4 AND status IN (?5, ?6)",
            params![
                JobStatus::Failed.to_db_string(),
                now_rfc3339(),
                message,
                project_id,
                JobStatus::Pending.to_db_string(),
                JobStatus::Running.to_db_string()
            ],
        )?;
        Ok(changed)
    }

    fn save_job_report(&mut self, job_id: i64, report_json: &str) -> StorageResult<bool> {
        if !self.get_job(job_id)?.status.is_terminal() {
            return Err(StorageError::JobNotFinished(job_id));
        }

        let changed = self.conn.execute(
            "UPDATE crawl_jobs SET report = ?1 WHERE id = ?2 AND report IS NULL",
            params![report_json, job_id],
        )?;
        Ok(changed == 1)
    }

    fn get_job_report(&self, job_id: i64) -> StorageResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT report FROM crawl_jobs WHERE id = ?1",
                params![job_id],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .ok_or(StorageError::JobNotFound(job_id))
    }

    // ===== Frontier Management =====

    fn enqueue(
        &mut self,
        project_id: &str,
        url: &str,
        depth: u32,
        origin_url: Option<&str>,
        job_id: i64,
    ) -> StorageResult<EnqueueOutcome> {
        let key = url_key(url)?;

        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO url_inventory
                (project_id, url, depth, origin_url, state, first_seen_at, last_crawl_job_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                project_id,
                key,
                depth,
                origin_url,
                UrlState::Discovered.to_db_string(),
                now_rfc3339(),
                job_id
            ],
        )?;

        if inserted == 1 {
            return Ok(EnqueueOutcome::Inserted(self.conn.last_insert_rowid()));
        }

        // Seen by an earlier job: make it crawlable again for this one
        let rearmed = self.conn.execute(
            "UPDATE url_inventory SET
                state = ?1, depth = ?2, origin_url = ?3, skip_reason = NULL, last_error = NULL,
                claimed_by = NULL, claimed_at = NULL, last_crawl_job_id = ?4
             WHERE project_id = ?5 AND url = ?6
               AND (last_crawl_job_id IS NULL OR last_crawl_job_id < ?4)",
            params![
                UrlState::Discovered.to_db_string(),
                depth,
                origin_url,
                job_id,
                project_id,
                key
            ],
        )?;

        if rearmed == 0 {
            // Same job: a shorter path wins while the entry is unclaimed
            self.conn.execute(
                "UPDATE url_inventory SET depth = ?1, origin_url = ?2
                 WHERE project_id = ?3 AND url = ?4 AND last_crawl_job_id = ?5
                   AND state = ?6 AND depth > ?1",
                params![
                    depth,
                    origin_url,
                    project_id,
                    key,
                    job_id,
                    UrlState::Discovered.to_db_string()
                ],
            )?;
        }

        let id: i64 = self.conn.query_row(
            "SELECT id FROM url_inventory WHERE project_id = ?1 AND url = ?2",
            params![project_id, key],
            |row| row.get(0),
        )?;

        Ok(if rearmed == 1 {
            EnqueueOutcome::Rearmed(id)
        } else {
            EnqueueOutcome::Existing(id)
        })
    }

    fn claim_next(
        &mut self,
        project_id: &str,
        job_id: i64,
        max_depth: u32,
        claimed_by: &str,
        lease: Duration,
    ) -> StorageResult<Option<UrlEntry>> {
        let sql = format!(
            "UPDATE url_inventory SET state = ?1, claimed_by = ?2, claimed_at = ?3
             WHERE id = (
                SELECT id FROM url_inventory
                WHERE project_id = ?4 AND last_crawl_job_id = ?5 AND depth <= ?6
                  AND (state = ?7 OR (state = ?1 AND claimed_at < ?8))
                ORDER BY depth, id
                LIMIT 1
             )
             RETURNING {}",
            ENTRY_COLUMNS
        );

        let entry = self
            .conn
            .query_row(
                &sql,
                params![
                    UrlState::Queued.to_db_string(),
                    claimed_by,
                    now_millis(),
                    project_id,
                    job_id,
                    max_depth,
                    UrlState::Discovered.to_db_string(),
                    lease_cutoff(lease)
                ],
                entry_from_row,
            )
            .optional()?;

        Ok(entry)
    }

    fn reclaim_expired(
        &mut self,
        project_id: &str,
        job_id: i64,
        lease: Duration,
    ) -> StorageResult<usize> {
        let changed = self.conn.execute(
            "UPDATE url_inventory SET state = ?1, claimed_by = NULL, claimed_at = NULL
             WHERE project_id = ?2 AND last_crawl_job_id = ?3 AND state = ?4
               AND claimed_at < ?5",
            params![
                UrlState::Discovered.to_db_string(),
                project_id,
                job_id,
                UrlState::Queued.to_db_string(),
                lease_cutoff(lease)
            ],
        )?;
        Ok(changed)
    }

    fn renew_leases(&mut self, entry_ids: &[i64], claimed_by: &str) -> StorageResult<usize> {
        if entry_ids.is_empty() {
            return Ok(0);
        }

        let now = now_millis();
        let tx = self.conn.transaction()?;
        let mut renewed = 0;
        {
            let mut stmt = tx.prepare(
                "UPDATE url_inventory SET claimed_at = ?1
                 WHERE id = ?2 AND state = ?3 AND claimed_by = ?4",
            )?;
            for id in entry_ids {
                renewed += stmt.execute(params![
                    now,
                    id,
                    UrlState::Queued.to_db_string(),
                    claimed_by
                ])?;
            }
        }
        tx.commit()?;
        Ok(renewed)
    }

    fn count_in_flight(
        &self,
        project_id: &str,
        job_id: i64,
        lease: Duration,
    ) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM url_inventory
             WHERE project_id = ?1 AND last_crawl_job_id = ?2 AND state = ?3
               AND claimed_at >= ?4",
            params![
                project_id,
                job_id,
                UrlState::Queued.to_db_string(),
                lease_cutoff(lease)
            ],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn get_entry(&self, entry_id: i64) -> StorageResult<UrlEntry> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM url_inventory WHERE id = ?1", ENTRY_COLUMNS),
                params![entry_id],
                entry_from_row,
            )
            .optional()?
            .ok_or(StorageError::EntryNotFound(entry_id))
    }

    fn get_entry_by_url(&self, project_id: &str, url: &str) -> StorageResult<Option<UrlEntry>> {
        let key = url_key(url)?;
        let entry = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM url_inventory WHERE project_id = ?1 AND url = ?2",
                    ENTRY_COLUMNS
                ),
                params![project_id, key],
                entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    fn mark_crawled(
        &mut self,
        entry_id: i64,
        http_status: u16,
        content_hash: Option<&str>,
        response_time_ms: u64,
    ) -> StorageResult<bool> {
        let changed = self.conn.execute(
            "UPDATE url_inventory SET
                state = ?1, http_status = ?2, content_hash = ?3, response_time_ms = ?4,
                last_error = NULL, skip_reason = NULL, claimed_by = NULL, claimed_at = NULL,
                last_crawled_at = ?5
             WHERE id = ?6 AND state IN (?7, ?8)",
            params![
                UrlState::Crawled.to_db_string(),
                http_status,
                content_hash,
                response_time_ms as i64,
                now_rfc3339(),
                entry_id,
                UrlState::Discovered.to_db_string(),
                UrlState::Queued.to_db_string()
            ],
        )?;

        if changed == 0 {
            return self.unchanged_transition(entry_id, UrlState::Crawled);
        }
        Ok(true)
    }

    fn mark_failed(
        &mut self,
        entry_id: i64,
        http_status: Option<u16>,
        error: &str,
        response_time_ms: Option<u64>,
    ) -> StorageResult<bool> {
        let changed = self.conn.execute(
            "UPDATE url_inventory SET
                state = ?1, http_status = ?2, last_error = ?3, response_time_ms = ?4,
                skip_reason = NULL, claimed_by = NULL, claimed_at = NULL, last_crawled_at = ?5
             WHERE id = ?6 AND state IN (?7, ?8)",
            params![
                UrlState::Failed.to_db_string(),
                http_status,
                error,
                response_time_ms.map(|v| v as i64),
                now_rfc3339(),
                entry_id,
                UrlState::Discovered.to_db_string(),
                UrlState::Queued.to_db_string()
            ],
        )?;

        if changed == 0 {
            return self.unchanged_transition(entry_id, UrlState::Failed);
        }
        Ok(true)
    }

    fn mark_skipped(&mut self, entry_id: i64, reason: SkipReason) -> StorageResult<bool> {
        let changed = self.conn.execute(
            "UPDATE url_inventory SET
                state = ?1, skip_reason = ?2, claimed_by = NULL, claimed_at = NULL
             WHERE id = ?3 AND state IN (?4, ?5)",
            params![
                UrlState::Skipped.to_db_string(),
                reason.to_db_string(),
                entry_id,
                UrlState::Discovered.to_db_string(),
                UrlState::Queued.to_db_string()
            ],
        )?;

        if changed == 0 {
            return self.unchanged_transition(entry_id, UrlState::Skipped);
        }
        Ok(true)
    }

    fn skip_unclaimed(
        &mut self,
        project_id: &str,
        job_id: i64,
        reason: SkipReason,
    ) -> StorageResult<usize> {
        let changed = self.conn.execute(
            "UPDATE url_inventory SET state = ?1, skip_reason = ?2
             WHERE project_id = ?3 AND last_crawl_job_id = ?4 AND state = ?5",
            params![
                UrlState::Skipped.to_db_string(),
                reason.to_db_string(),
                project_id,
                job_id,
                UrlState::Discovered.to_db_string()
            ],
        )?;
        Ok(changed)
    }

    // ===== Content Store =====

    fn upsert_content(
        &mut self,
        project_id: &str,
        url: &str,
        job_id: i64,
        content: &NormalizedContent,
    ) -> StorageResult<ContentWrite> {
        let key = url_key(url)?;
        let tx = self.conn.transaction()?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT content_hash FROM page_content WHERE project_id = ?1 AND url = ?2",
                params![project_id, key],
                |row| row.get(0),
            )
            .optional()?;

        let outcome = match existing {
            Some(hash) if hash == content.content_hash => return Ok(ContentWrite::Unchanged),
            Some(_) => ContentWrite::Updated,
            None => ContentWrite::Inserted,
        };

        tx.execute(
            "INSERT OR REPLACE INTO page_content (
                project_id, url, content_hash, title, meta_description, canonical_url,
                headings, body_text, word_count, links, images, structured_data, raw_html,
                render_mode, http_status, response_time_ms, body_bytes, crawl_job_id, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                       ?17, ?18, ?19)",
            params![
                project_id,
                key,
                content.content_hash,
                content.title,
                content.meta_description,
                content.canonical_url,
                serde_json::to_string(&content.headings)?,
                content.body_text,
                content.word_count,
                serde_json::to_string(&content.links)?,
                serde_json::to_string(&content.images)?,
                serde_json::to_string(&content.structured_data)?,
                content.raw_html,
                content.render_mode.to_db_string(),
                content.http_status,
                content.response_time_ms as i64,
                content.body_bytes as i64,
                job_id,
                now_rfc3339()
            ],
        )?;

        tx.commit()?;
        Ok(outcome)
    }

    fn get_content(
        &self,
        project_id: &str,
        url: &str,
    ) -> StorageResult<Option<NormalizedContent>> {
        let key = url_key(url)?;
        let content = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM page_content WHERE project_id = ?1 AND url = ?2",
                    CONTENT_COLUMNS
                ),
                params![project_id, key],
                content_from_row,
            )
            .optional()?;
        Ok(content)
    }

    // ===== Statistics =====

    fn count_by_state(
        &self,
        project_id: &str,
        job_id: i64,
    ) -> StorageResult<HashMap<UrlState, u64>> {
        let mut stmt = self.conn.prepare(
            "SELECT state, COUNT(*) FROM url_inventory
             WHERE project_id = ?1 AND last_crawl_job_id = ?2
             GROUP BY state",
        )?;

        let rows = stmt.query_map(params![project_id, job_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = HashMap::new();
        for row in rows {
            let (state, count) = row?;
            if let Some(state) = UrlState::from_db_string(&state) {
                counts.insert(state, count as u64);
            }
        }
        Ok(counts)
    }

    fn count_skipped_by_reason(
        &self,
        project_id: &str,
        job_id: i64,
    ) -> StorageResult<HashMap<SkipReason, u64>> {
        let mut stmt = self.conn.prepare(
            "SELECT skip_reason, COUNT(*) FROM url_inventory
             WHERE project_id = ?1 AND last_crawl_job_id = ?2 AND state = ?3
               AND skip_reason IS NOT NULL
             GROUP BY skip_reason",
        )?;

        let rows = stmt.query_map(
            params![project_id, job_id, UrlState::Skipped.to_db_string()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
        )?;

        let mut counts = HashMap::new();
        for row in rows {
            let (reason, count) = row?;
            if let Some(reason) = SkipReason::from_db_string(&reason) {
                counts.insert(reason, count as u64);
            }
        }
        Ok(counts)
    }

    fn job_pages(&self, job_id: i64) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM url_inventory
             WHERE last_crawl_job_id = ?1 AND state IN (?2, ?3)
             ORDER BY last_crawled_at, id",
            ENTRY_COLUMNS
        ))?;

        let rows = stmt.query_map(
            params![
                job_id,
                UrlState::Crawled.to_db_string(),
                UrlState::Failed.to_db_string()
            ],
            entry_from_row,
        )?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }

        let mut pages = Vec::with_capacity(entries.len());
        for entry in entries {
            let content = if entry.state == UrlState::Crawled {
                self.get_content(&entry.project_id, &entry.url)?
            } else {
                None
            };
            pages.push(PageRecord { entry, content });
        }
        Ok(pages)
    }
}

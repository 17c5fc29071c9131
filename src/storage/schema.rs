//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the crawl database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Crawl jobs and their aggregate progress
CREATE TABLE IF NOT EXISTS crawl_jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id TEXT NOT NULL,
    base_url TEXT NOT NULL,
    config TEXT NOT NULL,
    config_hash TEXT,
    status TEXT NOT NULL,
    trigger_source TEXT NOT NULL,
    progress REAL NOT NULL DEFAULT 0,
    pages_discovered INTEGER NOT NULL DEFAULT 0,
    pages_crawled INTEGER NOT NULL DEFAULT 0,
    pages_failed INTEGER NOT NULL DEFAULT 0,
    pages_skipped INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    started_at TEXT,
    completed_at TEXT,
    error_message TEXT,
    report TEXT
);

CREATE INDEX IF NOT EXISTS idx_crawl_jobs_project ON crawl_jobs(project_id, status);

-- Every URL a project has ever seen
CREATE TABLE IF NOT EXISTS url_inventory (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id TEXT NOT NULL,
    url TEXT NOT NULL,
    depth INTEGER NOT NULL,
    origin_url TEXT,
    state TEXT NOT NULL,
    skip_reason TEXT,
    http_status INTEGER,
    content_hash TEXT,
    last_error TEXT,
    response_time_ms INTEGER,
    claimed_by TEXT,
    claimed_at INTEGER,
    first_seen_at TEXT NOT NULL,
    last_crawled_at TEXT,
    last_crawl_job_id INTEGER REFERENCES crawl_jobs(id),
    UNIQUE(project_id, url)
);

CREATE INDEX IF NOT EXISTS idx_url_inventory_claim
    ON url_inventory(project_id, last_crawl_job_id, state, depth);

-- Latest extracted content per page
CREATE TABLE IF NOT EXISTS page_content (
    project_id TEXT NOT NULL,
    url TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    title TEXT,
    meta_description TEXT,
    canonical_url TEXT,
    headings TEXT NOT NULL,
    body_text TEXT NOT NULL,
    word_count INTEGER NOT NULL,
    links TEXT NOT NULL,
    images TEXT NOT NULL,
    structured_data TEXT NOT NULL,
    raw_html TEXT,
    render_mode TEXT NOT NULL,
    http_status INTEGER NOT NULL,
    response_time_ms INTEGER NOT NULL,
    body_bytes INTEGER NOT NULL,
    crawl_job_id INTEGER REFERENCES crawl_jobs(id),
    updated_at TEXT NOT NULL,
    PRIMARY KEY (project_id, url)
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Databases created before final reports were stored
    add_column_if_missing(conn, "crawl_jobs", "report", "TEXT")?;
    Ok(())
}

fn add_column_if_missing(
    conn: &rusqlite::Connection,
    table: &str,
    column: &str,
    decl: &str,
) -> Result<(), rusqlite::Error> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM pragma_table_info(?1) WHERE name = ?2",
        rusqlite::params![table, column],
        |row| row.get(0),
    )?;

    if !exists {
        conn.execute_batch(&format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, decl))?;
    }
    Ok(())
}

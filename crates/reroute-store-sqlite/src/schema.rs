//! SQL schema for the Reroute SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS redirects (
    id          TEXT PRIMARY KEY,
    source_url  TEXT NOT NULL UNIQUE, -- normalized path; the matching key
    target_url  TEXT NOT NULL,        -- normalized path or absolute URL
    kind        INTEGER NOT NULL DEFAULT 301,      -- 301 | 302
    status      TEXT NOT NULL DEFAULT 'active',    -- 'active' | 'pending'
    is_forced   INTEGER NOT NULL DEFAULT 0,
    hits        INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL         -- ISO 8601 UTC; set once
);

CREATE TABLE IF NOT EXISTS not_found_log (
    id         TEXT PRIMARY KEY,
    url        TEXT NOT NULL UNIQUE,
    hits       INTEGER NOT NULL DEFAULT 1,
    last_seen  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS redirects_target_idx ON redirects(target_url);
CREATE INDEX IF NOT EXISTS redirects_status_idx ON redirects(status);

PRAGMA user_version = 1;
";

//! SQL schema for the polwatch SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `PRAGMA user_version` number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS items (
    item_id     TEXT PRIMARY KEY,
    technology  TEXT NOT NULL,   -- watcher index, e.g. 'policy'
    account     TEXT NOT NULL,
    region      TEXT NOT NULL,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL,   -- RFC 3339 UTC
    UNIQUE (technology, account, region, name)
);

-- Revisions are append-only. The only UPDATE ever issued moves the active
-- flag from an item's previous revision to its newest one.
CREATE TABLE IF NOT EXISTS revisions (
    revision_id  TEXT PRIMARY KEY,
    item_id      TEXT NOT NULL REFERENCES items(item_id),
    active       INTEGER NOT NULL DEFAULT 0,
    date_created TEXT NOT NULL,  -- RFC 3339 UTC; store-assigned
    config       TEXT NOT NULL,  -- raw policy document as compact JSON
    diff_html    TEXT
);

CREATE TABLE IF NOT EXISTS revision_comments (
    comment_id   TEXT PRIMARY KEY,
    revision_id  TEXT NOT NULL REFERENCES revisions(revision_id),
    user         TEXT NOT NULL,
    date_created TEXT NOT NULL,
    text         TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS revisions_item_idx    ON revisions(item_id);
CREATE INDEX IF NOT EXISTS revisions_active_idx  ON revisions(item_id, active);
CREATE INDEX IF NOT EXISTS comments_revision_idx ON revision_comments(revision_id);

PRAGMA user_version = 1;
";

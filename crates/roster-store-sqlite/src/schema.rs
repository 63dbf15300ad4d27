//! SQL schema for the Roster SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS append_lists (
    list_id     TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    description TEXT NOT NULL,
    list_type   TEXT,            -- 'plain' | 'github' | 'others'; legacy 'nightslip' / 'names' / NULL read as plain
    owner_id    TEXT NOT NULL,
    created_at  TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    updated_at  TEXT NOT NULL
);

-- The three person partitions share one table; `partition_key` selects one.
CREATE TABLE IF NOT EXISTS people (
    person_id       TEXT PRIMARY KEY,
    list_id         TEXT NOT NULL REFERENCES append_lists(list_id),
    partition_key   TEXT NOT NULL,   -- 'people' | 'github_people' | 'other_people'
    display_name    TEXT NOT NULL,
    email_key       TEXT,            -- lower-cased
    register_number TEXT,
    payload_json    TEXT NOT NULL,   -- JSON-encoded PersonPayload
    joined_at       TEXT NOT NULL
);

-- At most one record per (list, email) and per (list, name).
CREATE UNIQUE INDEX IF NOT EXISTS people_list_email_idx
    ON people(list_id, email_key) WHERE email_key IS NOT NULL;
CREATE UNIQUE INDEX IF NOT EXISTS people_list_name_idx
    ON people(list_id, display_name);
CREATE INDEX IF NOT EXISTS people_list_joined_idx
    ON people(list_id, partition_key, joined_at);
CREATE INDEX IF NOT EXISTS append_lists_owner_idx
    ON append_lists(owner_id, created_at);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id  TEXT PRIMARY KEY,
    title            TEXT NOT NULL,
    message          TEXT NOT NULL,
    created_at       TEXT NOT NULL,
    created_by_email TEXT
);

CREATE TABLE IF NOT EXISTS notification_acks (
    notification_id TEXT NOT NULL REFERENCES notifications(notification_id),
    viewer_id       TEXT NOT NULL,
    acknowledged_at TEXT NOT NULL,
    PRIMARY KEY (viewer_id, notification_id)
);

CREATE TABLE IF NOT EXISTS push_subscriptions (
    subscription_id TEXT PRIMARY KEY,
    viewer_id       TEXT NOT NULL,
    endpoint        TEXT NOT NULL UNIQUE,
    p256dh          TEXT NOT NULL,
    auth            TEXT NOT NULL,
    expiration_time INTEGER,
    user_agent      TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS notifications_created_idx ON notifications(created_at);
CREATE INDEX IF NOT EXISTS push_subscriptions_viewer_idx ON push_subscriptions(viewer_id);

PRAGMA user_version = 1;
";

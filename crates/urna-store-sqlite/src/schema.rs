//! SQL schema for the Urna SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS admins (
    admin_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,    -- argon2 PHC string
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token       TEXT PRIMARY KEY,
    admin_id    INTEGER NOT NULL REFERENCES admins(admin_id),
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS candidates (
    candidate_id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name   TEXT NOT NULL DEFAULT '',
    last_name    TEXT NOT NULL DEFAULT '',
    category     TEXT NOT NULL DEFAULT '',
    number       TEXT NOT NULL DEFAULT '',
    age          INTEGER,
    bio          TEXT NOT NULL DEFAULT '',
    photo        TEXT,
    published    INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL
);

-- Votes are append-only.
-- Token and fingerprint uniqueness back up the duplicate check done inside
-- the insert transaction. IP is matched by query only: a shared address
-- blocks every voter behind it after the first.
CREATE TABLE IF NOT EXISTS votes (
    vote_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    candidate_id  INTEGER NOT NULL REFERENCES candidates(candidate_id),
    voter_name    TEXT NOT NULL CHECK (voter_name != ''),
    voter_meta    TEXT NOT NULL DEFAULT '',
    voter_token   TEXT NOT NULL UNIQUE,
    voter_ip      TEXT NOT NULL,
    voter_fp_hash TEXT NOT NULL UNIQUE,
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS votes_candidate_idx ON votes(candidate_id);
CREATE INDEX IF NOT EXISTS votes_ip_idx        ON votes(voter_ip);

PRAGMA user_version = 1;
";

//! SQL schema for the kinroll SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per enrolled person. Email uniqueness is enforced here, not in
-- application code, so concurrent sign-ups cannot both succeed.
CREATE TABLE IF NOT EXISTS members (
    member_id         TEXT PRIMARY KEY,
    email             TEXT NOT NULL COLLATE NOCASE,
    password_hash     TEXT NOT NULL,
    family_name       TEXT NOT NULL,
    name              TEXT NOT NULL,
    surname           TEXT NOT NULL,
    role              TEXT NOT NULL,   -- Role wire name, e.g. 'self'
    dob               TEXT NOT NULL,   -- YYYY-MM-DD
    baptism_date      TEXT NOT NULL,
    confirmation_date TEXT NOT NULL,
    marriage_date     TEXT,
    occupation        TEXT NOT NULL,
    marital_status    TEXT NOT NULL,
    phone             TEXT NOT NULL,
    father_name       TEXT NOT NULL,
    mother_name       TEXT,
    rite              TEXT NOT NULL,   -- Rite wire name, e.g. 'syro-malabar'
    parish_origin     TEXT,
    diocese_origin    TEXT,
    present_place     TEXT,
    parish            TEXT,
    diocese           TEXT,
    photo_url         TEXT NOT NULL,
    photo_storage_id  TEXT,
    created_at        TEXT NOT NULL,   -- RFC 3339 UTC, microsecond precision
    updated_at        TEXT NOT NULL,
    UNIQUE (email)
);

-- Global settings; one row per toggle name.
CREATE TABLE IF NOT EXISTS feature_toggles (
    name       TEXT PRIMARY KEY,
    enabled    INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS members_created_idx ON members(created_at);
CREATE INDEX IF NOT EXISTS members_family_idx  ON members(family_name);

PRAGMA user_version = 1;
";

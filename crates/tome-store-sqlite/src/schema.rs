//! SQL schema for the Enchanted Tome SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Keyed by the identity provider's subject claim.
CREATE TABLE IF NOT EXISTS users (
    id                TEXT PRIMARY KEY,
    email             TEXT,
    first_name        TEXT,
    last_name         TEXT,
    profile_image_url TEXT,
    is_admin          INTEGER NOT NULL DEFAULT 0,
    created_at        TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    updated_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS books (
    id             TEXT PRIMARY KEY,   -- UUID v4, store-assigned
    title          TEXT NOT NULL,
    author         TEXT NOT NULL,
    description    TEXT,
    price          REAL NOT NULL DEFAULT 0 CHECK (price >= 0),
    category       TEXT NOT NULL DEFAULT 'Fiction',
    cover_url      TEXT,
    published_year INTEGER,
    pages          INTEGER CHECK (pages IS NULL OR pages > 0),
    in_stock       INTEGER NOT NULL DEFAULT 1,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS books_created_idx ON books(created_at);

PRAGMA user_version = 1;
";

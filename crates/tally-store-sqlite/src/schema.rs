//! SQL schema for the Tally SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Times of day are stored as `HH:MM:SS` text and dates as `YYYY-MM-DD`, so
/// text ordering matches chronological ordering.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS circles (
    id           INTEGER PRIMARY KEY,
    name         TEXT    NOT NULL UNIQUE,
    can_join     INTEGER NOT NULL DEFAULT 0,
    join_code    TEXT,
    bottom_line  TEXT
);

CREATE TABLE IF NOT EXISTS moments (
    id             INTEGER PRIMARY KEY,
    circle_id      INTEGER NOT NULL
                   REFERENCES circles(id) ON UPDATE CASCADE ON DELETE CASCADE,
    name           TEXT    NOT NULL,
    time           TEXT    NOT NULL,   -- HH:MM:SS
    reminder_time  TEXT    NOT NULL,   -- HH:MM:SS
    UNIQUE (circle_id, name),
    UNIQUE (circle_id, time)
);

-- Deleting a circle detaches its members rather than deleting them.
CREATE TABLE IF NOT EXISTS users (
    id              INTEGER PRIMARY KEY,
    circle_id       INTEGER
                    REFERENCES circles(id) ON UPDATE CASCADE ON DELETE SET NULL,
    tid             INTEGER NOT NULL UNIQUE,
    first_name      TEXT    NOT NULL DEFAULT '',
    last_name       TEXT,
    username        TEXT,
    enabled         INTEGER NOT NULL DEFAULT 1,
    default_choice  INTEGER,
    reminder        INTEGER NOT NULL DEFAULT 1,
    loud            INTEGER NOT NULL DEFAULT 0
);

-- One row per (date, moment); never updated or deleted by the application.
CREATE TABLE IF NOT EXISTS phases (
    id         INTEGER PRIMARY KEY,
    date       TEXT    NOT NULL,       -- YYYY-MM-DD
    moment_id  INTEGER NOT NULL
               REFERENCES moments(id) ON UPDATE CASCADE ON DELETE CASCADE,
    UNIQUE (date, moment_id)
);

-- choice: NULL undecided, 0 absent, n >= 1 present with n - 1 guests.
CREATE TABLE IF NOT EXISTS statements (
    id        INTEGER PRIMARY KEY,
    user_id   INTEGER NOT NULL
              REFERENCES users(id) ON UPDATE CASCADE ON DELETE CASCADE,
    phase_id  INTEGER NOT NULL
              REFERENCES phases(id) ON UPDATE CASCADE ON DELETE CASCADE,
    time      TEXT    NOT NULL,        -- ISO 8601 local wall-clock time
    comment   TEXT,
    choice    INTEGER CHECK (choice IS NULL OR choice >= 0),
    UNIQUE (user_id, phase_id)
);

CREATE INDEX IF NOT EXISTS users_circle_idx      ON users(circle_id);
CREATE INDEX IF NOT EXISTS statements_phase_idx  ON statements(phase_id);

PRAGMA user_version = 1;
";

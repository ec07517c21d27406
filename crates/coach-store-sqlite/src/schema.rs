//! SQL schema for the coaching platform SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS communities (
    community_id TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    owner_id     TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS community_members (
    community_id TEXT NOT NULL REFERENCES communities(community_id) ON DELETE CASCADE,
    user_id      TEXT NOT NULL,
    joined_at    TEXT NOT NULL,
    PRIMARY KEY (community_id, user_id)
);

CREATE TABLE IF NOT EXISTS courses (
    course_id       TEXT PRIMARY KEY,
    title           TEXT NOT NULL,
    description     TEXT,
    access_type     TEXT NOT NULL,   -- 'OPEN' | 'SEQUENTIAL' | 'COMMUNITY' | 'PRIVATE'
    prerequisite_id TEXT REFERENCES courses(course_id) ON DELETE SET NULL,
    community_id    TEXT REFERENCES communities(community_id) ON DELETE SET NULL,
    creator_id      TEXT NOT NULL,
    is_published    INTEGER NOT NULL DEFAULT 0,
    is_archived     INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS lessons (
    lesson_id    TEXT PRIMARY KEY,
    course_id    TEXT NOT NULL REFERENCES courses(course_id) ON DELETE CASCADE,
    title        TEXT NOT NULL,
    position     INTEGER NOT NULL DEFAULT 0,
    is_published INTEGER NOT NULL DEFAULT 1,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS course_enrollments (
    course_id    TEXT NOT NULL REFERENCES courses(course_id) ON DELETE CASCADE,
    user_id      TEXT NOT NULL,
    enrolled_at  TEXT NOT NULL,
    completed_at TEXT,
    PRIMARY KEY (course_id, user_id)
);

CREATE TABLE IF NOT EXISTS lesson_progress (
    lesson_id    TEXT NOT NULL REFERENCES lessons(lesson_id) ON DELETE CASCADE,
    user_id      TEXT NOT NULL,
    completed_at TEXT NOT NULL,
    PRIMARY KEY (lesson_id, user_id)
);

CREATE TABLE IF NOT EXISTS events (
    event_id                    TEXT PRIMARY KEY,
    title                       TEXT NOT NULL,
    starts_at                   TEXT NOT NULL,
    ends_at                     TEXT NOT NULL,
    max_attendees               INTEGER,          -- NULL = unlimited
    requires_registration       INTEGER NOT NULL DEFAULT 1,
    registration_deadline_hours INTEGER NOT NULL DEFAULT 0,
    allow_waitlist              INTEGER NOT NULL DEFAULT 0,
    creator_id                  TEXT NOT NULL,
    created_at                  TEXT NOT NULL
);

-- One row per (event, user). The waitlist is served by created_at, then
-- by rowid for registrations made within the same microsecond.
CREATE TABLE IF NOT EXISTS event_registrations (
    event_id   TEXT NOT NULL REFERENCES events(event_id) ON DELETE CASCADE,
    user_id    TEXT NOT NULL,
    status     TEXT NOT NULL CHECK (status IN ('REGISTERED', 'WAITLIST')),
    created_at TEXT NOT NULL,
    PRIMARY KEY (event_id, user_id)
);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL,
    kind            TEXT NOT NULL,
    title           TEXT NOT NULL,
    body            TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    read_at         TEXT
);

CREATE INDEX IF NOT EXISTS lessons_course_idx        ON lessons(course_id);
CREATE INDEX IF NOT EXISTS registrations_status_idx  ON event_registrations(event_id, status);
CREATE INDEX IF NOT EXISTS events_starts_idx         ON events(starts_at);
CREATE INDEX IF NOT EXISTS notifications_user_idx    ON notifications(user_id, created_at);

PRAGMA user_version = 1;
";

//! Database schema and migrations for Cloudstore.
//!
//! Migrations are applied sequentially when the database is first opened or
//! upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
/// Timestamps are fixed-width UTC text (`YYYY-MM-DD HH:MM:SS.ffffff`).
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE,
    password    TEXT NOT NULL,           -- Argon2 PHC string
    created_at  TEXT NOT NULL
);
"#,
    // v2: bearer tokens (soft-deleted via the active flag)
    r#"
CREATE TABLE tokens (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    token       TEXT NOT NULL UNIQUE,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    expires_at  TEXT NOT NULL,
    active      INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL
);

CREATE INDEX idx_tokens_user_id ON tokens(user_id);
"#,
    // v3: file metadata, unique per owner
    r#"
CREATE TABLE files (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    filename      TEXT NOT NULL,
    size          INTEGER NOT NULL,
    content_type  TEXT NOT NULL,
    uploaded_at   TEXT NOT NULL,
    UNIQUE (user_id, filename)
);

CREATE INDEX idx_files_user_uploaded ON files(user_id, uploaded_at DESC, id DESC);
"#,
];

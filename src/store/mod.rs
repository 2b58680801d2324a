//! Relational Store
//! Mission: Own the SQLite schema and the per-request unit of work

pub mod classrooms;
pub mod lessons;
pub mod roles;
pub mod sessions;
pub mod users;

use crate::error::AppError;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, Transaction};
use std::sync::Arc;
use tracing::info;

/// Schema is created idempotently at startup. Link tables carry composite
/// primary keys so repeated enroll/assign inserts stay idempotent.
const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT UNIQUE NOT NULL,
    email TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS roles (
    id TEXT PRIMARY KEY,
    name TEXT UNIQUE NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS user_roles (
    user_id TEXT NOT NULL REFERENCES users(id),
    role_id TEXT NOT NULL REFERENCES roles(id),
    PRIMARY KEY (user_id, role_id)
);

CREATE TABLE IF NOT EXISTS classrooms (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    instructor_id TEXT NOT NULL REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS classroom_students (
    classroom_id TEXT NOT NULL REFERENCES classrooms(id),
    student_id TEXT NOT NULL REFERENCES users(id),
    PRIMARY KEY (classroom_id, student_id)
);

CREATE TABLE IF NOT EXISTS lessons (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    content TEXT,
    classroom_id TEXT NOT NULL REFERENCES classrooms(id)
);

CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    lesson_id TEXT NOT NULL REFERENCES lessons(id),
    start_time TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_classrooms_instructor ON classrooms(instructor_id);
CREATE INDEX IF NOT EXISTS idx_lessons_classroom ON lessons(classroom_id);
CREATE INDEX IF NOT EXISTS idx_sessions_lesson ON sessions(lesson_id);
"#;

/// Shared store handle. One connection guarded by a mutex; each request
/// takes the lock for the duration of its unit of work.
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (or create) the database and apply the schema.
    pub fn new(db_path: &str) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX; // We handle our own locking

        let conn = Connection::open_with_flags(db_path, flags)
            .with_context(|| format!("Failed to open database at {}", db_path))?;

        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to apply schema")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run one request's reads and writes inside a single transaction.
    /// Commits once on success; any error drops the transaction and rolls
    /// back, so a failed check guarantees no write occurred.
    pub fn unit_of_work<T>(
        &self,
        f: impl FnOnce(&Transaction) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    /// Idempotent upsert of the built-in roles, run once at process start.
    pub fn seed_roles(&self) -> Result<()> {
        let conn = self.conn.lock();
        for name in [
            crate::auth::models::ROLE_ADMIN,
            crate::auth::models::ROLE_INSTRUCTOR,
            crate::auth::models::ROLE_STUDENT,
        ] {
            conn.execute(
                "INSERT OR IGNORE INTO roles (id, name, description) VALUES (?1, ?2, NULL)",
                rusqlite::params![uuid::Uuid::new_v4().to_string(), name],
            )
            .with_context(|| format!("Failed to seed role '{}'", name))?;
        }
        info!("Seeded built-in roles");
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::temp_store;
    use super::*;

    #[test]
    fn test_seed_roles_idempotent() {
        let (store, _temp) = temp_store();

        // Second seeding must not duplicate rows
        store.seed_roles().unwrap();

        let count = store
            .unit_of_work(|tx| {
                let n: i64 = tx
                    .query_row("SELECT COUNT(*) FROM roles", [], |row| row.get(0))
                    .unwrap();
                Ok(n)
            })
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_unit_of_work_rolls_back_on_error() {
        let (store, _temp) = temp_store();

        let result: Result<(), AppError> = store.unit_of_work(|tx| {
            tx.execute(
                "INSERT INTO roles (id, name, description) VALUES ('x', 'phantom', NULL)",
                [],
            )?;
            Err(AppError::Forbidden("nope"))
        });
        assert!(result.is_err());

        let count = store
            .unit_of_work(|tx| {
                let n: i64 = tx
                    .query_row(
                        "SELECT COUNT(*) FROM roles WHERE name = 'phantom'",
                        [],
                        |row| row.get(0),
                    )
                    .unwrap();
                Ok(n)
            })
            .unwrap();
        assert_eq!(count, 0);
    }
}

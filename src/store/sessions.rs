//! Session Queries
//! Mission: Session rows and every scoped listing the API serves

use crate::models::Session;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

pub fn create(
    conn: &Connection,
    lesson_id: &Uuid,
    start_time: DateTime<Utc>,
    is_active: bool,
) -> Result<Session> {
    let session = Session {
        id: Uuid::new_v4(),
        lesson_id: *lesson_id,
        start_time,
        is_active,
    };

    conn.execute(
        "INSERT INTO sessions (id, lesson_id, start_time, is_active) VALUES (?1, ?2, ?3, ?4)",
        params![
            session.id.to_string(),
            session.lesson_id.to_string(),
            session.start_time.to_rfc3339(),
            session.is_active,
        ],
    )
    .context("Failed to insert session")?;

    Ok(session)
}

pub fn find(conn: &Connection, id: &Uuid) -> Result<Option<Session>> {
    let result = conn.query_row(
        "SELECT id, lesson_id, start_time, is_active FROM sessions WHERE id = ?1",
        params![id.to_string()],
        map_session_row,
    );

    match result {
        Ok(session) => Ok(Some(session)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_for_lesson(conn: &Connection, lesson_id: &Uuid) -> Result<Vec<Session>> {
    let mut stmt = conn.prepare(
        "SELECT id, lesson_id, start_time, is_active FROM sessions WHERE lesson_id = ?1",
    )?;

    let sessions = stmt
        .query_map(params![lesson_id.to_string()], map_session_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(sessions)
}

pub fn list_all(conn: &Connection) -> Result<Vec<Session>> {
    let mut stmt = conn.prepare("SELECT id, lesson_id, start_time, is_active FROM sessions")?;

    let sessions = stmt
        .query_map([], map_session_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(sessions)
}

/// Sessions of lessons in classrooms the instructor owns.
pub fn list_owned_by(conn: &Connection, instructor_id: &Uuid) -> Result<Vec<Session>> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.lesson_id, s.start_time, s.is_active
         FROM sessions s
         JOIN lessons l ON s.lesson_id = l.id
         JOIN classrooms c ON l.classroom_id = c.id
         WHERE c.instructor_id = ?1",
    )?;

    let sessions = stmt
        .query_map(params![instructor_id.to_string()], map_session_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(sessions)
}

/// Sessions of lessons in classrooms the student is enrolled in.
pub fn list_enrolled(conn: &Connection, student_id: &Uuid) -> Result<Vec<Session>> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.lesson_id, s.start_time, s.is_active
         FROM sessions s
         JOIN lessons l ON s.lesson_id = l.id
         JOIN classroom_students cs ON l.classroom_id = cs.classroom_id
         WHERE cs.student_id = ?1",
    )?;

    let sessions = stmt
        .query_map(params![student_id.to_string()], map_session_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(sessions)
}

/// Overwrite a session's mutable fields. Returns the updated record.
pub fn update(
    conn: &Connection,
    session: &Session,
    start_time: Option<DateTime<Utc>>,
    is_active: Option<bool>,
) -> Result<Session> {
    let updated = Session {
        id: session.id,
        lesson_id: session.lesson_id,
        start_time: start_time.unwrap_or(session.start_time),
        is_active: is_active.unwrap_or(session.is_active),
    };

    conn.execute(
        "UPDATE sessions SET start_time = ?1, is_active = ?2 WHERE id = ?3",
        params![
            updated.start_time.to_rfc3339(),
            updated.is_active,
            updated.id.to_string(),
        ],
    )
    .context("Failed to update session")?;

    Ok(updated)
}

pub fn delete(conn: &Connection, id: &Uuid) -> Result<bool> {
    let rows_affected =
        conn.execute("DELETE FROM sessions WHERE id = ?1", params![id.to_string()])?;
    Ok(rows_affected > 0)
}

fn map_session_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    let start_time: String = row.get(2)?;
    Ok(Session {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
        lesson_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
        start_time: DateTime::parse_from_rfc3339(&start_time)
            .unwrap()
            .with_timezone(&Utc),
        is_active: row.get(3)?,
    })
}

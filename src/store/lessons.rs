//! Lesson Queries
//! Mission: Lesson rows plus the role-scoped bulk lookups

use crate::models::Lesson;
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use uuid::Uuid;

pub fn create(
    conn: &Connection,
    title: &str,
    content: Option<&str>,
    classroom_id: &Uuid,
) -> Result<Lesson> {
    let lesson = Lesson {
        id: Uuid::new_v4(),
        title: title.to_string(),
        content: content.map(|c| c.to_string()),
        classroom_id: *classroom_id,
    };

    conn.execute(
        "INSERT INTO lessons (id, title, content, classroom_id) VALUES (?1, ?2, ?3, ?4)",
        params![
            lesson.id.to_string(),
            lesson.title,
            lesson.content,
            lesson.classroom_id.to_string(),
        ],
    )
    .context("Failed to insert lesson")?;

    Ok(lesson)
}

pub fn find(conn: &Connection, id: &Uuid) -> Result<Option<Lesson>> {
    let result = conn.query_row(
        "SELECT id, title, content, classroom_id FROM lessons WHERE id = ?1",
        params![id.to_string()],
        map_lesson_row,
    );

    match result {
        Ok(lesson) => Ok(Some(lesson)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Lessons in classrooms the instructor owns. The scope is pushed into the
/// query; an instructor with no classrooms gets an empty list, not an error.
pub fn list_owned_by(conn: &Connection, instructor_id: &Uuid) -> Result<Vec<Lesson>> {
    let mut stmt = conn.prepare(
        "SELECT l.id, l.title, l.content, l.classroom_id
         FROM lessons l JOIN classrooms c ON l.classroom_id = c.id
         WHERE c.instructor_id = ?1",
    )?;

    let lessons = stmt
        .query_map(params![instructor_id.to_string()], map_lesson_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(lessons)
}

/// Lessons in classrooms the student is enrolled in.
pub fn list_enrolled(conn: &Connection, student_id: &Uuid) -> Result<Vec<Lesson>> {
    let mut stmt = conn.prepare(
        "SELECT l.id, l.title, l.content, l.classroom_id
         FROM lessons l
         JOIN classroom_students cs ON l.classroom_id = cs.classroom_id
         WHERE cs.student_id = ?1",
    )?;

    let lessons = stmt
        .query_map(params![student_id.to_string()], map_lesson_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(lessons)
}

fn map_lesson_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Lesson> {
    Ok(Lesson {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
        title: row.get(1)?,
        content: row.get(2)?,
        classroom_id: Uuid::parse_str(&row.get::<_, String>(3)?).unwrap(),
    })
}

//! Classroom Queries
//! Mission: Classroom rows, ownership, and the enrollment table

use crate::models::Classroom;
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use uuid::Uuid;

pub fn create(conn: &Connection, name: &str, instructor_id: &Uuid) -> Result<Classroom> {
    let classroom = Classroom {
        id: Uuid::new_v4(),
        name: name.to_string(),
        instructor_id: *instructor_id,
    };

    conn.execute(
        "INSERT INTO classrooms (id, name, instructor_id) VALUES (?1, ?2, ?3)",
        params![
            classroom.id.to_string(),
            classroom.name,
            classroom.instructor_id.to_string(),
        ],
    )
    .context("Failed to insert classroom")?;

    Ok(classroom)
}

pub fn find(conn: &Connection, id: &Uuid) -> Result<Option<Classroom>> {
    let result = conn.query_row(
        "SELECT id, name, instructor_id FROM classrooms WHERE id = ?1",
        params![id.to_string()],
        map_classroom_row,
    );

    match result {
        Ok(classroom) => Ok(Some(classroom)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Enroll a student. Already-enrolled students are a no-op.
pub fn enroll(conn: &Connection, classroom_id: &Uuid, student_id: &Uuid) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO classroom_students (classroom_id, student_id) VALUES (?1, ?2)",
        params![classroom_id.to_string(), student_id.to_string()],
    )
    .context("Failed to enroll student")?;
    Ok(())
}

/// Enrollment membership check, the student side of the ownership policy.
pub fn is_enrolled(conn: &Connection, classroom_id: &Uuid, student_id: &Uuid) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM classroom_students WHERE classroom_id = ?1 AND student_id = ?2",
        params![classroom_id.to_string(), student_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn map_classroom_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Classroom> {
    Ok(Classroom {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
        name: row.get(1)?,
        instructor_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap(),
    })
}

//! Domain Models
//! Mission: Classroom, lesson, and session records and their wire schemas

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A classroom owned by exactly one instructor. Enrolled students live in
/// a link table and are resolved by the store, not embedded here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classroom {
    pub id: Uuid,
    pub name: String,
    pub instructor_id: Uuid,
}

/// A lesson inside one classroom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub classroom_id: Uuid,
}

/// A run of a lesson. Started either by an instructor (scheduled) or by an
/// enrolled student (self-started, stamped now/active).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub is_active: bool,
}

// ===== Request Types =====

#[derive(Debug, Deserialize)]
pub struct ClassroomCreate {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LessonCreate {
    pub title: String,
    pub content: Option<String>,
    pub classroom_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SessionCreate {
    pub lesson_id: Uuid,
    /// Defaults to now when omitted
    pub start_time: Option<DateTime<Utc>>,
    /// Defaults to active when omitted
    pub is_active: Option<bool>,
}

/// Update body for an existing session
#[derive(Debug, Deserialize)]
pub struct SessionUpdate {
    pub start_time: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

//! Access Policy
//! Mission: One declarative table of who may do what, evaluated by one guard
//!
//! Every operation declares a row: the role set allowed to attempt it and
//! the ownership relationship the caller must hold to the target classroom.
//! Handlers resolve the target, then call [`authorize`] before any write.
//! Role names compare exactly (case-sensitive) everywhere.

use crate::auth::models::{User, ROLE_ADMIN, ROLE_INSTRUCTOR, ROLE_STUDENT};
use crate::error::AppError;
use crate::models::Classroom;
use crate::store::classrooms;
use rusqlite::Connection;

/// Relationship the caller must hold to the target classroom, on top of
/// the role requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipRule {
    /// Role membership alone is enough
    None,
    /// Caller must be the classroom's owning instructor
    ClassroomOwner,
    /// Caller must be enrolled in the classroom
    ClassroomEnrolled,
}

/// One row of the policy table.
#[derive(Debug)]
pub struct OperationPolicy {
    pub name: &'static str,
    pub allowed_roles: &'static [&'static str],
    pub ownership: OwnershipRule,
}

const fn policy(
    name: &'static str,
    allowed_roles: &'static [&'static str],
    ownership: OwnershipRule,
) -> OperationPolicy {
    OperationPolicy {
        name,
        allowed_roles,
        ownership,
    }
}

// The table. Mutating operations re-evaluate their row on every call;
// nothing here is cached across requests.
pub const CREATE_CLASSROOM: OperationPolicy =
    policy("create_classroom", &[ROLE_INSTRUCTOR], OwnershipRule::None);
pub const JOIN_CLASSROOM: OperationPolicy =
    policy("join_classroom", &[ROLE_STUDENT], OwnershipRule::None);
pub const ASSIGN_STUDENT: OperationPolicy = policy(
    "assign_student",
    &[ROLE_INSTRUCTOR],
    OwnershipRule::ClassroomOwner,
);
pub const CREATE_LESSON: OperationPolicy = policy(
    "create_lesson",
    &[ROLE_INSTRUCTOR],
    OwnershipRule::ClassroomOwner,
);
pub const CREATE_SESSION: OperationPolicy = policy(
    "create_session",
    &[ROLE_INSTRUCTOR],
    OwnershipRule::ClassroomOwner,
);
pub const START_SESSION: OperationPolicy = policy(
    "start_session",
    &[ROLE_STUDENT],
    OwnershipRule::ClassroomEnrolled,
);
pub const LIST_LESSON_SESSIONS: OperationPolicy = policy(
    "list_lesson_sessions",
    &[ROLE_INSTRUCTOR],
    OwnershipRule::ClassroomOwner,
);
pub const LIST_ALL_SESSIONS: OperationPolicy =
    policy("list_all_sessions", &[ROLE_ADMIN], OwnershipRule::None);
pub const UPDATE_SESSION: OperationPolicy = policy(
    "update_session",
    &[ROLE_INSTRUCTOR],
    OwnershipRule::ClassroomOwner,
);
pub const DELETE_SESSION: OperationPolicy = policy(
    "delete_session",
    &[ROLE_INSTRUCTOR],
    OwnershipRule::ClassroomOwner,
);
pub const CREATE_ROLE: OperationPolicy =
    policy("create_role", &[ROLE_ADMIN], OwnershipRule::None);
pub const ASSIGN_ROLE: OperationPolicy =
    policy("assign_role", &[ROLE_ADMIN], OwnershipRule::None);
pub const ASK_TUTOR: OperationPolicy = policy(
    "ask_tutor",
    &[ROLE_STUDENT, ROLE_INSTRUCTOR],
    OwnershipRule::None,
);

/// The role half of the guard: succeeds iff the caller's role set
/// intersects the operation's allowed set. Handlers whose ownership rule
/// needs a resolved resource call this first, so a caller without the role
/// is refused before any lookup happens.
pub fn require_roles(op: &OperationPolicy, user: &User) -> Result<(), AppError> {
    if !op.allowed_roles.iter().any(|role| user.has_role(role)) {
        tracing::warn!(
            "Denied {} for {}: lacks any of {:?}",
            op.name,
            user.username,
            op.allowed_roles
        );
        return Err(AppError::Forbidden("Insufficient permissions"));
    }
    Ok(())
}

/// The generic guard. Succeeds iff the caller's role set intersects the
/// operation's allowed set AND the ownership rule holds against the target
/// classroom. Operations with an ownership rule must pass their classroom.
pub fn authorize(
    op: &OperationPolicy,
    conn: &Connection,
    user: &User,
    classroom: Option<&Classroom>,
) -> Result<(), AppError> {
    require_roles(op, user)?;

    match op.ownership {
        OwnershipRule::None => Ok(()),
        OwnershipRule::ClassroomOwner => {
            let classroom = classroom.ok_or(AppError::Forbidden("Insufficient permissions"))?;
            if classroom_owned_by(classroom, user) {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "You are not the instructor of this classroom",
                ))
            }
        }
        OwnershipRule::ClassroomEnrolled => {
            let classroom = classroom.ok_or(AppError::Forbidden("Insufficient permissions"))?;
            if classrooms::is_enrolled(conn, &classroom.id, &user.id)? {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "You are not enrolled in this classroom",
                ))
            }
        }
    }
}

/// Ownership predicate: id equality with the classroom's instructor.
pub fn classroom_owned_by(classroom: &Classroom, user: &User) -> bool {
    classroom.instructor_id == user.id
}

/// Read access to a single lesson, resolved by the caller's first matching
/// role in the configured precedence order. Exactly one branch is taken:
/// admin reads anything, an instructor reads lessons of classrooms they
/// own, a student reads lessons of classrooms they are enrolled in.
pub fn lesson_read_access(
    precedence: &[String],
    conn: &Connection,
    user: &User,
    classroom: &Classroom,
) -> Result<(), AppError> {
    for role in precedence {
        if !user.has_role(role) {
            continue;
        }
        return match role.as_str() {
            ROLE_ADMIN => Ok(()),
            ROLE_INSTRUCTOR => {
                if classroom_owned_by(classroom, user) {
                    Ok(())
                } else {
                    Err(AppError::Forbidden("Not your lesson"))
                }
            }
            ROLE_STUDENT => {
                if classrooms::is_enrolled(conn, &classroom.id, &user.id)? {
                    Ok(())
                } else {
                    Err(AppError::Forbidden(
                        "You are not enrolled in this classroom",
                    ))
                }
            }
            // Roles outside the built-in three carry no read rule
            _ => continue,
        };
    }

    Err(AppError::Forbidden("Insufficient permissions"))
}

/// Scope for bulk listings: the filter is pushed into the lookup, never
/// applied per row. Instructors list what they own, everyone else what
/// they are enrolled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    OwnedClassrooms,
    EnrolledClassrooms,
}

pub fn list_scope(user: &User) -> ListScope {
    if user.has_role(ROLE_INSTRUCTOR) {
        ListScope::OwnedClassrooms
    } else {
        ListScope::EnrolledClassrooms
    }
}

//! User Queries
//! Mission: Persist accounts and resolve them with their role sets loaded

use crate::auth::models::{Role, User};
use anyhow::{Context, Result};
use bcrypt::{hash, DEFAULT_COST};
use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

/// Insert a new user with a bcrypt-hashed password. Role assignment is a
/// separate step; the returned record has an empty role set.
pub fn create(conn: &Connection, username: &str, email: &str, password: &str) -> Result<User> {
    let password_hash = hash(password, DEFAULT_COST).context("Failed to hash password")?;

    let user = User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: email.to_string(),
        password_hash,
        roles: Vec::new(),
        created_at: Utc::now().to_rfc3339(),
    };

    conn.execute(
        "INSERT INTO users (id, username, email, password_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.id.to_string(),
            user.username,
            user.email,
            user.password_hash,
            user.created_at,
        ],
    )
    .context("Failed to insert user")?;

    Ok(user)
}

/// Look up a user by username, role memberships eagerly loaded.
pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, email, password_hash, created_at
         FROM users WHERE username = ?1",
    )?;

    let user_result = stmt.query_row(params![username], map_user_row);

    match user_result {
        Ok(mut user) => {
            user.roles = load_roles(conn, &user.id)?;
            Ok(Some(user))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Look up a user by id, role memberships eagerly loaded.
pub fn find_by_id(conn: &Connection, id: &Uuid) -> Result<Option<User>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, email, password_hash, created_at
         FROM users WHERE id = ?1",
    )?;

    let user_result = stmt.query_row(params![id.to_string()], map_user_row);

    match user_result {
        Ok(mut user) => {
            user.roles = load_roles(conn, &user.id)?;
            Ok(Some(user))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Whether any user row exists with this email.
pub fn email_taken(conn: &Connection, email: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE email = ?1",
        params![email],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// List all users with their role sets.
pub fn list(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt =
        conn.prepare("SELECT id, username, email, password_hash, created_at FROM users")?;

    let mut users = stmt
        .query_map([], map_user_row)?
        .collect::<Result<Vec<_>, _>>()?;

    for user in &mut users {
        user.roles = load_roles(conn, &user.id)?;
    }

    Ok(users)
}

/// Delete a user and its role/enrollment memberships. Classrooms the user
/// owns are left in place. Returns false when no such user exists.
pub fn delete(conn: &Connection, id: &Uuid) -> Result<bool> {
    let id_str = id.to_string();
    conn.execute(
        "DELETE FROM user_roles WHERE user_id = ?1",
        params![id_str],
    )?;
    conn.execute(
        "DELETE FROM classroom_students WHERE student_id = ?1",
        params![id_str],
    )?;
    let rows_affected = conn.execute("DELETE FROM users WHERE id = ?1", params![id_str])?;
    Ok(rows_affected > 0)
}

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        roles: Vec::new(),
        created_at: row.get(4)?,
    })
}

fn load_roles(conn: &Connection, user_id: &Uuid) -> Result<Vec<Role>> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.name, r.description
         FROM roles r JOIN user_roles ur ON ur.role_id = r.id
         WHERE ur.user_id = ?1",
    )?;

    let roles = stmt
        .query_map(params![user_id.to_string()], |row| {
            Ok(Role {
                id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                name: row.get(1)?,
                description: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(roles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::temp_store;
    use crate::store::roles;

    #[test]
    fn test_create_and_retrieve_user() {
        let (store, _temp) = temp_store();

        store
            .unit_of_work(|tx| {
                let created = create(tx, "alice", "alice@example.com", "password123")?;
                assert!(created.roles.is_empty());

                let found = find_by_username(tx, "alice")?.expect("user should exist");
                assert_eq!(found.id, created.id);
                assert_eq!(found.email, "alice@example.com");
                assert_ne!(found.password_hash, "password123"); // hashed
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_duplicate_username_rejected_by_schema() {
        let (store, _temp) = temp_store();

        let result = store.unit_of_work(|tx| {
            create(tx, "alice", "a1@example.com", "pw")?;
            create(tx, "alice", "a2@example.com", "pw")?;
            Ok(())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_roles_loaded_with_user() {
        let (store, _temp) = temp_store();

        store
            .unit_of_work(|tx| {
                let user = create(tx, "bob", "bob@example.com", "pw")?;
                let student = roles::find_by_name(tx, "student")?.unwrap();
                roles::assign_to_user(tx, &user.id, &student.id)?;

                let found = find_by_username(tx, "bob")?.unwrap();
                assert_eq!(found.roles.len(), 1);
                assert_eq!(found.roles[0].name, "student");
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_delete_user_clears_memberships() {
        let (store, _temp) = temp_store();

        store
            .unit_of_work(|tx| {
                let user = create(tx, "carol", "carol@example.com", "pw")?;
                let student = roles::find_by_name(tx, "student")?.unwrap();
                roles::assign_to_user(tx, &user.id, &student.id)?;

                assert!(delete(tx, &user.id)?);
                assert!(find_by_id(tx, &user.id)?.is_none());

                // Deleting again reports nothing removed
                assert!(!delete(tx, &user.id)?);
                Ok(())
            })
            .unwrap();
    }
}

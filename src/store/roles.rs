//! Role Queries
//! Mission: Role rows and the user/role membership table

use crate::auth::models::Role;
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use uuid::Uuid;

/// Insert a new named role.
pub fn create(conn: &Connection, name: &str, description: Option<&str>) -> Result<Role> {
    let role = Role {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: description.map(|d| d.to_string()),
    };

    conn.execute(
        "INSERT INTO roles (id, name, description) VALUES (?1, ?2, ?3)",
        params![role.id.to_string(), role.name, role.description],
    )
    .context("Failed to insert role")?;

    Ok(role)
}

pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Role>> {
    let result = conn.query_row(
        "SELECT id, name, description FROM roles WHERE name = ?1",
        params![name],
        map_role_row,
    );

    match result {
        Ok(role) => Ok(Some(role)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn find_by_id(conn: &Connection, id: &Uuid) -> Result<Option<Role>> {
    let result = conn.query_row(
        "SELECT id, name, description FROM roles WHERE id = ?1",
        params![id.to_string()],
        map_role_row,
    );

    match result {
        Ok(role) => Ok(Some(role)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list(conn: &Connection) -> Result<Vec<Role>> {
    let mut stmt = conn.prepare("SELECT id, name, description FROM roles ORDER BY name")?;
    let roles = stmt
        .query_map([], map_role_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(roles)
}

/// Grant a role to a user. Granting an already-held role is a no-op.
pub fn assign_to_user(conn: &Connection, user_id: &Uuid, role_id: &Uuid) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?1, ?2)",
        params![user_id.to_string(), role_id.to_string()],
    )
    .context("Failed to assign role")?;
    Ok(())
}

fn map_role_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Role> {
    Ok(Role {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
        name: row.get(1)?,
        description: row.get(2)?,
    })
}

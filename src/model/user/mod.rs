
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    model::{fetch, fetch_optional, Executor, Statement},
};

const FIND_BY_ID_SQL: &str = r#"
    SELECT id, bio, username, created_at
    FROM users
    WHERE id = $1
"#;

const INSERT_SQL: &str = r#"
    INSERT INTO users (id, username, bio, created_at, updated_at)
    VALUES ($1, $2, $3, NOW(), NOW())
    RETURNING *
"#;

const UPDATE_USERNAME_SQL: &str = r#"
    UPDATE users
    SET username = $2, updated_at = NOW()
    WHERE id = $1
    RETURNING *
"#;

const DELETE_SQL: &str = r#"
    DELETE FROM users
    WHERE id = $1
    RETURNING *
"#;

/// Public profile of a human user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub bio: Option<String>,
    pub username: String,
    #[serde(deserialize_with = "crate::util::datetime")]
    pub created_at: DateTime<Utc>,
}

/// Full `users` row, as returned by mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub bio: Option<String>,
    #[serde(deserialize_with = "crate::util::datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "crate::util::datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Result of [`upsert_username`].
#[derive(Debug, Clone, PartialEq)]
pub enum Upserted {
    Updated(User),
    Created(User),
}

pub fn find_by_id_statement(user_id: &str) -> Statement {
    Statement::new(FIND_BY_ID_SQL, vec![user_id.into()])
}

pub fn insert_statement(id: &str, username: &str) -> Statement {
    Statement::new(INSERT_SQL, vec![id.into(), username.into(), "".into()])
}

pub fn update_username_statement(id: &str, username: &str) -> Statement {
    Statement::new(UPDATE_USERNAME_SQL, vec![id.into(), username.into()])
}

pub fn delete_statement(id: &str) -> Statement {
    Statement::new(DELETE_SQL, vec![id.into()])
}

pub fn find_by_id(executor: &dyn Executor, user_id: &str) -> Result<Option<UserProfile>, Error> {
    fetch_optional(executor, &find_by_id_statement(user_id))
}

/// Insert a user with an empty bio.
pub fn create(executor: &dyn Executor, id: &str, username: &str) -> Result<User, Error> {
    fetch_optional(executor, &insert_statement(id, username))?.ok_or_else(|| {
        Error::DatabaseError(diesel::result::Error::NotFound)
    })
}

/// Rename the user, or create it when the UPDATE touched no row.
/// The two statements are not in one transaction.
pub fn upsert_username(
    executor: &dyn Executor,
    id: &str,
    username: &str,
) -> Result<Upserted, Error> {
    let updated: Vec<User> = fetch(executor, &update_username_statement(id, username))?;
    if let Some(user) = updated.into_iter().next() {
        return Ok(Upserted::Updated(user));
    }

    info!("User {} not found, creating new user entry", id);
    create(executor, id, username).map(Upserted::Created)
}

/// Returns the deleted row, `None` when no such user.
pub fn delete(executor: &dyn Executor, id: &str) -> Result<Option<User>, Error> {
    fetch_optional(executor, &delete_statement(id))
}

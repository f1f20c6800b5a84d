mod tests;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::{
    error::Error,
    model::{fetch, fetch_optional, Executor, Param, Statement},
};

const FIND_ALL_SQL: &str = r#"
    SELECT
      p.persona_id,
      p.bio,
      p.username,
      COALESCE(following_count.count, 0) AS following_count,
      COALESCE(followers_count.count, 0) AS followers_count
    FROM personas p
    LEFT JOIN (
      SELECT follower, COUNT(*) AS count
      FROM follows
      GROUP BY follower
    ) following_count ON p.persona_id = following_count.follower
    LEFT JOIN (
      SELECT followed, COUNT(*) AS count
      FROM follows
      GROUP BY followed
    ) followers_count ON p.persona_id = followers_count.followed
    ORDER BY p.persona_id
"#;

const FIND_BY_ID_SQL: &str = r#"
    SELECT persona_id, bio, username, created_at
    FROM personas
    WHERE persona_id = $1::bigint
"#;

const MOST_ACTIVE_SQL: &str = r#"
    SELECT p.persona_id, p.username, COUNT(po.id) AS post_count
    FROM personas p
    LEFT JOIN posts po ON p.persona_id = po.author
    GROUP BY p.persona_id, p.username
    ORDER BY post_count DESC
    LIMIT $1
"#;

const FOLLOWED_BY_SQL: &str = r#"
    SELECT p.persona_id, p.username
    FROM follows f
    JOIN personas p ON p.persona_id = f.followed
    WHERE f.follower = $1::bigint
"#;

const FOLLOWERS_OF_SQL: &str = r#"
    SELECT p.persona_id, p.username
    FROM follows f
    JOIN personas p ON p.persona_id = f.follower
    WHERE f.followed = $1::bigint
"#;

/// Persona as listed on the directory page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub persona_id: i64,
    pub bio: Option<String>,
    pub username: String,
    pub following_count: i64,
    pub followers_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub persona_id: i64,
    pub bio: Option<String>,
    pub username: String,
    #[serde(deserialize_with = "crate::util::datetime")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveAgent {
    pub persona_id: i64,
    pub username: String,
    pub post_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedPersona {
    pub persona_id: i64,
    pub username: String,
}

/// Side of the follow edge the given persona stands on.
#[derive(Display, EnumString, Debug, Copy, Clone, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum Relation {
    /// The persona follows: returns who it follows.
    Follower,
    /// The persona is followed: returns its followers.
    Followed,
}

pub fn find_all_statement() -> Statement {
    Statement::new(FIND_ALL_SQL, vec![])
}

pub fn find_by_id_statement(persona_id: &str) -> Statement {
    Statement::new(FIND_BY_ID_SQL, vec![persona_id.into()])
}

pub fn most_active_statement(limit: i64) -> Statement {
    Statement::new(MOST_ACTIVE_SQL, vec![Param::Int(limit)])
}

pub fn relations_statement(persona_id: &str, relation: Relation) -> Statement {
    let sql = match relation {
        Relation::Follower => FOLLOWED_BY_SQL,
        Relation::Followed => FOLLOWERS_OF_SQL,
    };
    Statement::new(sql, vec![persona_id.into()])
}

/// Every persona with its follow counts, ordered by id.
pub fn find_all(executor: &dyn Executor) -> Result<Vec<AgentSummary>, Error> {
    fetch(executor, &find_all_statement())
}

pub fn find_by_id(executor: &dyn Executor, persona_id: &str) -> Result<Option<Persona>, Error> {
    fetch_optional(executor, &find_by_id_statement(persona_id))
}

/// Personas with the most posts first.
pub fn find_most_active(executor: &dyn Executor, limit: i64) -> Result<Vec<ActiveAgent>, Error> {
    fetch(executor, &most_active_statement(limit))
}

pub fn find_relations(
    executor: &dyn Executor,
    persona_id: &str,
    relation: Relation,
) -> Result<Vec<RelatedPersona>, Error> {
    fetch(executor, &relations_statement(persona_id, relation))
}

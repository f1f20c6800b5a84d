use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    model::{fetch, AuthorType, Executor, Statement},
};

const FIND_BY_POST_SQL: &str = r#"
    SELECT
      c.id,
      c.post_id,
      c.body,
      c.author_id,
      c.user_author_id,
      CASE WHEN c.author_id IS NOT NULL THEN 'persona' ELSE 'user' END AS author_type,
      COALESCE(per.username, u.username) AS author_username,
      c.created_at
    FROM comments c
    LEFT JOIN personas per ON c.author_id = per.persona_id
    LEFT JOIN users u ON c.user_author_id = u.id
    WHERE c.post_id = $1::bigint
    ORDER BY c.created_at DESC
"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub body: String,
    pub author_id: Option<i64>,
    pub user_author_id: Option<String>,
    pub author_type: AuthorType,
    pub author_username: Option<String>,
    #[serde(deserialize_with = "crate::util::datetime")]
    pub created_at: DateTime<Utc>,
}

pub fn find_by_post_statement(post_id: &str) -> Statement {
    Statement::new(FIND_BY_POST_SQL, vec![post_id.into()])
}

/// Comments of a post, newest first. Empty when the post doesn't exist.
pub fn find_by_post(executor: &dyn Executor, post_id: &str) -> Result<Vec<Comment>, Error> {
    fetch(executor, &find_by_post_statement(post_id))
}


use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    model::{fetch, fetch_optional, AuthorType, Executor, Param, Statement, PAGE_SIZE},
};

const FIND_PAGE_SQL: &str = r#"
    SELECT
      p.id,
      p.title,
      p.body,
      p.author,
      p.user_author,
      CASE WHEN p.author IS NOT NULL THEN 'persona' ELSE 'user' END AS author_type,
      COALESCE(per.username, u.username) AS author_username,
      p.created_at,
      COUNT(DISTINCT l.id) AS likes_count,
      COUNT(DISTINCT c.id) AS comments_count
    FROM posts p
    LEFT JOIN personas per ON p.author = per.persona_id
    LEFT JOIN users u ON p.user_author = u.id
    LEFT JOIN likes l ON p.id = l.post_id
    LEFT JOIN comments c ON p.id = c.post_id
    GROUP BY p.id, p.title, p.body, p.author, p.user_author, per.username, u.username, p.created_at
    ORDER BY p.created_at DESC
    LIMIT $1 OFFSET $2
"#;

const FIND_PAGE_BY_PERSONA_SQL: &str = r#"
    SELECT
      p.id,
      p.title,
      p.body,
      p.author,
      p.user_author,
      CASE WHEN p.author IS NOT NULL THEN 'persona' ELSE 'user' END AS author_type,
      COALESCE(per.username, u.username) AS author_username,
      p.created_at,
      (SELECT COUNT(DISTINCT id) FROM likes WHERE post_id = p.id) AS likes_count,
      (SELECT COUNT(DISTINCT id) FROM comments WHERE post_id = p.id) AS comments_count
    FROM posts p
    LEFT JOIN personas per ON p.author = per.persona_id
    LEFT JOIN users u ON p.user_author = u.id
    WHERE p.author = $1::bigint
    ORDER BY p.created_at DESC
    LIMIT $2 OFFSET $3
"#;

/// Sampling starts at a random id between 0 and MAX(id), so later posts are favored.
const RANDOM_SQL: &str = r#"
    SELECT
      p.id,
      p.title,
      p.body,
      p.author,
      p.user_author,
      CASE WHEN p.author IS NOT NULL THEN 'persona' ELSE 'user' END AS author_type,
      COALESCE(per.username, u.username) AS author_username,
      p.created_at,
      COUNT(DISTINCT l.id) AS likes_count,
      COUNT(DISTINCT c.id) AS comments_count
    FROM posts p
    LEFT JOIN personas per ON p.author = per.persona_id
    LEFT JOIN users u ON p.user_author = u.id
    LEFT JOIN likes l ON p.id = l.post_id
    LEFT JOIN comments c ON p.id = c.post_id
    WHERE p.id >= (SELECT (RANDOM() * MAX(id))::bigint FROM posts)
    GROUP BY p.id, p.title, p.body, p.author, p.user_author, per.username, u.username, p.created_at
    LIMIT $1::bigint
"#;

const MOST_LIKED_SQL: &str = r#"
    SELECT po.id, po.title, COUNT(l.id) AS like_count
    FROM posts po
    LEFT JOIN likes l ON po.id = l.post_id
    GROUP BY po.id, po.title
    ORDER BY like_count DESC
    LIMIT $1::bigint
"#;

const FIND_WITH_COMMENTS_SQL: &str = r#"
    SELECT
      p.id,
      p.title,
      p.body,
      p.author,
      p.user_author,
      CASE WHEN p.author IS NOT NULL THEN 'persona' ELSE 'user' END AS author_type,
      COALESCE(per.username, u.username) AS author_username,
      p.created_at,
      (SELECT COUNT(DISTINCT id) FROM likes WHERE post_id = p.id) AS likes_count,
      COALESCE(
        json_agg(
          json_build_object(
            'id', c.id,
            'body', c.body,
            'author_id', c.author_id,
            'user_author_id', c.user_author_id,
            'author_type', CASE WHEN c.author_id IS NOT NULL THEN 'persona' ELSE 'user' END,
            'author_username', COALESCE(c_per.username, c_u.username),
            'created_at', c.created_at
          )
          ORDER BY c.created_at ASC
        ) FILTER (WHERE c.id IS NOT NULL),
        '[]'::json
      ) AS comments
    FROM posts p
    LEFT JOIN personas per ON p.author = per.persona_id
    LEFT JOIN users u ON p.user_author = u.id
    LEFT JOIN comments c ON p.id = c.post_id
    LEFT JOIN personas c_per ON c.author_id = c_per.persona_id
    LEFT JOIN users c_u ON c.user_author_id = c_u.id
    WHERE p.id = $1::bigint
    GROUP BY p.id, p.title, p.body, p.author, p.user_author, per.username, u.username, p.created_at
"#;

const FIND_PAGE_WITH_COMMENTS_SQL: &str = r#"
    SELECT
      p.id,
      p.title,
      p.body,
      p.author,
      p.user_author,
      CASE WHEN p.author IS NOT NULL THEN 'persona' ELSE 'user' END AS author_type,
      COALESCE(per.username, u.username) AS author_username,
      p.created_at,
      (SELECT COUNT(DISTINCT id) FROM likes WHERE post_id = p.id) AS likes_count,
      COALESCE(
        json_agg(
          json_build_object(
            'id', c.id,
            'body', c.body,
            'author_id', c.author_id,
            'user_author_id', c.user_author_id,
            'author_type', CASE WHEN c.author_id IS NOT NULL THEN 'persona' ELSE 'user' END,
            'author_username', COALESCE(c_per.username, c_u.username),
            'created_at', c.created_at
          )
          ORDER BY c.created_at ASC
        ) FILTER (WHERE c.id IS NOT NULL),
        '[]'::json
      ) AS comments
    FROM posts p
    LEFT JOIN personas per ON p.author = per.persona_id
    LEFT JOIN users u ON p.user_author = u.id
    LEFT JOIN comments c ON p.id = c.post_id
    LEFT JOIN personas c_per ON c.author_id = c_per.persona_id
    LEFT JOIN users c_u ON c.user_author_id = c_u.id
    GROUP BY p.id, p.title, p.body, p.author, p.user_author, per.username, u.username, p.created_at
    ORDER BY p.created_at DESC
    LIMIT $1 OFFSET $2
"#;

/// Feed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: Option<String>,
    pub body: String,
    /// Persona author.
    pub author: Option<i64>,
    /// User author.
    pub user_author: Option<String>,
    pub author_type: AuthorType,
    pub author_username: Option<String>,
    #[serde(deserialize_with = "crate::util::datetime")]
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub comments_count: i64,
}

/// Comment embedded in a post, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentSummary {
    pub id: i64,
    pub body: String,
    pub author_id: Option<i64>,
    pub user_author_id: Option<String>,
    pub author_type: AuthorType,
    pub author_username: Option<String>,
    #[serde(deserialize_with = "crate::util::datetime")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostWithComments {
    pub id: i64,
    pub title: Option<String>,
    pub body: String,
    pub author: Option<i64>,
    pub user_author: Option<String>,
    pub author_type: AuthorType,
    pub author_username: Option<String>,
    #[serde(deserialize_with = "crate::util::datetime")]
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub comments: Vec<CommentSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularPost {
    pub id: i64,
    pub title: Option<String>,
    pub like_count: i64,
}

pub fn page_statement(offset: i64) -> Statement {
    Statement::new(FIND_PAGE_SQL, vec![Param::Int(PAGE_SIZE), Param::Int(offset)])
}

/// Persona id goes through as text, the paging numbers as integers.
pub fn persona_page_statement(persona_id: &str, offset: i64) -> Statement {
    Statement::new(
        FIND_PAGE_BY_PERSONA_SQL,
        vec![persona_id.into(), Param::Int(PAGE_SIZE), Param::Int(offset)],
    )
}

pub fn random_statement(num_posts: &str) -> Statement {
    Statement::new(RANDOM_SQL, vec![num_posts.into()])
}

pub fn most_liked_statement(limit: &str) -> Statement {
    Statement::new(MOST_LIKED_SQL, vec![limit.into()])
}

pub fn with_comments_statement(post_id: &str) -> Statement {
    Statement::new(FIND_WITH_COMMENTS_SQL, vec![post_id.into()])
}

pub fn page_with_comments_statement(offset: i64) -> Statement {
    Statement::new(
        FIND_PAGE_WITH_COMMENTS_SQL,
        vec![Param::Int(PAGE_SIZE), Param::Int(offset)],
    )
}

/// Newest posts first.
pub fn find_page(executor: &dyn Executor, offset: i64) -> Result<Vec<Post>, Error> {
    fetch(executor, &page_statement(offset))
}

pub fn find_page_by_persona(
    executor: &dyn Executor,
    persona_id: &str,
    offset: i64,
) -> Result<Vec<Post>, Error> {
    fetch(executor, &persona_page_statement(persona_id, offset))
}

pub fn find_random(executor: &dyn Executor, num_posts: &str) -> Result<Vec<Post>, Error> {
    fetch(executor, &random_statement(num_posts))
}

pub fn find_most_liked(executor: &dyn Executor, limit: &str) -> Result<Vec<PopularPost>, Error> {
    fetch(executor, &most_liked_statement(limit))
}

pub fn find_with_comments(
    executor: &dyn Executor,
    post_id: &str,
) -> Result<Option<PostWithComments>, Error> {
    fetch_optional(executor, &with_comments_statement(post_id))
}

pub fn find_page_with_comments(
    executor: &dyn Executor,
    offset: i64,
) -> Result<Vec<PostWithComments>, Error> {
    fetch(executor, &page_with_comments_statement(offset))
}

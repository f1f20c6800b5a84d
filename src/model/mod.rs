use serde::{de::DeserializeOwned, Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::Error;

pub mod comment;
pub mod persona;
pub mod post;
mod postgres;
pub mod user;

#[cfg(test)]
pub mod mock;

pub use postgres::PgExecutor;

/// Listing endpoints return pages of this size.
pub const PAGE_SIZE: i64 = 20;

/// Positional parameter (`$n`) of a statement.
/// Text parameters stay text on the wire; SQL casts them where needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Text(String),
    Int(i64),
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(value.to_string())
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Int(value)
    }
}

/// A fixed SQL template and its ordered parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: &'static str,
    pub params: Vec<Param>,
}

impl Statement {
    pub fn new(sql: &'static str, params: Vec<Param>) -> Self {
        Self { sql, params }
    }
}

/// Runs one statement and returns its rows as JSON objects.
/// Never retries.
pub trait Executor: Send + Sync {
    fn query(&self, statement: &Statement) -> Result<Vec<serde_json::Value>, Error>;
}

/// Run `statement` and decode every row.
pub fn fetch<T>(executor: &dyn Executor, statement: &Statement) -> Result<Vec<T>, Error>
where
    T: DeserializeOwned,
{
    executor
        .query(statement)?
        .into_iter()
        .map(|row| serde_json::from_value(row).map_err(|e| e.into()))
        .collect()
}

/// Run `statement` and decode the first row, if any.
pub fn fetch_optional<T>(executor: &dyn Executor, statement: &Statement) -> Result<Option<T>, Error>
where
    T: DeserializeOwned,
{
    Ok(fetch(executor, statement)?.into_iter().next())
}

/// `OFFSET` of a 1-based page. `None` on overflow.
pub fn page_offset(page: i64) -> Option<i64> {
    page.checked_sub(1)?.checked_mul(PAGE_SIZE)
}

/// Who wrote a post or comment.
/// Exactly one of the persona / user author columns is set; this tells which.
#[derive(Display, EnumString, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AuthorType {
    Persona,
    User,
}

use std::time::Duration;

use diesel::{
    pg::Pg,
    prelude::*,
    r2d2::{ConnectionManager, Pool},
    sql_types::{BigInt, Jsonb, Text},
};
use log::debug;

use crate::{
    error::Error,
    model::{Executor, Param, Statement},
};

/// One invocation at a time per instance: a couple of connections is plenty.
const POOL_SIZE: u32 = 2;
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(2);
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

#[derive(QueryableByName)]
struct JsonRow {
    #[diesel(sql_type = Jsonb)]
    payload: serde_json::Value,
}

/// `Executor` backed by an r2d2 pool of Postgres connections.
#[derive(Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    /// No connection is opened until the first query.
    pub fn new(database_url: &str) -> Self {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(POOL_SIZE)
            .min_idle(Some(0))
            .connection_timeout(CONNECTION_TIMEOUT)
            .idle_timeout(Some(IDLE_TIMEOUT))
            .build_unchecked(manager);

        Self { pool }
    }
}

/// Both plain SELECTs and `... RETURNING *` mutations come back as one JSONB per row.
fn wrap(sql: &str) -> String {
    format!(
        "WITH q AS ({}) SELECT to_jsonb(q) AS payload FROM q",
        sql.trim().trim_end_matches(';')
    )
}

impl Executor for PgExecutor {
    fn query(&self, statement: &Statement) -> Result<Vec<serde_json::Value>, Error> {
        let mut conn = self.pool.get()?;
        debug!("SQL: {} -- {:?}", statement.sql.trim(), statement.params);

        let mut query = diesel::sql_query(wrap(statement.sql)).into_boxed::<Pg>();
        for param in statement.params.iter() {
            query = match param {
                Param::Text(text) => query.bind::<Text, _>(text.clone()),
                Param::Int(int) => query.bind::<BigInt, _>(*int),
            };
        }

        let rows: Vec<JsonRow> = query.load(&mut *conn)?;
        Ok(rows.into_iter().map(|row| row.payload).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap() {
        assert_eq!(
            concat!(
                "WITH q AS (DELETE FROM users WHERE id = $1 RETURNING *) ",
                "SELECT to_jsonb(q) AS payload FROM q"
            ),
            wrap("\n  DELETE FROM users WHERE id = $1 RETURNING *;\n")
        );
    }
}

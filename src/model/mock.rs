use std::{collections::VecDeque, sync::Mutex};

use diesel::result::DatabaseErrorKind;

use crate::{
    error::Error,
    model::{Executor, Statement},
};

/// In-memory `Executor` for tests: answers with queued results and
/// records every statement it receives.
#[derive(Default)]
pub struct MockExecutor {
    results: Mutex<VecDeque<Result<Vec<serde_json::Value>, String>>>,
    calls: Mutex<Vec<Statement>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next query returns these rows.
    pub fn returns(self, rows: Vec<serde_json::Value>) -> Self {
        self.results.lock().unwrap().push_back(Ok(rows));
        self
    }

    /// Next query fails with a driver error carrying `message`.
    pub fn fails(self, message: &str) -> Self {
        self.results.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Statement> {
        self.calls.lock().unwrap().clone()
    }
}

impl Executor for MockExecutor {
    fn query(&self, statement: &Statement) -> Result<Vec<serde_json::Value>, Error> {
        self.calls.lock().unwrap().push(statement.clone());
        match self.results.lock().unwrap().pop_front() {
            None => Ok(vec![]),
            Some(Ok(rows)) => Ok(rows),
            Some(Err(message)) => Err(diesel::result::Error::DatabaseError(
                DatabaseErrorKind::Unknown,
                Box::new(message),
            )
            .into()),
        }
    }
}

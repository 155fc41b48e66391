//! Query executor seam and the rows it produces

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::validator::ValidatedQuery;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Database connection not established")]
    NotConnected,

    #[error("Database service unavailable: {0}")]
    Transport(String),

    #[error("Query failed: {message} (sql: {sql})")]
    Statement { sql: String, message: String },
}

/// One result row: column name → scalar value
pub type Row = Map<String, Value>;

/// Ordered rows returned for one statement; may be empty
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultSet {
    rows: Vec<Row>,
}

impl ResultSet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Compact JSON array of row objects, as shown to the composer
    pub fn to_compact_json(&self) -> String {
        serde_json::to_string(&self.rows).unwrap_or_else(|_| "[]".to_string())
    }
}

impl FromIterator<Row> for ResultSet {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Runs one validated statement; a single attempt, no retries
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &ValidatedQuery) -> Result<ResultSet, ExecutionError>;
}

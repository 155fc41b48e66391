//! DuckDB executor for validated read-only statements

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime};
use duckdb::types::{TimeUnit, ValueRef};
use duckdb::{AccessMode, Config, Connection, Result as DuckResult};
use serde_json::Value;
use sqlbot_core::{ExecutionError, QueryExecutor, ResultSet, Row, ValidatedQuery};
use sqlparser::dialect::GenericDialect;
use sqlparser::tokenizer::{Token, Tokenizer};

/// Path that selects a throwaway in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// Owns the root connection; every execution runs on a cloned handle so
/// concurrent turns never share a statement.
pub struct DuckExecutor {
    conn: Mutex<Option<Connection>>,
}

impl DuckExecutor {
    /// Open a database file read-only, or an in-memory database for [`IN_MEMORY`]
    pub fn open(path: &str) -> DuckResult<Self> {
        let conn = if path == IN_MEMORY {
            Connection::open_in_memory()?
        } else {
            let config = Config::default().access_mode(AccessMode::ReadOnly)?;
            Connection::open_with_flags(path, config)?
        };
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(Some(conn)),
        }
    }

    /// Startup connectivity probe
    pub fn ping(&self) -> Result<(), ExecutionError> {
        let conn = self.handle()?;
        let value: i32 = conn
            .query_row("SELECT 1 AS test_column", [], |row| row.get(0))
            .map_err(|e| ExecutionError::Transport(e.to_string()))?;
        tracing::info!(test_column = value, "connected to DuckDB");
        Ok(())
    }

    /// Drop the root connection; later executions fail with `NotConnected`
    pub fn close(&self) {
        if let Ok(mut guard) = self.conn.lock() {
            guard.take();
        }
    }

    /// Run setup SQL outside the query path; fails on read-only files
    pub fn execute_batch(&self, sql: &str) -> Result<(), ExecutionError> {
        self.handle()?
            .execute_batch(sql)
            .map_err(|e| statement_error(sql, e.to_string()))
    }

    fn handle(&self) -> Result<Connection, ExecutionError> {
        let guard = self
            .conn
            .lock()
            .map_err(|_| ExecutionError::Transport("connection lock poisoned".to_string()))?;
        let conn = guard.as_ref().ok_or(ExecutionError::NotConnected)?;
        conn.try_clone()
            .map_err(|e| ExecutionError::Transport(e.to_string()))
    }
}

#[async_trait]
impl QueryExecutor for DuckExecutor {
    async fn execute(&self, query: &ValidatedQuery) -> Result<ResultSet, ExecutionError> {
        let conn = self.handle()?;
        let sql = query.as_str().to_string();

        tokio::task::spawn_blocking(move || run_query(&conn, &sql))
            .await
            .map_err(|e| ExecutionError::Transport(format!("query task failed: {}", e)))?
    }
}

fn statement_error(sql: &str, message: String) -> ExecutionError {
    tracing::error!(sql = %sql, error = %message, "DuckDB query failed");
    ExecutionError::Statement {
        sql: sql.to_string(),
        message,
    }
}

/// Number of non-empty statements in `sql`. Separators inside literals and
/// comments are not counted.
fn statement_count(sql: &str) -> Result<usize, String> {
    let tokens = Tokenizer::new(&GenericDialect {}, sql)
        .tokenize()
        .map_err(|e| e.to_string())?;

    let mut count = 0;
    let mut in_statement = false;
    for token in tokens {
        match token {
            Token::SemiColon => in_statement = false,
            Token::Whitespace(_) | Token::EOF => {}
            _ if !in_statement => {
                count += 1;
                in_statement = true;
            }
            _ => {}
        }
    }
    Ok(count)
}

/// `prepare` runs every statement before the last, so anything beyond one
/// statement is refused up front.
fn ensure_single_statement(sql: &str) -> Result<(), ExecutionError> {
    match statement_count(sql) {
        Ok(1) => Ok(()),
        Ok(n) => Err(statement_error(
            sql,
            format!("expected exactly one statement, found {}", n),
        )),
        Err(e) => Err(statement_error(sql, e)),
    }
}

/// Suffix repeated column names (`x`, `x_2`, `x_3`) so no value is lost
fn unique_columns(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(|name| {
            if seen.insert(name.clone()) {
                return name;
            }
            let mut n = 2;
            loop {
                let candidate = format!("{}_{}", name, n);
                if seen.insert(candidate.clone()) {
                    tracing::warn!(column = %name, renamed = %candidate, "duplicate column name");
                    return candidate;
                }
                n += 1;
            }
        })
        .collect()
}

fn run_query(conn: &Connection, sql: &str) -> Result<ResultSet, ExecutionError> {
    ensure_single_statement(sql)?;

    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| statement_error(sql, e.to_string()))?;
    let mut rows = stmt
        .query([])
        .map_err(|e| statement_error(sql, e.to_string()))?;

    let mut columns: Vec<String> = Vec::new();
    let mut result = Vec::new();

    while let Some(row) = rows.next().map_err(|e| statement_error(sql, e.to_string()))? {
        // Column names come from the executed statement
        if columns.is_empty() {
            let stmt: &duckdb::Statement<'_> = row.as_ref();
            let mut names = Vec::with_capacity(stmt.column_count());
            for i in 0..stmt.column_count() {
                let name = stmt
                    .column_name(i)
                    .map_err(|e| statement_error(sql, e.to_string()))?;
                names.push(name.to_string());
            }
            columns = unique_columns(names);
        }

        let mut row_obj = Row::new();
        for (i, col_name) in columns.iter().enumerate() {
            let value = row
                .get_ref(i)
                .map_err(|e| statement_error(sql, e.to_string()))?;
            row_obj.insert(col_name.clone(), value_to_json(value));
        }
        result.push(row_obj);
    }

    Ok(ResultSet::new(result))
}

const MICROS_PER_SECOND: i64 = 1_000_000;
const SECONDS_PER_DAY: i64 = 86_400;

fn date_to_json(days: i32) -> Value {
    DateTime::from_timestamp(i64::from(days) * SECONDS_PER_DAY, 0)
        .map(|dt| Value::String(dt.date_naive().format("%Y-%m-%d").to_string()))
        .unwrap_or(Value::Null)
}

fn timestamp_to_json(unit: TimeUnit, value: i64) -> Value {
    DateTime::from_timestamp_micros(unit.to_micros(value))
        .map(|dt| {
            Value::String(
                dt.naive_utc()
                    .format("%Y-%m-%dT%H:%M:%S%.f")
                    .to_string(),
            )
        })
        .unwrap_or(Value::Null)
}

fn time_to_json(unit: TimeUnit, value: i64) -> Value {
    let micros = unit.to_micros(value);
    let secs = u32::try_from(micros.div_euclid(MICROS_PER_SECOND)).ok();
    let nanos = u32::try_from(micros.rem_euclid(MICROS_PER_SECOND) * 1000).ok();
    secs.zip(nanos)
        .and_then(|(secs, nanos)| NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos))
        .map(|t| Value::String(t.format("%H:%M:%S%.f").to_string()))
        .unwrap_or(Value::Null)
}

/// ISO 8601 duration, e.g. `P1M2DT3.5S`
fn interval_to_json(months: i32, days: i32, nanos: i64) -> Value {
    let seconds = nanos as f64 / 1e9;
    Value::String(format!("P{}M{}DT{}S", months, days, seconds))
}

/// Convert a DuckDB value to a JSON scalar
fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Bool(b),
        ValueRef::TinyInt(i) => Value::from(i),
        ValueRef::SmallInt(i) => Value::from(i),
        ValueRef::Int(i) => Value::from(i),
        ValueRef::BigInt(i) => Value::from(i),
        ValueRef::HugeInt(i) => i64::try_from(i)
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(i.to_string())),
        ValueRef::UTinyInt(i) => Value::from(i),
        ValueRef::USmallInt(i) => Value::from(i),
        ValueRef::UInt(i) => Value::from(i),
        ValueRef::UBigInt(i) => Value::from(i),
        ValueRef::Float(f) => Value::from(f),
        ValueRef::Double(f) => Value::from(f),
        ValueRef::Decimal(d) => {
            let text = d.to_string();
            text.parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::String(text))
        }
        ValueRef::Date32(days) => date_to_json(days),
        ValueRef::Timestamp(unit, v) => timestamp_to_json(unit, v),
        ValueRef::Time64(unit, v) => time_to_json(unit, v),
        ValueRef::Interval {
            months,
            days,
            nanos,
        } => interval_to_json(months, days, nanos),
        ValueRef::Text(s) => Value::String(String::from_utf8_lossy(s).to_string()),
        ValueRef::Blob(b) => Value::String(format!("<blob {} bytes>", b.len())),
        _ => Value::String("<unsupported>".to_string()),
    }
}

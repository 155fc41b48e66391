//! Scripted stand-ins for the completion service and the database

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use sqlbot_core::{
    CompletionError, CompletionRequest, CompletionService, ExecutionError, Pipeline,
    QueryExecutor, ReplyMessages, ResultSet, Row, SchemaDescriptor, ValidatedQuery,
};

/// Replies with queued answers in order and records every request
#[derive(Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String, String>>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new(replies: Vec<Result<&str, &str>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(String::from).map_err(String::from))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, idx: usize) -> CompletionRequest {
        self.requests.lock().unwrap()[idx].clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        self.requests.lock().unwrap().push(request);
        match self.replies.lock().unwrap().pop_front() {
            Some(reply) => reply.map_err(CompletionError::Request),
            None => Err(CompletionError::EmptyResponse),
        }
    }
}

/// Answers by question: the first rule whose key appears in the user text
/// supplies the reply. Yields once before replying so concurrent turns
/// interleave.
pub struct RoutedCompletion {
    rules: Vec<(String, String)>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl RoutedCompletion {
    pub fn new(rules: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            rules: rules
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionService for RoutedCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        tokio::task::yield_now().await;
        let reply = self
            .rules
            .iter()
            .find(|(key, _)| request.user.contains(key.as_str()))
            .map(|(_, reply)| reply.clone());
        self.requests.lock().unwrap().push(request);
        reply.ok_or(CompletionError::EmptyResponse)
    }
}

/// Returns fixed rows (or a fixed failure) and counts calls
pub struct FakeDatabase {
    result: Result<Vec<Row>, String>,
    calls: AtomicUsize,
    pub executed: Mutex<Vec<String>>,
}

impl FakeDatabase {
    pub fn with_rows(rows: Vec<Row>) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(rows),
            calls: AtomicUsize::new(0),
            executed: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            executed: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryExecutor for FakeDatabase {
    async fn execute(&self, query: &ValidatedQuery) -> Result<ResultSet, ExecutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.executed.lock().unwrap().push(query.as_str().to_string());
        match &self.result {
            Ok(rows) => Ok(ResultSet::new(rows.clone())),
            Err(message) => Err(ExecutionError::Statement {
                sql: query.as_str().to_string(),
                message: message.clone(),
            }),
        }
    }
}

pub fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub fn pipeline(completion: Arc<ScriptedCompletion>, database: Arc<FakeDatabase>) -> Pipeline {
    Pipeline::new(
        Arc::new(SchemaDescriptor::artists()),
        completion,
        database,
        ReplyMessages::default(),
    )
}

// Scripted session and row helpers shared by the unit tests

use crate::session::{RecordCursor, ResultHandle, Session};
use async_trait::async_trait;
use graphlink_common::{GraphError, NodeValue, Parameters, Record, RelationshipValue, Result, Value};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Node whose native id and `id` property are both `id`.
pub fn node(id: i64, labels: &[&str]) -> Value {
    let mut properties = HashMap::new();
    properties.insert("id".to_string(), json!(id));
    Value::Node(NodeValue {
        id: json!(id),
        labels: labels.iter().map(|l| l.to_string()).collect(),
        properties,
    })
}

/// Relationship whose native id and `id` property are both `id`.
pub fn relationship(id: i64, rel_type: &str, start: i64, end: i64) -> Value {
    let mut properties = HashMap::new();
    properties.insert("id".to_string(), json!(id));
    Value::Relationship(RelationshipValue {
        id: json!(id),
        rel_type: rel_type.to_string(),
        start: json!(start),
        end: json!(end),
        properties,
    })
}

pub fn row(source: Value, rel: Value, related: Value) -> Record {
    Record::default()
        .with("n", source)
        .with("r", rel)
        .with("m", related)
}

/// Row for an edge `id` of `rel_type` running from `start` to `end`, seen
/// from vertex `from`.
pub fn edge_row(from: i64, id: i64, rel_type: &str, start: i64, end: i64) -> Record {
    let other = if start == from { end } else { start };
    row(node(from, &["l1"]), relationship(id, rel_type, start, end), node(other, &["l2"]))
}

enum Response {
    Rows(Vec<Result<Record>>),
    Failure(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedQuery {
    pub text: String,
    pub parameters: Parameters,
}

/// Replays queued responses in order and records every executed query.
/// An exhausted queue answers with an empty result.
#[derive(Default)]
pub struct StubSession {
    responses: Mutex<VecDeque<Response>>,
    executed: Mutex<Vec<ExecutedQuery>>,
    released: Arc<AtomicUsize>,
}

impl StubSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, rows: Vec<Record>) -> Self {
        self.respond_with(rows.into_iter().map(Ok).collect())
    }

    pub fn respond_with(self, rows: Vec<Result<Record>>) -> Self {
        self.push(Response::Rows(rows))
    }

    pub fn fail(self, reason: &str) -> Self {
        self.push(Response::Failure(reason.to_string()))
    }

    fn push(self, response: Response) -> Self {
        self.responses
            .lock()
            .expect("responses lock")
            .push_back(response);
        self
    }

    pub fn executed(&self) -> Vec<ExecutedQuery> {
        self.executed.lock().expect("executed lock").clone()
    }

    pub fn releases(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Session for StubSession {
    async fn execute_query(&self, query: &str, parameters: &Parameters) -> Result<ResultHandle> {
        self.executed.lock().expect("executed lock").push(ExecutedQuery {
            text: query.to_string(),
            parameters: parameters.clone(),
        });

        let response = self.responses.lock().expect("responses lock").pop_front();
        let rows = match response {
            Some(Response::Failure(reason)) => {
                return Err(GraphError::fetch(anyhow::anyhow!(reason)));
            }
            Some(Response::Rows(rows)) => rows,
            None => Vec::new(),
        };

        let released = self.released.clone();
        Ok(RecordCursor::new(rows)
            .on_release(move || {
                released.fetch_add(1, Ordering::SeqCst);
            })
            .into_handle())
    }
}

#![allow(dead_code)]

use async_trait::async_trait;
use codedash_api::models::{FunctionDocument, FunctionId, FunctionStats, ProgressSnapshot, ResultItem};
use codedash_api::{AnalysisBackend, ApiError, ApiResult};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Progress,
    Functions(usize),
    Search { query: String, limit: usize, fuzzy: bool },
    Analyze(String),
    Code(FunctionId),
}

/// A scripted response, optionally held back until its gate is notified.
pub struct Reply<T> {
    gate: Option<Arc<Notify>>,
    result: ApiResult<T>,
}

impl<T> Reply<T> {
    pub fn ok(value: T) -> Self {
        Self {
            gate: None,
            result: Ok(value),
        }
    }

    pub fn err(error: ApiError) -> Self {
        Self {
            gate: None,
            result: Err(error),
        }
    }

    pub fn gated(mut self, gate: &Arc<Notify>) -> Self {
        self.gate = Some(Arc::clone(gate));
        self
    }
}

pub fn status(endpoint: &str, status: u16) -> ApiError {
    ApiError::Status {
        endpoint: endpoint.to_string(),
        status,
    }
}

type Queue<T> = Mutex<VecDeque<Reply<T>>>;

/// In-memory backend. Unscripted calls succeed with empty data, except
/// `function_code` which answers 404.
#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<Call>>,
    progress: Queue<ProgressSnapshot>,
    functions: Queue<Vec<FunctionStats>>,
    search: Queue<Vec<ResultItem>>,
    analyze: Queue<Vec<ResultItem>>,
    code: Queue<FunctionDocument>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub fn push_progress(&self, reply: Reply<ProgressSnapshot>) {
        self.progress.lock().unwrap().push_back(reply);
    }

    pub fn push_functions(&self, reply: Reply<Vec<FunctionStats>>) {
        self.functions.lock().unwrap().push_back(reply);
    }

    pub fn push_search(&self, reply: Reply<Vec<ResultItem>>) {
        self.search.lock().unwrap().push_back(reply);
    }

    pub fn push_analyze(&self, reply: Reply<Vec<ResultItem>>) {
        self.analyze.lock().unwrap().push_back(reply);
    }

    pub fn push_code(&self, reply: Reply<FunctionDocument>) {
        self.code.lock().unwrap().push_back(reply);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

async fn next_reply<T>(queue: &Queue<T>, fallback: impl FnOnce() -> ApiResult<T>) -> ApiResult<T> {
    let reply = queue.lock().unwrap().pop_front();
    match reply {
        Some(Reply { gate, result }) => {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            result
        }
        None => fallback(),
    }
}

#[async_trait]
impl AnalysisBackend for FakeBackend {
    async fn progress(&self) -> ApiResult<ProgressSnapshot> {
        self.record(Call::Progress);
        next_reply(&self.progress, || Ok(ProgressSnapshot::default())).await
    }

    async fn functions(&self, limit: usize) -> ApiResult<Vec<FunctionStats>> {
        self.record(Call::Functions(limit));
        next_reply(&self.functions, || Ok(Vec::new())).await
    }

    async fn search(&self, query: &str, limit: usize, fuzzy: bool) -> ApiResult<Vec<ResultItem>> {
        self.record(Call::Search {
            query: query.to_string(),
            limit,
            fuzzy,
        });
        next_reply(&self.search, || Ok(Vec::new())).await
    }

    async fn analyze(&self, stacktrace: &str) -> ApiResult<Vec<ResultItem>> {
        self.record(Call::Analyze(stacktrace.to_string()));
        next_reply(&self.analyze, || Ok(Vec::new())).await
    }

    async fn function_code(&self, function_id: &FunctionId) -> ApiResult<FunctionDocument> {
        self.record(Call::Code(function_id.clone()));
        next_reply(&self.code, || Err(status("/code", 404))).await
    }
}

/// Yields until `cond` holds, failing the test if it never does.
pub async fn wait_until(cond: impl Fn() -> bool) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

pub fn chunk(function: &str, start: u32, end: u32) -> ResultItem {
    ResultItem::from_wire(json!({
        "type": "chunk",
        "function_name": function,
        "filepath": format!("src/{}.ext", function),
        "start_line": start,
        "end_line": end,
        "summary": format!("{} body", function),
    }))
}

pub fn summary(filepath: &str, function: &str, id: i64) -> ResultItem {
    ResultItem::from_wire(json!({
        "type": "function_summary",
        "filepath": filepath,
        "function_name": function,
        "function_id": id,
    }))
}

pub fn frame_error(message: &str) -> ResultItem {
    ResultItem::from_wire(json!({"type": "error", "message": message}))
}

pub fn document(name: &str, start: u32, lines: usize) -> FunctionDocument {
    let code = (0..lines)
        .map(|i| format!("    stmt_{};", i))
        .collect::<Vec<_>>()
        .join("\n");
    FunctionDocument {
        function_name: name.to_string(),
        parameters: Some(json!("[{\"name\": \"user\"}]")),
        code: Some(code),
        start_line: Some(start),
        end_line: Some(start + lines as u32),
        ..Default::default()
    }
}

pub fn stats(name: &str, complexity: f64, impact: f64) -> FunctionStats {
    FunctionStats {
        function_name: name.to_string(),
        filepath: format!("src/{}.ext", name),
        class_name: None,
        avg_complexity: Some(complexity),
        avg_impact: Some(impact),
    }
}

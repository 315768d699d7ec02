//! In-process stand-in for the data service.
//!
//! Interprets [`Request`]s against plain vectors of rows and records every
//! request it receives, so callers can assert on how many requests an
//! operation made and what they looked like.

use std::cmp::Ordering as CmpOrdering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};

use crate::request::{CREATED_AT, render};
use crate::{Backend, QueryOutcome, Record, Request, ServiceError, Verb};

#[derive(Debug, Default)]
struct State {
    tables: BTreeMap<String, Vec<Record>>,
    next_id: i64,
    requests: Vec<Request>,
    failure: Option<ServiceError>,
}

#[derive(Debug)]
pub struct MemoryBackend {
    state: Mutex<State>,
    calls: AtomicUsize,
    ready: AtomicBool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 1,
                ..State::default()
            }),
            calls: AtomicUsize::new(0),
            ready: AtomicBool::new(true),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store rows as given, without assigning ids or timestamps. Later
    /// inserts are numbered after the largest integer id seeded.
    pub fn seed(&self, table: impl AsRef<str>, rows: impl IntoIterator<Item = Record>) {
        let rows: Vec<Record> = rows.into_iter().collect();
        let mut state = self.lock();
        if let Some(max) = rows.iter().filter_map(|row| row.get("id")?.as_i64()).max() {
            state.next_id = state.next_id.max(max + 1);
        }
        state
            .tables
            .entry(table.as_ref().to_string())
            .or_default()
            .extend(rows);
    }

    pub fn rows(&self, table: impl AsRef<str>) -> Vec<Record> {
        self.lock()
            .tables
            .get(table.as_ref())
            .cloned()
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Request> {
        self.lock().requests.clone()
    }

    /// Answer every following request with `error`, until cleared with
    /// `None`.
    pub fn fail_with(&self, error: Option<ServiceError>) {
        self.lock().failure = error;
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn execute(&self, request: Request) -> QueryOutcome<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        state.requests.push(request.clone());
        if let Some(error) = state.failure.clone() {
            return QueryOutcome::failed(error);
        }
        state.apply(request)
    }

    async fn ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

impl State {
    fn apply(&mut self, request: Request) -> QueryOutcome<Value> {
        let affected = match request.verb {
            Verb::Select => {
                let mut rows: Vec<Record> = self
                    .tables
                    .get(&request.table)
                    .map(|rows| {
                        rows.iter()
                            .filter(|row| matches(row, &request))
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();
                if let Some(order) = &request.order {
                    rows.sort_by(|a, b| {
                        let ord = compare(a.get(&order.column), b.get(&order.column));
                        if order.ascending { ord } else { ord.reverse() }
                    });
                }
                if let Some(limit) = request.limit {
                    rows.truncate(limit);
                }
                if request.columns == "count" {
                    let mut row = Record::new();
                    row.insert("count".into(), json!(rows.len()));
                    rows = vec![row];
                }
                rows
            }
            Verb::Insert => {
                let rows = match request.body.clone() {
                    Some(Value::Array(items)) => items,
                    Some(item @ Value::Object(_)) => vec![item],
                    _ => {
                        return QueryOutcome::failed(
                            ServiceError::new("insert body must be an object or a list")
                                .with_code("PGRST102"),
                        );
                    }
                };
                let mut inserted = Vec::with_capacity(rows.len());
                for item in rows {
                    let Value::Object(mut row) = item else {
                        return QueryOutcome::failed(
                            ServiceError::new("insert rows must be objects").with_code("PGRST102"),
                        );
                    };
                    if !row.contains_key("id") {
                        row.insert("id".into(), json!(self.next_id));
                        self.next_id += 1;
                    }
                    if !row.contains_key(CREATED_AT) {
                        row.insert(CREATED_AT.into(), json!(now()));
                    }
                    inserted.push(row);
                }
                self.tables
                    .entry(request.table.clone())
                    .or_default()
                    .extend(inserted.iter().cloned());
                inserted
            }
            Verb::Update => {
                let Some(Value::Object(changes)) = request.body.clone() else {
                    return QueryOutcome::failed(
                        ServiceError::new("update body must be an object").with_code("PGRST102"),
                    );
                };
                let mut updated = Vec::new();
                if let Some(rows) = self.tables.get_mut(&request.table) {
                    for row in rows.iter_mut().filter(|row| matches(row, &request)) {
                        for (key, value) in &changes {
                            row.insert(key.clone(), value.clone());
                        }
                        updated.push(row.clone());
                    }
                }
                updated
            }
            Verb::Delete => {
                let mut removed = Vec::new();
                if let Some(rows) = self.tables.get_mut(&request.table) {
                    let (gone, kept): (Vec<_>, Vec<_>) =
                        rows.drain(..).partition(|row| matches(row, &request));
                    *rows = kept;
                    removed = gone;
                }
                removed
            }
        };

        if !request.returning {
            return QueryOutcome::empty();
        }
        if request.single {
            return single(affected);
        }
        QueryOutcome::ok(Value::Array(
            affected.into_iter().map(Value::Object).collect(),
        ))
    }
}

fn single(mut rows: Vec<Record>) -> QueryOutcome<Value> {
    if rows.len() == 1 {
        if let Some(row) = rows.pop() {
            return QueryOutcome::ok(Value::Object(row));
        }
    }
    QueryOutcome::failed(
        ServiceError::new("JSON object requested, multiple (or no) rows returned")
            .with_code("PGRST116")
            .with_details(format!("The result contains {} rows", rows.len())),
    )
}

fn matches(row: &Record, request: &Request) -> bool {
    request.filters.iter().all(|filter| {
        row.get(&filter.column)
            .is_some_and(|value| render(value) == filter.value)
    })
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(CmpOrdering::Equal),
        (Some(x), Some(y)) => render(x).cmp(&render(y)),
        (Some(_), None) => CmpOrdering::Greater,
        (None, Some(_)) => CmpOrdering::Less,
        (None, None) => CmpOrdering::Equal,
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture rows must be objects"),
        }
    }

    #[tokio::test]
    async fn assigns_ids_and_timestamps_on_insert() {
        let backend = MemoryBackend::new();
        let outcome = backend
            .execute(
                Request::insert("employees", json!([{"name": "Ada"}]))
                    .returning()
                    .single(),
            )
            .await;
        let data = outcome.data.unwrap();
        assert_eq!(data["id"], json!(1));
        assert_eq!(data["name"], json!("Ada"));
        assert!(data[CREATED_AT].is_string());
        assert_eq!(backend.rows("employees").len(), 1);
    }

    #[tokio::test]
    async fn inserts_after_seeding_do_not_reuse_ids() {
        let backend = MemoryBackend::new();
        backend.seed("employees", [row(json!({"id": 1})), row(json!({"id": "emp-9"}))]);
        let outcome = backend
            .execute(
                Request::insert("employees", json!([{"name": "Grace"}]))
                    .returning()
                    .single(),
            )
            .await;
        assert_eq!(outcome.data.unwrap()["id"], json!(2));

        let ids: Vec<Value> = backend
            .rows("employees")
            .into_iter()
            .filter_map(|row| row.get("id").cloned())
            .collect();
        assert_eq!(ids, vec![json!(1), json!("emp-9"), json!(2)]);
    }

    #[tokio::test]
    async fn single_reports_missing_rows() {
        let backend = MemoryBackend::new();
        let outcome = backend
            .execute(
                Request::update("leaves", json!({"status": "approved"}))
                    .eq("id", 99)
                    .returning()
                    .single(),
            )
            .await;
        assert!(outcome.data.is_none());
        assert_eq!(outcome.error.unwrap().code.as_deref(), Some("PGRST116"));
    }

    #[tokio::test]
    async fn count_select_reports_matching_rows() {
        let backend = MemoryBackend::new();
        backend.seed("employees", [row(json!({"id": 1})), row(json!({"id": 2}))]);
        let outcome = backend
            .execute(Request::select("employees").columns("count"))
            .await;
        assert_eq!(outcome.data.unwrap(), json!([{"count": 2}]));
    }

    #[tokio::test]
    async fn failure_is_sticky_until_cleared() {
        let backend = MemoryBackend::new();
        backend.fail_with(Some(ServiceError::new("offline")));
        assert!(backend.execute(Request::select("users")).await.error.is_some());
        assert!(backend.execute(Request::select("users")).await.error.is_some());
        backend.fail_with(None);
        assert!(backend.execute(Request::select("users")).await.is_ok());
        assert_eq!(backend.call_count(), 3);
        assert_eq!(backend.requests().len(), 3);
    }
}

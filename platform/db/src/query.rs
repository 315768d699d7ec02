use serde_json::Value;

use crate::{HrStore, QueryOutcome, Record, Request};

/// Entry point for an ad-hoc request, obtained from
/// [`HrStore::from_table`].
pub struct TableQuery<'a> {
    store: &'a HrStore,
    table: String,
}

impl<'a> TableQuery<'a> {
    pub(crate) fn new(store: &'a HrStore, table: &str) -> Self {
        Self {
            store,
            table: table.to_string(),
        }
    }

    pub fn select(self, columns: impl Into<String>) -> PendingQuery<'a> {
        let request = Request::select(&self.table).columns(columns);
        self.pending(request)
    }

    pub fn insert(self, rows: Vec<Record>) -> PendingQuery<'a> {
        let rows = Value::Array(rows.into_iter().map(Value::Object).collect());
        let request = Request::insert(&self.table, rows);
        self.pending(request)
    }

    pub fn update(self, changes: Record) -> PendingQuery<'a> {
        let request = Request::update(&self.table, Value::Object(changes));
        self.pending(request)
    }

    pub fn delete(self) -> PendingQuery<'a> {
        let request = Request::delete(&self.table);
        self.pending(request)
    }

    fn pending(self, request: Request) -> PendingQuery<'a> {
        PendingQuery {
            store: self.store,
            request,
        }
    }
}

/// A request being assembled; nothing is sent until
/// [`PendingQuery::execute`].
pub struct PendingQuery<'a> {
    store: &'a HrStore,
    request: Request,
}

impl PendingQuery<'_> {
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.request = self.request.eq(column, value);
        self
    }

    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.request = self.request.order(column, ascending);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.request = self.request.limit(limit);
        self
    }

    pub fn single(mut self) -> Self {
        self.request = self.request.single();
        self
    }

    /// Return the affected rows of an insert, update or delete.
    pub fn returning(mut self) -> Self {
        self.request = self.request.returning();
        self
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub async fn execute(self) -> QueryOutcome<Value> {
        self.store.run(self.request).await
    }
}

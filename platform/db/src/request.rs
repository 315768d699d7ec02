use serde_json::Value;

pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verb {
    Select,
    Insert,
    Update,
    Delete,
}

/// Equality filter on one column. The value is kept in its rendered form,
/// which is what goes on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ordering {
    pub column: String,
    pub ascending: bool,
}

/// One request against one table, independent of how it is transported.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub table: String,
    pub verb: Verb,
    pub columns: String,
    pub filters: Vec<Filter>,
    pub order: Option<Ordering>,
    pub limit: Option<usize>,
    /// Expect exactly one row back, as an object rather than a list.
    pub single: bool,
    /// Return the affected rows from an insert, update or delete.
    pub returning: bool,
    pub body: Option<Value>,
}

impl Request {
    fn new(table: impl AsRef<str>, verb: Verb, body: Option<Value>) -> Self {
        Self {
            table: table.as_ref().to_string(),
            verb,
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
            single: false,
            returning: verb == Verb::Select,
            body,
        }
    }

    pub fn select(table: impl AsRef<str>) -> Self {
        Self::new(table, Verb::Select, None)
    }

    pub fn insert(table: impl AsRef<str>, rows: Value) -> Self {
        Self::new(table, Verb::Insert, Some(rows))
    }

    pub fn update(table: impl AsRef<str>, changes: Value) -> Self {
        Self::new(table, Verb::Update, Some(changes))
    }

    pub fn delete(table: impl AsRef<str>) -> Self {
        Self::new(table, Verb::Delete, None)
    }

    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            value: render(&value.into()),
        });
        self
    }

    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Ordering {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    pub fn returning(mut self) -> Self {
        self.returning = true;
        self
    }
}

/// Render a JSON value the way it appears in an equality filter.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

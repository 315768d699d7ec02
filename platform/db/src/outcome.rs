use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Untyped row as stored by the service.
pub type Record = Map<String, Value>;

pub const ACCESS_DENIED_MESSAGE: &str = "Access denied: Insufficient permissions";

/// Primary key of a row. Integer keys stay integers so they render without
/// quotes in filters and compare equal to the stored value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{id}"),
            RecordId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        RecordId::Text(value)
    }
}

impl FromStr for RecordId {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        // Only canonical integers become `Int`; "007" or "+5" stay text so the
        // filter matches the stored key exactly.
        Ok(match value.parse::<i64>() {
            Ok(n) if n.to_string() == value => RecordId::Int(n),
            _ => RecordId::Text(value.to_string()),
        })
    }
}

/// Error object in the shape the service reports it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct ServiceError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            details: None,
            hint: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn access_denied() -> Self {
        Self::new(ACCESS_DENIED_MESSAGE)
    }

    pub(crate) fn decode(err: serde_json::Error) -> Self {
        Self::new(format!("unexpected response shape: {err}"))
    }
}

/// Data and error exactly as the service returned them. Both may be absent
/// (a delete without returned rows), and both may be present (the access
/// denied listing carries an empty list alongside its error).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome<T> {
    pub data: Option<T>,
    pub error: Option<ServiceError>,
}

impl<T> QueryOutcome<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            data: None,
            error: None,
        }
    }

    pub fn failed(error: ServiceError) -> Self {
        Self {
            data: None,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<Option<T>, ServiceError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.data),
        }
    }
}

impl<T> QueryOutcome<Vec<T>> {
    pub fn access_denied() -> Self {
        Self {
            data: Some(Vec::new()),
            error: Some(ServiceError::access_denied()),
        }
    }
}

impl QueryOutcome<Value> {
    /// Interpret the raw payload as `T`. A JSON `null` payload becomes
    /// `data: None`; the error is never touched.
    pub fn decode<T: DeserializeOwned>(self) -> QueryOutcome<T> {
        let Self { data, error } = self;
        match data {
            None | Some(Value::Null) => QueryOutcome { data: None, error },
            Some(value) => match serde_json::from_value(value) {
                Ok(decoded) => QueryOutcome {
                    data: Some(decoded),
                    error,
                },
                Err(err) => QueryOutcome {
                    data: None,
                    error: Some(error.unwrap_or_else(|| ServiceError::decode(err))),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn access_denied_serializes_like_the_service() {
        let outcome: QueryOutcome<Vec<Record>> = QueryOutcome::access_denied();
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"data": [], "error": {"message": "Access denied: Insufficient permissions"}})
        );
    }

    #[test]
    fn decodes_rows_and_keeps_errors() {
        let raw = QueryOutcome::ok(json!([{"id": 1}, {"id": 2}]));
        let rows: QueryOutcome<Vec<Record>> = raw.decode();
        assert_eq!(rows.data.unwrap().len(), 2);

        let failed: QueryOutcome<Vec<Record>> =
            QueryOutcome::<Value>::failed(ServiceError::new("boom").with_code("500")).decode();
        assert!(failed.data.is_none());
        assert_eq!(failed.error.unwrap().code.as_deref(), Some("500"));

        let null: QueryOutcome<Record> = QueryOutcome::ok(Value::Null).decode();
        assert_eq!(null, QueryOutcome::empty());
    }

    #[test]
    fn shape_mismatch_becomes_an_error() {
        let outcome: QueryOutcome<Vec<Record>> = QueryOutcome::ok(json!({"id": 1})).decode();
        assert!(outcome.data.is_none());
        assert!(
            outcome
                .error
                .unwrap()
                .message
                .starts_with("unexpected response shape")
        );
    }

    #[test]
    fn service_error_parses_postgrest_body() {
        let err: ServiceError = serde_json::from_value(json!({
            "code": "23505",
            "details": "Key (email)=(a@b.c) already exists.",
            "hint": null,
            "message": "duplicate key value violates unique constraint"
        }))
        .unwrap();
        assert_eq!(err.code.as_deref(), Some("23505"));
        assert!(err.hint.is_none());
        assert_eq!(
            err.to_string(),
            "duplicate key value violates unique constraint"
        );
    }

    #[test]
    fn record_ids_parse_and_render() {
        assert_eq!("42".parse::<RecordId>().unwrap(), RecordId::Int(42));
        assert_eq!(
            "emp-7".parse::<RecordId>().unwrap(),
            RecordId::Text("emp-7".into())
        );
        assert_eq!("-3".parse::<RecordId>().unwrap(), RecordId::Int(-3));
        assert_eq!(
            "007".parse::<RecordId>().unwrap(),
            RecordId::Text("007".into())
        );
        assert_eq!("+5".parse::<RecordId>().unwrap(), RecordId::Text("+5".into()));
        assert_eq!(RecordId::from(9).to_string(), "9");
        assert_eq!(
            serde_json::to_value(RecordId::from("x")).unwrap(),
            json!("x")
        );
    }
}

//! Data access for the HR application.
//!
//! Every operation is a single request against the hosted PostgREST service.
//! Results come back as a [`QueryOutcome`] carrying the service's data and
//! error unchanged.

use std::time::Duration;

use thiserror::Error;

mod backend;
mod client;
mod config;
mod health;
pub mod memory;
mod outcome;
mod query;
mod request;
mod rest;
mod role;
mod store;
mod table;

pub use backend::{Backend, Handle};
pub use client::ClientAccessor;
pub use config::{DatabaseSettings, InitPolicy};
pub use health::ConnectionStatus;
pub use memory::MemoryBackend;
pub use outcome::{ACCESS_DENIED_MESSAGE, QueryOutcome, Record, RecordId, ServiceError};
pub use query::{PendingQuery, TableQuery};
pub use request::{Filter, Ordering, Request, Verb};
pub use rest::RestBackend;
pub use role::Role;
pub use store::HrStore;
pub use table::{ParseTableError, Table};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database url missing (set SUPABASE_URL)")]
    MissingUrl,
    #[error("database access key missing (set SUPABASE_ANON_KEY)")]
    MissingKey,
    #[error("invalid value {value:?} for {key}")]
    InvalidSetting { key: &'static str, value: String },
    #[error("database client not ready after {0:?}")]
    InitTimeout(Duration),
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type DbResult<T> = Result<T, DbError>;

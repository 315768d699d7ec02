use serde::Serialize;
use tracing::{error, info, instrument};

use crate::{HrStore, Request, ServiceError, Table};

/// Result of [`HrStore::test_connection`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ServiceError>,
}

impl ConnectionStatus {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn failed(error: ServiceError) -> Self {
        Self {
            success: false,
            error: Some(error),
        }
    }
}

impl HrStore {
    /// Minimal bounded read used to verify connectivity at startup.
    #[instrument(name = "db.test_connection", skip_all)]
    pub async fn test_connection(&self) -> ConnectionStatus {
        let handle = match self.client().get().await {
            Ok(handle) => handle,
            Err(err) => {
                error!(error = %err, "database connection error");
                return ConnectionStatus::failed(ServiceError::new(err.to_string()));
            }
        };

        let probe = Request::select(Table::Employees).columns("count").limit(1);
        match handle.execute(probe).await.error {
            Some(err) => {
                error!(code = ?err.code, message = %err.message, "database connection failed");
                ConnectionStatus::failed(err)
            }
            None => {
                info!("database connection successful");
                ConnectionStatus::ok()
            }
        }
    }
}

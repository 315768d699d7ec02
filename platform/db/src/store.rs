use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tracing::{error, instrument, warn};

use crate::request::{CREATED_AT, UPDATED_AT};
use crate::{
    ClientAccessor, QueryOutcome, Record, RecordId, Request, Role, ServiceError, Table, TableQuery,
};

/// HR record operations. Each call makes exactly one request and returns the
/// service's answer untouched.
#[derive(Clone, Debug)]
pub struct HrStore {
    client: Arc<ClientAccessor>,
}

impl HrStore {
    pub fn new(client: Arc<ClientAccessor>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ClientAccessor {
        &self.client
    }

    /// Start an ad-hoc request against any table.
    pub fn from_table(&self, table: impl AsRef<str>) -> TableQuery<'_> {
        TableQuery::new(self, table.as_ref())
    }

    pub(crate) async fn run(&self, request: Request) -> QueryOutcome<Value> {
        match self.client.get().await {
            Ok(handle) => handle.execute(request).await,
            Err(err) => {
                error!(error = %err, table = %request.table, "database client unavailable");
                QueryOutcome::failed(ServiceError::new(err.to_string()))
            }
        }
    }

    async fn list_all(&self, table: Table) -> QueryOutcome<Vec<Record>> {
        self.run(Request::select(table).order(CREATED_AT, false))
            .await
            .decode()
    }

    async fn insert_one(&self, table: Table, record: Record) -> QueryOutcome<Record> {
        let rows = Value::Array(vec![Value::Object(record)]);
        self.run(Request::insert(table, rows).returning().single())
            .await
            .decode()
    }

    async fn update_one(
        &self,
        table: Table,
        id: RecordId,
        changes: Record,
    ) -> QueryOutcome<Record> {
        self.run(
            Request::update(table, Value::Object(changes))
                .eq("id", id.to_string())
                .returning()
                .single(),
        )
        .await
        .decode()
    }

    async fn set_status(&self, table: Table, id: RecordId, status: &str) -> QueryOutcome<Record> {
        let mut changes = Record::new();
        changes.insert("status".into(), Value::String(status.to_string()));
        changes.insert(UPDATED_AT.into(), Value::String(timestamp()));
        self.update_one(table, id, changes).await
    }

    async fn delete_one(&self, table: Table, id: RecordId) -> QueryOutcome<Value> {
        self.run(Request::delete(table).eq("id", id.to_string())).await
    }

    async fn list_compensation(&self, table: Table, role: &Role) -> QueryOutcome<Vec<Record>> {
        if !role.can_view_compensation() {
            warn!(%role, %table, "listing denied for role");
            return QueryOutcome::access_denied();
        }
        self.list_all(table).await
    }

    // Users

    #[instrument(name = "db.get_user_by_credentials", skip_all)]
    pub async fn get_user_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> QueryOutcome<Record> {
        self.run(
            Request::select(Table::Users)
                .eq("email", email)
                .eq("password", password)
                .single(),
        )
        .await
        .decode()
    }

    // Employees

    #[instrument(name = "db.get_all_employees", skip_all)]
    pub async fn get_all_employees(&self) -> QueryOutcome<Vec<Record>> {
        self.list_all(Table::Employees).await
    }

    #[instrument(name = "db.add_employee", skip_all)]
    pub async fn add_employee(&self, employee: Record) -> QueryOutcome<Record> {
        self.insert_one(Table::Employees, employee).await
    }

    #[instrument(name = "db.update_employee", skip_all)]
    pub async fn update_employee(
        &self,
        id: impl Into<RecordId>,
        updates: Record,
    ) -> QueryOutcome<Record> {
        self.update_one(Table::Employees, id.into(), updates).await
    }

    #[instrument(name = "db.delete_employee", skip_all)]
    pub async fn delete_employee(&self, id: impl Into<RecordId>) -> QueryOutcome<Value> {
        self.delete_one(Table::Employees, id.into()).await
    }

    // Leaves

    #[instrument(name = "db.get_all_leaves", skip_all)]
    pub async fn get_all_leaves(&self) -> QueryOutcome<Vec<Record>> {
        self.list_all(Table::Leaves).await
    }

    #[instrument(name = "db.add_leave", skip_all)]
    pub async fn add_leave(&self, leave: Record) -> QueryOutcome<Record> {
        self.insert_one(Table::Leaves, leave).await
    }

    #[instrument(name = "db.update_leave_status", skip_all, fields(status = %status))]
    pub async fn update_leave_status(
        &self,
        id: impl Into<RecordId>,
        status: &str,
    ) -> QueryOutcome<Record> {
        self.set_status(Table::Leaves, id.into(), status).await
    }

    #[instrument(name = "db.delete_leave", skip_all)]
    pub async fn delete_leave(&self, id: impl Into<RecordId>) -> QueryOutcome<Value> {
        self.delete_one(Table::Leaves, id.into()).await
    }

    // Excuses

    #[instrument(name = "db.get_all_excuses", skip_all)]
    pub async fn get_all_excuses(&self) -> QueryOutcome<Vec<Record>> {
        self.list_all(Table::Excuses).await
    }

    #[instrument(name = "db.add_excuse", skip_all)]
    pub async fn add_excuse(&self, excuse: Record) -> QueryOutcome<Record> {
        self.insert_one(Table::Excuses, excuse).await
    }

    #[instrument(name = "db.update_excuse_status", skip_all, fields(status = %status))]
    pub async fn update_excuse_status(
        &self,
        id: impl Into<RecordId>,
        status: &str,
    ) -> QueryOutcome<Record> {
        self.set_status(Table::Excuses, id.into(), status).await
    }

    #[instrument(name = "db.delete_excuse", skip_all)]
    pub async fn delete_excuse(&self, id: impl Into<RecordId>) -> QueryOutcome<Value> {
        self.delete_one(Table::Excuses, id.into()).await
    }

    // Overtime

    #[instrument(name = "db.get_all_overtime", skip_all)]
    pub async fn get_all_overtime(&self) -> QueryOutcome<Vec<Record>> {
        self.list_all(Table::Overtime).await
    }

    #[instrument(name = "db.add_overtime", skip_all)]
    pub async fn add_overtime(&self, overtime: Record) -> QueryOutcome<Record> {
        self.insert_one(Table::Overtime, overtime).await
    }

    #[instrument(name = "db.update_overtime_status", skip_all, fields(status = %status))]
    pub async fn update_overtime_status(
        &self,
        id: impl Into<RecordId>,
        status: &str,
    ) -> QueryOutcome<Record> {
        self.set_status(Table::Overtime, id.into(), status).await
    }

    #[instrument(name = "db.delete_overtime", skip_all)]
    pub async fn delete_overtime(&self, id: impl Into<RecordId>) -> QueryOutcome<Value> {
        self.delete_one(Table::Overtime, id.into()).await
    }

    // Penalties

    #[instrument(name = "db.get_all_penalties", skip_all)]
    pub async fn get_all_penalties(&self) -> QueryOutcome<Vec<Record>> {
        self.list_all(Table::Penalties).await
    }

    #[instrument(name = "db.add_penalty", skip_all)]
    pub async fn add_penalty(&self, penalty: Record) -> QueryOutcome<Record> {
        self.insert_one(Table::Penalties, penalty).await
    }

    #[instrument(name = "db.delete_penalty", skip_all)]
    pub async fn delete_penalty(&self, id: impl Into<RecordId>) -> QueryOutcome<Value> {
        self.delete_one(Table::Penalties, id.into()).await
    }

    // Salary details

    /// Lists salary rows. Returns an empty list with an access-denied error,
    /// without contacting the service, when `role` is the limited admin.
    #[instrument(name = "db.get_all_salaries", skip_all, fields(role = %role))]
    pub async fn get_all_salaries(&self, role: &Role) -> QueryOutcome<Vec<Record>> {
        self.list_compensation(Table::SalaryDetails, role).await
    }

    #[instrument(name = "db.add_salary", skip_all)]
    pub async fn add_salary(&self, salary: Record) -> QueryOutcome<Record> {
        self.insert_one(Table::SalaryDetails, salary).await
    }

    #[instrument(name = "db.update_salary", skip_all)]
    pub async fn update_salary(
        &self,
        id: impl Into<RecordId>,
        updates: Record,
    ) -> QueryOutcome<Record> {
        self.update_one(Table::SalaryDetails, id.into(), updates).await
    }

    #[instrument(name = "db.delete_salary", skip_all)]
    pub async fn delete_salary(&self, id: impl Into<RecordId>) -> QueryOutcome<Value> {
        self.delete_one(Table::SalaryDetails, id.into()).await
    }

    // Payroll

    /// Lists payroll rows, gated the same way as [`HrStore::get_all_salaries`].
    #[instrument(name = "db.get_all_payroll", skip_all, fields(role = %role))]
    pub async fn get_all_payroll(&self, role: &Role) -> QueryOutcome<Vec<Record>> {
        self.list_compensation(Table::Payroll, role).await
    }

    #[instrument(name = "db.add_payroll", skip_all)]
    pub async fn add_payroll(&self, payroll: Record) -> QueryOutcome<Record> {
        self.insert_one(Table::Payroll, payroll).await
    }

    #[instrument(name = "db.update_payroll", skip_all)]
    pub async fn update_payroll(
        &self,
        id: impl Into<RecordId>,
        updates: Record,
    ) -> QueryOutcome<Record> {
        self.update_one(Table::Payroll, id.into(), updates).await
    }

    #[instrument(name = "db.delete_payroll", skip_all)]
    pub async fn delete_payroll(&self, id: impl Into<RecordId>) -> QueryOutcome<Value> {
        self.delete_one(Table::Payroll, id.into()).await
    }
}

/// Current time in the millisecond ISO-8601 form stored in `updated_at`.
fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

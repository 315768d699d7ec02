use anyhow::{Context, Result, bail};
use platform_db::{HrStore, QueryOutcome, Record, RecordId, Role, Table};
use serde::Serialize;

pub async fn check(store: &HrStore) -> Result<()> {
    let status = store.test_connection().await;
    print_json(&status)?;
    if !status.success {
        bail!("database connection check failed");
    }
    Ok(())
}

pub async fn list(store: &HrStore, table: Table, role: &Role) -> Result<()> {
    let outcome = match table {
        Table::Employees => store.get_all_employees().await,
        Table::Leaves => store.get_all_leaves().await,
        Table::Excuses => store.get_all_excuses().await,
        Table::Overtime => store.get_all_overtime().await,
        Table::Penalties => store.get_all_penalties().await,
        Table::SalaryDetails => store.get_all_salaries(role).await,
        Table::Payroll => store.get_all_payroll(role).await,
        Table::Users => bail!("users can only be looked up with `login`"),
    };
    report(&outcome)
}

pub async fn login(store: &HrStore, email: &str, password: &str) -> Result<()> {
    report(&store.get_user_by_credentials(email, password).await)
}

pub async fn add(store: &HrStore, table: Table, json: &str) -> Result<()> {
    let record = parse_record(json)?;
    let outcome = match table {
        Table::Employees => store.add_employee(record).await,
        Table::Leaves => store.add_leave(record).await,
        Table::Excuses => store.add_excuse(record).await,
        Table::Overtime => store.add_overtime(record).await,
        Table::Penalties => store.add_penalty(record).await,
        Table::SalaryDetails => store.add_salary(record).await,
        Table::Payroll => store.add_payroll(record).await,
        Table::Users => bail!("adding users is not supported"),
    };
    report(&outcome)
}

pub async fn update(store: &HrStore, table: Table, id: RecordId, json: &str) -> Result<()> {
    let changes = parse_record(json)?;
    let outcome = match table {
        Table::Employees => store.update_employee(id, changes).await,
        Table::SalaryDetails => store.update_salary(id, changes).await,
        Table::Payroll => store.update_payroll(id, changes).await,
        other if other.has_status() => bail!("{other} rows change through `status`"),
        other => bail!("updating {other} is not supported"),
    };
    report(&outcome)
}

pub async fn status(store: &HrStore, table: Table, id: RecordId, status: &str) -> Result<()> {
    let outcome = match table {
        Table::Leaves => store.update_leave_status(id, status).await,
        Table::Excuses => store.update_excuse_status(id, status).await,
        Table::Overtime => store.update_overtime_status(id, status).await,
        other => bail!("{other} rows have no approval status"),
    };
    report(&outcome)
}

pub async fn delete(store: &HrStore, table: Table, id: RecordId) -> Result<()> {
    let outcome = match table {
        Table::Employees => store.delete_employee(id).await,
        Table::Leaves => store.delete_leave(id).await,
        Table::Excuses => store.delete_excuse(id).await,
        Table::Overtime => store.delete_overtime(id).await,
        Table::Penalties => store.delete_penalty(id).await,
        Table::SalaryDetails => store.delete_salary(id).await,
        Table::Payroll => store.delete_payroll(id).await,
        Table::Users => bail!("deleting users is not supported"),
    };
    report(&outcome)
}

fn parse_record(json: &str) -> Result<Record> {
    serde_json::from_str(json).context("expected a JSON object")
}

/// Print the outcome as-is; a service error also fails the command.
fn report<T: Serialize>(outcome: &QueryOutcome<T>) -> Result<()> {
    print_json(outcome)?;
    if let Some(err) = &outcome.error {
        bail!("request failed: {err}");
    }
    Ok(())
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

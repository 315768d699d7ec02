mod commands;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use platform_db::{ClientAccessor, DatabaseSettings, HrStore, RecordId, Role, Table};
use platform_obs::{ObsConfig, init_tracing};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "hr", version, about = "HR records on the hosted database")]
struct Cli {
    /// Role of the caller; `admin_1` may not list salaries or payroll.
    #[arg(long, global = true, env = "HR_ROLE", default_value = "admin")]
    role: Role,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Verify the database is reachable.
    Check,
    /// List every row of a table, newest first.
    List { table: Table },
    /// Look up a user by email and password.
    Login(LoginArgs),
    /// Insert one row given as a JSON object.
    Add { table: Table, json: String },
    /// Apply a JSON object of changes to one row.
    Update {
        table: Table,
        id: RecordId,
        json: String,
    },
    /// Set the approval status of a leave, excuse or overtime request.
    Status {
        table: Table,
        id: RecordId,
        status: String,
    },
    /// Delete one row.
    Delete { table: Table, id: RecordId },
}

#[derive(Args, Debug)]
struct LoginArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "HR_PASSWORD", hide_env_values = true)]
    password: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let _obs = init_tracing(ObsConfig::from_env().with_service_name("hr-cli"))?;
    let cli = Cli::parse();

    let settings = DatabaseSettings::from_env().context("loading database settings")?;
    let client = ClientAccessor::connect(settings)
        .await
        .context("connecting to the HR database")?;
    let store = HrStore::new(Arc::new(client));
    info!(role = %cli.role, "database ready");

    match cli.command {
        Command::Check => commands::check(&store).await,
        Command::List { table } => commands::list(&store, table, &cli.role).await,
        Command::Login(args) => commands::login(&store, &args.email, &args.password).await,
        Command::Add { table, json } => commands::add(&store, table, &json).await,
        Command::Update { table, id, json } => commands::update(&store, table, id, &json).await,
        Command::Status { table, id, status } => {
            commands::status(&store, table, id, &status).await
        }
        Command::Delete { table, id } => commands::delete(&store, table, id).await,
    }
}

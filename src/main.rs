use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use spyne_sql_guard::{FinalizedPlan, GuardConfig, SqlGuard};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sql-guard")]
#[command(about = "Preflight checks for generated SQL")]
struct Cli {
    /// Registry JSON file (or set SQL_GUARD_REGISTRY)
    #[arg(short, long, global = true)]
    registry: Option<PathBuf>,

    /// Comma-separated table allow-list (or set SQL_GUARD_ALLOWED_TABLES)
    #[arg(long, global = true)]
    allowed_tables: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite ambiguous double-quoted tokens
    Normalize { sql: String },

    /// Check for stacked statements, DDL/DML and unbalanced comments
    Scan { sql: String },

    /// Validate a finalized plan against the registry
    Validate {
        /// Finalized plan JSON file
        #[arg(short, long)]
        plan: PathBuf,
        sql: String,
    },

    /// Normalize, scan and validate in one pass
    Check {
        /// Finalized plan JSON file
        #[arg(short, long)]
        plan: PathBuf,
        sql: String,
    },

    /// Classify a database error (plain text or a JSON error object)
    Classify {
        message: String,

        /// Also print repair guidance for this retry attempt
        #[arg(long)]
        attempt: Option<u8>,
    },
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<bool> {
    let cli = Cli::parse();
    let mut config = GuardConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = cli.registry {
        config.registry_path = Some(path);
    }
    if let Some(tables) = cli.allowed_tables {
        config.allowed_tables = Some(spyne_sql_guard::config::parse_table_list(&tables));
    }

    let guard = SqlGuard::from_config(&config)?;
    info!(entities = guard.registry().len(), "SQL guard ready");

    match cli.command {
        Command::Normalize { sql } => {
            println!("{}", guard.normalize(&sql));
            Ok(true)
        }
        Command::Scan { sql } => {
            let result = guard.scan(&sql);
            print_json(&result)?;
            Ok(result.ok)
        }
        Command::Validate { plan, sql } => {
            let plan = read_plan(&plan)?;
            let result = guard.validate(&plan, &sql);
            print_json(&result)?;
            Ok(result.ok)
        }
        Command::Check { plan, sql } => {
            let plan = read_plan(&plan)?;
            let report = guard.preflight(&plan, &sql);
            print_json(&report)?;
            Ok(report.ok)
        }
        Command::Classify { message, attempt } => {
            let error = raw_error(message);
            let classified = guard.classify(&error);
            print_json(&classified)?;
            if let Some(attempt) = attempt {
                println!("{}", guard.recovery_prompt(&error, attempt));
            }
            Ok(true)
        }
    }
}

fn read_plan(path: &Path) -> Result<FinalizedPlan> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan file {}", path.display()))?;
    Ok(FinalizedPlan::from_json(&contents)?)
}

/// JSON error objects are classified by their fields; anything else is plain text
fn raw_error(message: String) -> Value {
    match serde_json::from_str::<Value>(&message) {
        Ok(value) if value.is_object() => value,
        _ => Value::String(message),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

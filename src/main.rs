//! MongoDB backup service
//!
//! Dumps the database once per UTC day into an S3 bucket, on a weekly
//! schedule or on demand over HTTP, and restores a chosen day's archive.

// mongobackup/src/main.rs
mod backup;
mod config;
mod errors;
mod restore;
mod scheduler;
mod server;
mod storage;
mod telemetry;
mod utils;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use backup::BackupOutcome;
use backup::db_dump::ConnectionTarget;
use config::{AuthConfig, BackupSettings, EnvVars, MongoConfig, S3Config, ServerConfig};
use scheduler::WeeklySchedule;
use server::{AppState, JwtAuthority};
use storage::S3Gateway;
use utils::clock::SystemClock;

#[derive(Parser, Debug)]
#[command(name = "mongobackup", version, about = "Daily MongoDB backups to S3")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve POST /mongodump and run the weekly backup schedule
    Serve,
    /// Run today's backup once and exit
    Backup,
    /// Restore the archive of a given day
    Restore {
        /// Day of the archive, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        /// Restore into this connection string instead of the configured cluster
        #[arg(long, env = "RESTORE_TARGET_URI")]
        target_uri: Option<String>,
        /// Drop each collection before restoring it
        #[arg(long)]
        drop: bool,
    },
    /// Print a bearer token for the on-demand trigger
    IssueToken {
        #[arg(long)]
        subject: String,
        /// Defaults to ADMIN_ROLE
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        ttl_days: Option<i64>,
    },
}

/// Main entry point for the backup tool
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let env = EnvVars::from_process();
    telemetry::init(&env);

    let cli = Cli::parse();
    match run_app(cli.command, &env).await {
        Ok(_) => {
            println!("✅ Operation completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app(command: Command, env: &EnvVars) -> Result<()> {
    match command {
        Command::Serve => serve(env).await,
        Command::Backup => {
            println!("🚀 Starting Backup Process...");
            backup_once(env).await
        }
        Command::Restore {
            date,
            target_uri,
            drop,
        } => {
            println!("🔄 Starting Restore Process...");
            restore_day(env, date, target_uri, drop).await
        }
        Command::IssueToken {
            subject,
            role,
            ttl_days,
        } => issue_token(env, &subject, role, ttl_days),
    }
}

async fn serve(env: &EnvVars) -> Result<()> {
    let mongo = MongoConfig::from_env(env)?;
    let s3 = S3Config::from_env(env)?;
    let auth = AuthConfig::from_env(env)?;
    let server_config = ServerConfig::from_env(env)?;
    let settings = BackupSettings::from_env(env)?;
    let schedule: WeeklySchedule = settings
        .schedule
        .parse()
        .with_context(|| format!("Invalid BACKUP_SCHEDULE '{}'", settings.schedule))?;

    let store = Arc::new(S3Gateway::connect(&s3).await);
    let orchestrator = Arc::new(backup::build_orchestrator(&mongo, &settings, store)?);

    let shutdown = CancellationToken::new();
    tokio::spawn(server::cancel_on_signal(shutdown.clone()));
    let scheduler = tokio::spawn(scheduler::run_schedule(
        orchestrator.clone(),
        schedule,
        Arc::new(SystemClock),
        shutdown.clone(),
    ));

    let state = AppState::new(orchestrator, JwtAuthority::new(&auth));
    let served = server::run(&server_config, state, shutdown.clone()).await;

    shutdown.cancel();
    scheduler.await.context("Backup scheduler task panicked")?;
    served
}

async fn backup_once(env: &EnvVars) -> Result<()> {
    let mongo = MongoConfig::from_env(env)?;
    let s3 = S3Config::from_env(env)?;
    let settings = BackupSettings::from_env(env)?;

    let store = Arc::new(S3Gateway::connect(&s3).await);
    let orchestrator = backup::build_orchestrator(&mongo, &settings, store)?;

    match orchestrator.run_daily_backup().await {
        BackupOutcome::Created { key, size_bytes } => {
            println!("✓ Mongo dump created: {} ({} bytes)", key, size_bytes);
            Ok(())
        }
        BackupOutcome::AlreadyExists { key } => {
            println!("✓ Mongo dump already exists for today, all good! ({})", key);
            Ok(())
        }
        BackupOutcome::Failed(err) => Err(err).context("Backup process failed"),
    }
}

async fn restore_day(
    env: &EnvVars,
    date: NaiveDate,
    target_uri: Option<String>,
    drop: bool,
) -> Result<()> {
    let s3 = S3Config::from_env(env)?;
    let settings = BackupSettings::from_env(env)?;
    let target = match target_uri {
        Some(uri) => ConnectionTarget::parse(&uri).context("Invalid --target-uri")?,
        None => MongoConfig::from_env(env)?.connection_target()?,
    };
    println!("Restore target: {}, Date: {}", target, date);

    let store = S3Gateway::connect(&s3).await;
    let request = restore::RestoreRequest { date, target, drop };
    let key = restore::perform_restore(&store, &settings, &request)
        .await
        .context("Restore process failed")?;
    println!("✓ Restored {}", key);
    Ok(())
}

fn issue_token(
    env: &EnvVars,
    subject: &str,
    role: Option<String>,
    ttl_days: Option<i64>,
) -> Result<()> {
    let auth = AuthConfig::from_env(env)?;
    let mut authority = JwtAuthority::new(&auth);
    if let Some(days) = ttl_days {
        anyhow::ensure!(days > 0, "--ttl-days must be positive");
        authority = authority.with_ttl(Duration::days(days));
    }
    let role = role.unwrap_or_else(|| authority.admin_role().to_string());

    let token = authority
        .issue(subject, &role)
        .context("Failed to sign token")?;
    println!("{}", token);
    Ok(())
}

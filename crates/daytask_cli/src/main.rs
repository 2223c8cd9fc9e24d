//! `daytask` command-line entry point.
//!
//! # Responsibility
//! - Wire config, logging, the local store, the optional HTTP remote and
//!   the sync engine.
//! - Render the grouped task board as plain text.

use chrono::{FixedOffset, Utc};
use clap::{Args, Parser, Subcommand};
use daytask_core::db::open_db;
use daytask_core::{
    bucket_label, default_log_level, init_logging, task_line, BoardAction, BoardState,
    ConnectivityMonitor, CoreConfig, HttpRemoteStore, LocalTaskStore, LogNotifier, Notice,
    Notifier, PassMode, ReconcileReport, RemoteTaskStore, RemoteWrite, SqliteTaskStore,
    SyncStatus, TaskSyncEngine,
};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "daytask", about = "Daily tasks that keep working offline", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file; built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Skip the remote store for this run
    #[arg(long, global = true)]
    offline: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a task and sync it if the remote is reachable
    Add(AddArgs),
    /// Reconcile, then show tasks grouped by day
    List,
    /// Run one reconciliation pass and report the outcome
    Sync,
    /// Show pending uploads and the last successful sync, without network
    Status,
    /// Show the signed-in user profile
    Profile,
}

#[derive(Args)]
struct AddArgs {
    /// Task title
    title: String,
    /// Local date and time, e.g. 2024-01-02T09:00
    #[arg(long = "at")]
    date_time: String,
    /// Mark the task as already done
    #[arg(long)]
    done: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = match &cli.config {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };
    if let Some(dir) = &config.logging.dir {
        let level = config
            .logging
            .level
            .as_deref()
            .unwrap_or_else(|| default_log_level());
        init_logging(level, dir)?;
    }

    let offset = config.utc_offset();
    match cli.command {
        Commands::Add(args) => {
            let engine = build_engine(&config, cli.offline)?;
            add(&engine, args, offset).await
        }
        Commands::List => {
            let engine = build_engine(&config, cli.offline)?;
            let report = engine.reconcile().await?;
            print_board(&report, offset);
            Ok(())
        }
        Commands::Sync => {
            let engine = build_engine(&config, cli.offline)?;
            let report = engine.reconcile().await?;
            print_sync_report(&report);
            if let Some(notice) = Notice::for_pending(&report) {
                LogNotifier.notify(&notice);
            }
            Ok(())
        }
        Commands::Status => print_status(&open_local(&config)?),
        Commands::Profile => {
            print_profile(&config);
            Ok(())
        }
    }
}

fn open_local(config: &CoreConfig) -> CliResult<SqliteTaskStore> {
    Ok(SqliteTaskStore::new(open_db(&config.db_path)?))
}

fn build_engine(config: &CoreConfig, offline: bool) -> CliResult<TaskSyncEngine> {
    let local = Arc::new(open_local(config)?);
    let remote: Option<Arc<dyn RemoteTaskStore>> = match config.http_remote() {
        Some(remote_config) if !offline => {
            let store: Arc<dyn RemoteTaskStore> = Arc::new(HttpRemoteStore::new(remote_config)?);
            Some(store)
        }
        _ => None,
    };
    let online = remote.is_some();
    info!(
        "event=cli_start module=cli status=ok remote_configured={} online={}",
        config.http_remote().is_some(),
        online
    );

    Ok(TaskSyncEngine::new(
        local,
        remote,
        Arc::new(ConnectivityMonitor::new(online)),
        config.sync_options(),
    ))
}

async fn add(engine: &TaskSyncEngine, args: AddArgs, offset: FixedOffset) -> CliResult<()> {
    let mut board = BoardState::new(engine.connectivity().is_online());
    board.apply(BoardAction::EditTitle(args.title));
    board.apply(BoardAction::EditDateTime(args.date_time));
    board.apply(BoardAction::SetCompleted(args.done));
    let candidate = board.submit(offset)?;

    let outcome = engine.add_task(candidate).await?;
    match outcome.remote_write {
        RemoteWrite::Inserted => println!("added {}", outcome.task.id),
        RemoteWrite::Duplicate(existing) => {
            println!("already on the server as {existing}; kept one copy")
        }
        RemoteWrite::Deferred => println!(
            "added {} locally; it will sync when the connection is restored",
            outcome.task.id
        ),
    }
    Ok(())
}

fn print_board(report: &ReconcileReport, offset: FixedOffset) {
    let mut board = BoardState::new(report.mode != PassMode::Offline);
    board.apply(BoardAction::TasksLoaded(report.tasks.clone()));

    if board.offline {
        println!("[offline] showing tasks saved on this device");
    }

    let today = Utc::now().with_timezone(&offset).date_naive();
    let groups = board.groups(today, offset);
    if groups.is_empty() {
        println!("No tasks yet.");
    }
    for (key, tasks) in groups.buckets() {
        println!("{}", bucket_label(key, today));
        for task in tasks {
            println!("  {}", task_line(task, key, offset));
        }
    }
    println!("{}", board.sync_status().summary());
}

fn print_sync_report(report: &ReconcileReport) {
    match report.mode {
        PassMode::Offline => println!("offline: nothing was sent"),
        PassMode::RemoteUnreachable => println!("remote unreachable: local tasks kept as-is"),
        PassMode::Online => println!(
            "synced: uploaded {}, failed {}",
            report.uploaded, report.upload_failures
        ),
    }
    if report.local_write_failures > 0 {
        println!(
            "warning: {} task(s) could not be saved locally",
            report.local_write_failures
        );
    }
    println!("{}", SyncStatus::of(&report.tasks).summary());
}

fn print_status(local: &SqliteTaskStore) -> CliResult<()> {
    let tasks = local.get_all()?;
    println!("{}", SyncStatus::of(&tasks).summary());
    match local.last_sync_checkpoint()? {
        Some(at) => println!("last sync: {}", at.to_rfc3339()),
        None => println!("last sync: never"),
    }
    Ok(())
}

fn print_profile(config: &CoreConfig) {
    match config.session() {
        Some(session) => {
            let profile = session.profile_summary();
            println!("name: {}", profile.name);
            println!("email: {}", profile.email);
            println!("user id: {}", profile.user_id);
        }
        None => println!("not signed in: set remote.user_id in the config"),
    }
}

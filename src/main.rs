//! Task list server
//!
//! Serves the task list web UI and JSON API, and provides an interactive
//! shell and an export command over the same store.

use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use tasklist::cache::PageCache;
use tasklist::cli::export::{ExportArgs, Snapshot};
use tasklist::cli::{Cli, Command, shell};
use tasklist::config::Config;
use tasklist::db::Database;
use tasklist::gateway::TaskService;
use tasklist::logging::{self, LogTarget};
use tasklist::view::TaskListView;
use tasklist::web::{self, WebState};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let (mut config, config_path) = Config::load_with_overrides(cli.config.as_deref())?;
    match &config_path {
        Some(path) => info!("Config: {}", path.display()),
        None => info!("Config: built-in defaults"),
    }

    // CLI flags override file and environment
    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    match cli.command {
        Some(Command::Shell) => run_shell(&config).await,
        Some(Command::Export(args)) => run_export(&config, args),
        Some(Command::Serve) | None => run_server(&config).await,
    }
}

fn open_database(config: &Config) -> Result<Arc<Database>> {
    config.ensure_db_dir()?;
    let db = Database::open(&config.server.db_path)?;
    info!("Database: {:?}", config.server.db_path);
    Ok(Arc::new(db))
}

/// Run the HTTP server until Ctrl-C.
async fn run_server(config: &Config) -> Result<()> {
    info!("Starting tasklist v{}", env!("CARGO_PKG_VERSION"));

    let db = open_database(config)?;
    let cache = Arc::new(PageCache::new());
    let service = TaskService::new(db).with_invalidator(cache.clone());
    let state = WebState::new(Arc::new(service), cache);

    let handle = web::start_server(state, &config.bind_addr()).await?;
    info!("Listening on {}; press Ctrl-C to stop", handle.addr());

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
    }
    info!("Shutdown requested");
    handle.shutdown().await;

    Ok(())
}

/// Run the interactive shell on stdin/stdout.
async fn run_shell(config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let mut view = TaskListView::new(TaskService::new(db));
    if let Err(e) = view.load().await {
        anyhow::bail!("Failed to load tasks: {}", e);
    }

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    shell::run(&mut view, stdin, &mut stdout).await
}

/// Run the export command
fn run_export(config: &Config, args: ExportArgs) -> Result<()> {
    let db = open_database(config)?;
    let snapshot = Snapshot::new(db.list_tasks()?, args.filter);
    let json_output = snapshot.to_json_pretty()?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &json_output)?;
        eprintln!("Exported {} tasks to {}", snapshot.tasks.len(), path.display());
    } else {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", json_output)?;
    }

    Ok(())
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use habitd::{config::HabitdConfig, rest, storage::Storage, AppContext};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "habitd",
    about = "habitd — habit tracking daemon with a streak & statistics engine",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// REST API port
    #[arg(long, env = "HABITD_PORT")]
    port: Option<u16>,

    /// Data directory for the config file and SQLite database
    #[arg(long, env = "HABITD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "HABITD_LOG")]
    log: Option<String>,

    /// Bind address for the REST server (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "HABITD_BIND")]
    bind_address: Option<String>,

    /// API key required in the X-API-Key header (unset = open access)
    #[arg(long, env = "HABITD_API_KEY")]
    api_key: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "HABITD_LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the daemon server (default when no subcommand given).
    ///
    /// Runs habitd in the foreground.
    ///
    /// Examples:
    ///   habitd serve
    ///   habitd
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    match &args.command {
        Some(Command::Serve) | None => serve(args).await,
    }
}

async fn serve(args: Args) -> Result<()> {
    let config = HabitdConfig::new(
        args.port,
        args.data_dir,
        args.log,
        args.bind_address,
        args.api_key,
    );

    // The appender guard must live until exit or buffered lines are lost.
    let _log_guard = init_tracing(&config.log, args.log_file.as_deref());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %config.data_dir.display(),
        "starting habitd"
    );

    let storage = Arc::new(
        Storage::new_with_slow_query(&config.data_dir, config.slow_query_threshold_ms).await?,
    );

    let ctx = Arc::new(AppContext::new(Arc::new(config), storage));
    rest::start_rest_server(ctx).await
}

fn init_tracing(
    log: &str,
    log_file: Option<&Path>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_new(log).unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let file = path.file_name().map(|f| f.to_os_string()).unwrap_or_else(|| "habitd.log".into());
            let appender = tracing_appender::rolling::daily(dir, file);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

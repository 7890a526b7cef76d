use std::fs::File;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use dota_graph::{Storage, StorageError};
use dota_server::{net, Config};
use tokio::signal::unix::{signal, SignalKind};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// A small file-backed property graph server.
#[derive(Parser, Debug)]
#[command(name = "dota-server")]
struct Cli {
    /// Path to the backing storage file. Opened if it exists and carries a
    /// valid signature; created and initialized otherwise.
    path: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = match Config::from_env(cli.path.display().to_string()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    tracing::info!(db_path = %config.database.path, "starting server");

    match run(config).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            tracing::error!(error = %e, "fatal error");
            std::process::exit(exit_code_for(&e));
        }
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let storage = open_or_init(&config.database.path)?;
    tracing::info!(path = %config.database.path, "storage ready");

    let listener = net::bind(config.server.port)?;
    tracing::info!(port = config.server.port, "listening");

    let shutdown = Arc::new(AtomicBool::new(false));
    install_signal_handlers(shutdown.clone());

    net::serve(listener, storage, shutdown).await?;
    tracing::info!("shutting down");
    Ok(())
}

/// Opens `path` if it exists and carries a valid signature, else creates and
/// initializes it, mirroring `storage_open`/`storage_init`'s fallback.
fn open_or_init(path: &str) -> anyhow::Result<Storage> {
    match File::options().read(true).write(true).open(path) {
        Ok(file) => Ok(Storage::open(file)?),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let file = File::options()
                .read(true)
                .write(true)
                .create(true)
                .open(path)?;
            Ok(Storage::init(file)?)
        }
        Err(e) => Err(e.into()),
    }
}

fn install_signal_handlers(shutdown: Arc<AtomicBool>) {
    tokio::spawn(async move {
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGINT handler");
                return;
            }
        };
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };

        tokio::select! {
            _ = sigint.recv() => tracing::info!("received SIGINT"),
            _ = sigterm.recv() => tracing::info!("received SIGTERM"),
        }
        shutdown.store(true, Ordering::SeqCst);
    });
}

/// The C reference server exits with `errno` on fatal startup failure; we
/// reuse the underlying `io::Error`'s raw OS error where one is available.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(io_err) = cause.downcast_ref::<std::io::Error>() {
            if let Some(code) = io_err.raw_os_error() {
                return code;
            }
        }
        if let Some(StorageError::Io(io_err)) = cause.downcast_ref::<StorageError>() {
            if let Some(code) = io_err.raw_os_error() {
                return code;
            }
        }
    }
    1
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}

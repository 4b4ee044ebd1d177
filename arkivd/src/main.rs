use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arkiv_engine::{
    ArchiveStore, CommandFetcher, Coordinator, FetchRegistry, FetcherConfig, HttpFetcher,
    PathResolver, ProbeResolver,
};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli;
mod config;
mod error;
mod server;

use cli::Args;
use config::AppConfig;
use error::AppError;
use server::AppState;

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet)?;

    let mut config = AppConfig::load(args.config.as_deref())?;
    config.apply_args(&args);

    info!("arkiv - on-demand media archiver");
    info!(
        listen = %config.listen,
        archive_dir = %config.archive_dir.display(),
        "starting"
    );

    // The original deployment refuses to run without its session cookies;
    // failing here beats discovering it on the first authenticated fetch.
    if let Some(cookies) = &config.cookies_file {
        if !cookies.exists() {
            return Err(AppError::Initialization(format!(
                "cookies file missing: {}",
                cookies.display()
            )));
        }
    }

    let store = ArchiveStore::new(&config.archive_dir);
    store.ensure_root().await?;
    let registry = Arc::new(FetchRegistry::new());

    let mut fetcher_config = FetcherConfig::builder()
        .with_timeout(Duration::from_secs(config.timeout))
        .with_connect_timeout(Duration::from_secs(config.connect_timeout));
    if let Some(user_agent) = &config.user_agent {
        fetcher_config = fetcher_config.with_user_agent(user_agent);
    }
    if let Some(cookies) = &config.cookies_file {
        fetcher_config = fetcher_config.with_cookies_file(cookies);
    }
    let http_fetcher = HttpFetcher::new(&fetcher_config.build())?;

    let mut command_fetcher = CommandFetcher::ytdlp(&config.downloader_program);
    if let Some(cookies) = &config.cookies_file {
        command_fetcher = command_fetcher.with_cookies_file(cookies);
    }

    let media = Arc::new(Coordinator::new(
        Arc::new(ProbeResolver::ytdlp(&config.probe_program)),
        Arc::new(command_fetcher),
        Arc::clone(&registry),
        store.clone(),
    ));
    let direct = Arc::new(Coordinator::new(
        Arc::new(PathResolver),
        Arc::new(http_fetcher),
        registry,
        store,
    ));

    let state = AppState {
        media,
        direct,
        allow_list: Arc::new(config.allow_list.clone()),
    };
    let app = server::router(state, config.archive_dir.clone());

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) -> Result<(), AppError> {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .map_err(|e| AppError::Initialization(e.to_string()))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}

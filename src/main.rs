use clap::Parser;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

use smart_clicker::cli::{App, Cli};
use smart_clicker::config::EngineConfig;
use smart_clicker::AppError;

const DEFAULT_FILTER: &str = "smart_clicker=info,warn";
const DEBUG_FILTER: &str = "smart_clicker=debug,warn";

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG wins over --debug
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.debug { DEBUG_FILTER } else { DEFAULT_FILTER }));
    let (filter, filter_handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Stopping automation...");
            flag.store(true, Ordering::SeqCst);
        }
        // a second interrupt does not wait for the action in flight
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted again, exiting");
            std::process::exit(130);
        }
    });

    let engine = EngineConfig::from_env();
    let mut app = App::new(cli, engine, cancel).with_debug_switch(Box::new(move || {
        if let Err(e) = filter_handle.modify(|filter| *filter = EnvFilter::new(DEBUG_FILTER)) {
            tracing::warn!("Could not raise log level: {}", e);
        }
    }));

    // Desktop and OCR calls block, keep them off the runtime workers
    match tokio::task::spawn_blocking(move || app.execute()).await {
        Ok(Ok(true)) => ExitCode::SUCCESS,
        Ok(Ok(false)) => ExitCode::FAILURE,
        Ok(Err(AppError::UserCancelled)) => {
            tracing::info!("Cancelled by user");
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            tracing::error!(kind = e.kind(), "{}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("Worker thread failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

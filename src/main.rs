//! spa-devd: local development server for single-page apps.
//!
//! # Architecture Overview
//!
//! ```text
//!   bind discovery ──▶ TcpListener ──▶ DevServer ──▶ HandlerRegistry ──▶ mux
//!                                                        ▲
//!                                                        │ set()
//!   ReloadSupervisor ── build ── watch ── rebuild ───────┘
//!          │
//!          └── task errors ──▶ ErrorSink ──▶ exit status
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use spa_devd::cli::Cli;
use spa_devd::config::{load_or_default, DevConfig};
use spa_devd::discovery::{BindEnv, BindResolver};
use spa_devd::lifecycle::{apply_arguments, bind_listener, spawn_signal_handler, Shutdown};
use spa_devd::observability::logging;
use spa_devd::reload::{forward, ErrorSink, TaskError};
use spa_devd::{AppBuilder, DevError, DevServer, HandlerRegistry, ReloadSupervisor};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref());

    let configured = config
        .as_ref()
        .ok()
        .map(|c| c.observability.log_level.as_str());
    logging::init(&cli.log_level(configured));

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "spa-devd failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: DevConfig) -> Result<(), DevError> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "spa-devd starting");

    let mappings = apply_arguments(&cli.args)?;
    let builder = AppBuilder::new(mappings, config.serve.clone())?;

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());
    let sink = ErrorSink::spawn();

    let resolver = BindResolver::new(config.bind.clone(), BindEnv::from_env());
    let Some(bind) = resolver.resolve(&shutdown.token()).await else {
        tracing::info!("Shutdown before a listen address was chosen");
        sink.close().await;
        return Ok(());
    };

    let listener = bind_listener(&bind).await?;
    tracing::info!(address = %bind.address, "listening on: http://{}/", bind.host);

    let registry = Arc::new(HandlerRegistry::new());
    let server = DevServer::new(registry.clone());
    let server_task = tokio::spawn({
        let token = shutdown.token();
        let errors = sink.sender();
        async move {
            if let Err(e) = server.run(listener, token.clone()).await {
                forward(&errors, TaskError::new("http", e)).await;
                token.cancel();
            }
        }
    });

    let supervisor = ReloadSupervisor::new(registry, builder, config.watch.clone());
    let outcome = supervisor.run(shutdown.token(), sink.sender()).await;
    if outcome.is_err() {
        shutdown.trigger();
    }

    if let Err(e) = server_task.await {
        tracing::error!(error = %e, "HTTP server task failed");
    }
    let reported = sink.close().await;

    outcome?;
    if !reported.is_empty() {
        return Err(DevError::Reported(reported.len()));
    }
    Ok(())
}

//! `serve` command implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use standalone::Standalone;

use crate::cli::ServeArgs;
use crate::error::CliError;
use crate::server::{router, ServerState};

/// Execute the `serve` command
pub async fn run_serve(args: &ServeArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");
    let mut config = super::load_config(&args.config)?;

    // Apply CLI overrides
    if let Some(listen) = args.listen {
        info!(%listen, "Overriding listen address from CLI");
        config.server.listen = listen;
    }
    if let Some(enabled) = args.system_actions {
        info!(enabled, "Overriding system actions switch from CLI");
        config.security.system_actions_enabled = enabled;
    }

    info!(
        application = %config.application.name,
        mode = ?config.collector.mode,
        listen = %config.server.listen,
        path = %config.server.path,
        system_actions = config.security.system_actions_enabled,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        return Ok(());
    }

    let standalone = Standalone::from_config(&config).context("Failed to assemble console")?;
    let state = Arc::new(ServerState::new(standalone.clone()));
    let app = router(state.clone(), &config.server.path);

    let collect_task = (!standalone.dispatcher.mode().is_collector_server()).then(|| {
        let standalone = standalone.clone();
        let period = Duration::from_secs(config.collector.collect_interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let standalone = standalone.clone();
                if let Err(e) = tokio::task::spawn_blocking(move || standalone.collect()).await {
                    warn!(error = %e, "Collection pass failed");
                }
            }
        })
    });

    let listener = tokio::net::TcpListener::bind(config.server.listen)
        .await
        .map_err(|source| CliError::Bind {
            listen: config.server.listen,
            source,
        })?;
    info!(
        "Monitoring console listening on http://{}{}",
        config.server.listen, config.server.path
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    warn!("Received shutdown signal, stopping console...");
    if let Some(task) = collect_task {
        task.abort();
    }

    let runtime = standalone.runtime_informations();
    let storage = config.storage.directory.clone();
    let dispatcher = standalone.dispatcher.clone();
    tokio::task::spawn_blocking(move || {
        dispatcher.write_html_to_last_shutdown_file(&storage, &runtime)
    })
    .await
    .context("Last shutdown report task failed")?;

    let summary = state
        .stats
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .summary();
    println!("{summary}");

    info!(metrics = ?standalone.dispatcher.metrics(), "Melody console finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

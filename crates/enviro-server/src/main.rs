//! enviro-server: samples the station's sensors in the background and serves
//! the saved per-interval averages over HTTP.
//!
//! Logging goes through `env_logger`; set `RUST_LOG=debug` to see every tick.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{error, info};
use tokio::net::TcpListener;

use enviro_core::{AggregateStore, Sampler, Shutdown, ShutdownListener};
use enviro_server::cli::Args;
use enviro_server::http;
use enviro_server::simulated::SimulatedSensors;

/// Resolves on Ctrl-C, or as soon as anything else triggers shutdown.
async fn shutdown_signal(mut listener: ShutdownListener) {
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                error!("Failed to listen for Ctrl-C: {e}");
            }
            info!("Received Ctrl-C, shutting down");
        }
        _ = listener.triggered() => {}
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args
        .resolve_config()
        .await
        .context("failed to load configuration")?;

    let store = AggregateStore::local(&config.storage.data_dir);
    store
        .ensure_dir()
        .await
        .context("failed to create data directory")?;
    info!("Data directory: {}", store.dir().display());

    let shutdown = Arc::new(Shutdown::new());

    let sampler_task = if config.sampling.enabled {
        let sensors = SimulatedSensors::new(config.sampling.sample_interval_secs)
            .with_particulate_faults(args.pm_fault_every);
        let mut sampler = Sampler::new(
            sensors,
            store.clone(),
            &config.sampling,
            shutdown.listener(),
        );
        let shutdown = Arc::clone(&shutdown);

        Some(tokio::spawn(async move {
            let result = sampler.run().await;
            // A dead sampler takes the rest of the process down with it.
            shutdown.trigger();
            result
        }))
    } else {
        None
    };

    if config.server.enabled {
        let addr = config.server.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind to {addr}"))?;
        info!("Serving on http://{addr}");

        axum::serve(listener, http::routes(store))
            .with_graceful_shutdown(shutdown_signal(shutdown.listener()))
            .await
            .context("HTTP server failed")?;
    } else {
        shutdown_signal(shutdown.listener()).await;
    }

    shutdown.trigger();

    if let Some(task) = sampler_task {
        info!("Closing background sampler");
        task.await
            .context("sampler task panicked")?
            .context("sampler failed")?;
    }

    info!("Bye");
    Ok(())
}

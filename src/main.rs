//! # Task Relay - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor. Lee la configuración (CLI + env),
//! arranca los workers y el thread de limpieza, y atiende conexiones.

use clap::Parser;
use std::process;
use std::sync::Arc;
use task_relay::config::Config;
use task_relay::processor::SimulatedProcessor;
use task_relay::server::Server;
use task_relay::tasks::{Reaper, TaskService};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("task_relay=info")),
        )
        .init();

    let config = Config::parse();

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "invalid configuration");
        process::exit(1);
    }
    config.log_summary();

    let processor = Arc::new(SimulatedProcessor::new(config.simulate_delay()));
    let (service, pool) = match TaskService::with_worker_pool(config.workers, processor) {
        Ok(started) => started,
        Err(e) => {
            tracing::error!(error = %e, "failed to start worker pool");
            process::exit(1);
        }
    };

    let _reaper = match Reaper::start(
        Arc::clone(service.registry()),
        config.retention(),
        config.sweep_interval(),
    ) {
        Ok(reaper) => reaper,
        Err(e) => {
            tracing::error!(error = %e, "failed to start result reaper");
            process::exit(1);
        }
    };

    let server = match Server::bind(&config, Arc::new(service)) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!(error = %e, "server error");
        pool.shutdown();
        process::exit(1);
    }

    pool.shutdown();
}

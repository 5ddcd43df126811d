//! mulepool CLI: runs the inference front-end and its worker pool.

use clap::{Parser, Subcommand};
use mulepool::config::Config;
use mulepool::engine::Engine;
use mulepool::predictor::EchoPredictor;
use mulepool::server;
use mulepool::telemetry::{TelemetryConfig, init_telemetry};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "mulepool", about = "Inference front-end backed by a worker pool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server and workers
    Serve {
        /// Address to bind (overrides MULEPOOL_BIND)
        #[arg(long)]
        bind: Option<SocketAddr>,
        /// Number of workers (overrides MULEPOOL_WORKERS)
        #[arg(long)]
        workers: Option<usize>,
        /// Per-request wait limit in milliseconds (overrides MULEPOOL_REQUEST_TIMEOUT_MS)
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Seconds to let workers drain the queue on shutdown
        #[arg(long, default_value_t = 10)]
        grace_secs: u64,
    },
    /// Print the effective configuration and exit
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    match cli.command {
        Command::Serve {
            bind,
            workers,
            timeout_ms,
            grace_secs,
        } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            if let Some(workers) = workers {
                anyhow::ensure!(workers > 0, "--workers must be at least 1");
                config.workers = workers;
            }
            if let Some(ms) = timeout_ms {
                config.request_timeout = Duration::from_millis(ms);
            }
            cmd_serve(config, Duration::from_secs(grace_secs)).await
        }
        Command::Config => {
            println!("{config:#?}");
            Ok(())
        }
    }
}

async fn cmd_serve(config: Config, grace: Duration) -> anyhow::Result<()> {
    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "mulepool".to_string(),
        log_level: config.log_level.clone(),
    })?;

    tracing::info!(
        workers = config.workers,
        timeout_ms = config.request_timeout.as_millis() as u64,
        "starting mulepool"
    );

    let engine = Engine::start(&config, Arc::new(EchoPredictor));
    let router = server::router(&engine);
    let listener = TcpListener::bind(config.bind).await?;

    server::serve(listener, router, async {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("shutdown requested");
    })
    .await?;

    engine.shutdown(grace).await;
    Ok(())
}

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use gaia_core::{Config, ScoringEngine};
use gaia_prometheus_bridge::GaiaMetrics;
use gaia_service::{logging, modes, routes, shutdown, AppState};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "gaia", version, about = "GAIA threat and consciousness scoring service")]
struct Cli {
    /// JSON engine config; defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API.
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
    },
    /// Run the built-in self checks and print a JSON report.
    Test,
    /// Drive random samples through the engine and print throughput figures.
    Benchmark {
        #[arg(long, default_value_t = 1000)]
        cycles: u64,
        /// Seed for reproducible sample streams.
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(p) => Config::load(p).with_context(|| format!("loading {}", p.display())),
        None => Ok(Config::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.json_logs);

    let config = load_config(cli.config.as_ref())?;
    let engine = Arc::new(ScoringEngine::new(config).context("building scoring engine")?);

    match cli.command {
        Command::Serve { addr } => {
            let metrics = Arc::new(GaiaMetrics::new().context("registering metrics")?);
            let api = routes(AppState::new(engine, metrics));
            let (bound, server) = warp::serve(api)
                .try_bind_with_graceful_shutdown(
                    addr,
                    shutdown::on_signal(tokio::signal::ctrl_c()),
                )
                .with_context(|| format!("binding {addr}"))?;
            info!(%bound, "gaia listening");
            server.await;
            info!("gaia stopped");
        }
        Command::Test => {
            let report = modes::run_self_test(&engine);
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.passed() {
                anyhow::bail!(
                    "{} of {} self checks failed",
                    report.summary.failed,
                    report.summary.total_tests
                );
            }
        }
        Command::Benchmark { cycles, seed } => {
            info!(cycles, ?seed, "benchmark started");
            let report = modes::run_benchmark(&engine, cycles, seed);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

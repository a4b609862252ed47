//! latency-recorder - per-endpoint latency recording demo
//!
//! Drives a registry of per-tag recorders with synthetic load and runs the
//! window reporter on a fixed interval, logging each window's distribution.
//!
//! Module structure:
//! - `recorder/` - Recorders, counter store, snapshot extraction, registry
//! - `services/` - Reporter and load generator
//! - `infra/` - Config and errors

use clap::Parser;
use latency_recorder::infra::Config;
use latency_recorder::recorder::Recorders;
use latency_recorder::services::reporter::now_millis;
use latency_recorder::services::{load_generator, LoadProfile, Reporter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Latency recorder - per-millisecond request latency distributions
#[derive(Parser, Debug)]
#[command(name = "latency-recorder", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, env = "CONFIG_FILE", default_value = "config/dev.toml")]
    config: String,

    /// Stop after this many seconds (0 runs until Ctrl+C)
    #[arg(short, long, default_value_t = 0)]
    duration_secs: u64,

    /// Also print every window snapshot to stdout as a JSON line
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "latency-recorder starting");

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        mode = config.recorder_mode().as_str(),
        threshold_ms = config.most_time_threshold_ms(),
        out_threshold_count = config.out_threshold_count(),
        decay_ratio = config.decay_ratio(),
        interval_secs = config.metrics_interval_secs(),
        workers = config.load_workers(),
        tags = ?config.load_tags(),
        "config_loaded"
    );

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let registry = Arc::new(Recorders::new(config.recorder_settings()));
    let running = Arc::new(AtomicBool::new(true));
    let workers = load_generator::run(registry.clone(), LoadProfile::from_config(&config), running.clone());

    let mut reporter = Reporter::new();
    reporter.open_window(&registry, now_millis());

    // Handle shutdown on Ctrl+C
    let ctrl_c_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = ctrl_c_tx.send(true);
    });

    if args.duration_secs > 0 {
        let deadline_tx = shutdown_tx;
        let duration = Duration::from_secs(args.duration_secs);
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = deadline_tx.send(true);
        });
    }

    let mut interval = tokio::time::interval(Duration::from_secs(config.metrics_interval_secs()));
    // First tick fires immediately; the first window closes one interval from now
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                report(&mut reporter, &registry, args.json)?;
            }
            _ = shutdown_rx.changed() => break,
        }
    }

    running.store(false, Ordering::Relaxed);
    let recorded: u64 = workers.into_iter().filter_map(|h| h.join().ok()).sum();

    // Flush the partial window so no recorded sample goes unreported
    report(&mut reporter, &registry, args.json)?;

    info!(recorded, "latency-recorder shutdown complete");
    Ok(())
}

fn report(reporter: &mut Reporter, registry: &Recorders, json: bool) -> anyhow::Result<()> {
    for snapshot in reporter.run_window(registry, now_millis()) {
        snapshot.log();
        if json {
            println!("{}", snapshot.to_json_line()?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_arg_defaults_to_dev_toml() {
        if std::env::var_os("CONFIG_FILE").is_some() {
            return;
        }
        let args = Args::try_parse_from(["latency-recorder"]).unwrap();
        assert_eq!(args.config, "config/dev.toml");
        assert_eq!(args.duration_secs, 0);
        assert!(!args.json);
    }

    #[test]
    fn test_config_arg_from_command_line() {
        let args = Args::try_parse_from(["latency-recorder", "--config", "config/prod.toml"]).unwrap();
        assert_eq!(args.config, "config/prod.toml");

        let args = Args::try_parse_from(["latency-recorder", "--config=config/bench.toml", "--json"]).unwrap();
        assert_eq!(args.config, "config/bench.toml");
        assert!(args.json);
    }
}

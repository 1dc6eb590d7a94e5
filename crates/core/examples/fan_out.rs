//! Fan-out Example
//!
//! Pushes a burst of simulated downloads through an eager queue and a serial
//! queue, logging admissions and completions as they happen.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p taskgate-core --example fan_out
//! TASKGATE_LOG_FORMAT=json RUST_LOG=taskgate_core=debug cargo run -p taskgate-core --example fan_out
//! ```

use std::time::{Duration, Instant};

use anyhow::Result;
use taskgate_core::{Batcher, TaskError};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DOWNLOADS: u64 = 12;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    info!("Taskgate v{} fan-out example", taskgate_core::VERSION);

    // 1. Eager queue: up to 4 downloads in flight
    let eager = Batcher::eager_queue(None)?;
    let started = Instant::now();

    let mut submissions = Vec::new();
    for n in 0..DOWNLOADS {
        submissions.push(eager.submit(move || download(n))?);
        info!(
            download = n,
            active = eager.active_size(),
            waiting = eager.waiting_size(),
            "Submitted"
        );
    }

    for (n, submission) in submissions.into_iter().enumerate() {
        match submission.await {
            Ok(bytes) => info!(download = n, bytes, "Finished"),
            Err(TaskError::Failed(reason)) => info!(download = n, %reason, "Failed"),
            Err(e) => info!(download = n, error = %e, "Did not run"),
        }
    }
    info!(elapsed_ms = started.elapsed().as_millis() as u64, "Eager queue drained");

    // 2. Serial queue: one at a time, in order
    let serial = Batcher::serial_queue();
    let started = Instant::now();
    let firsts: Vec<_> = (0..3)
        .map(|n| serial.submit(move || download(n)))
        .collect::<Result<_, _>>()?;
    for submission in firsts {
        let _ = submission.await;
    }
    info!(elapsed_ms = started.elapsed().as_millis() as u64, "Serial queue drained");

    Ok(())
}

/// Simulated download; every fifth one fails
async fn download(n: u64) -> std::result::Result<u64, String> {
    tokio::time::sleep(Duration::from_millis(20 + (n % 4) * 15)).await;
    if n % 5 == 4 {
        return Err(format!("mirror {} unreachable", n));
    }
    Ok(1024 * (n + 1))
}

fn init_logging() -> Result<()> {
    let log_format = std::env::var("TASKGATE_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("taskgate_core=debug,fan_out=info"))?;

    match log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .try_init()?,
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty())
            .try_init()?,
    }
    Ok(())
}

//! `ctxreq soak <url>` – many concurrent budget-bound requests.
//!
//! Useful against a throttling endpoint: every request must finish (or give
//! up) inside its own budget, however hard the server pushes back.

use anyhow::Result;
use ctxreq_core::config::ClientConfig;
use ctxreq_core::{execute_async, Client, ExecContext, RequestError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

use super::build_request;
use crate::cli::RequestArgs;

/// Outcome counters for the summary line.
#[derive(Debug, Default)]
struct Tally {
    ok: usize,
    budget: usize,
    status: usize,
    transport: usize,
    other: usize,
    slowest: Duration,
}

impl Tally {
    fn record(&mut self, res: &Result<(), RequestError>, elapsed: Duration) {
        self.slowest = self.slowest.max(elapsed);
        match res {
            Ok(()) => self.ok += 1,
            Err(e) if e.is_budget_error() => self.budget += 1,
            Err(RequestError::Status { .. }) => self.status += 1,
            Err(RequestError::Transport(_)) => self.transport += 1,
            Err(_) => self.other += 1,
        }
    }
}

pub async fn run_soak(
    cfg: &ClientConfig,
    args: &RequestArgs,
    iterations: usize,
    concurrency: usize,
) -> Result<()> {
    let client = Client::new(cfg);
    let budget = args.budget(cfg);
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = Vec::with_capacity(iterations);

    for i in 0..iterations {
        let permit = Arc::clone(&permits).acquire_owned().await?;
        let ctx = ExecContext::with_timeout(budget);
        let req = build_request(&client, &ctx, args)?;
        tasks.push(tokio::spawn(async move {
            let start = Instant::now();
            let out = execute_async(ctx, req).await;
            drop(permit);
            let elapsed = start.elapsed();
            match &out {
                Ok((req, Err(e))) => {
                    tracing::info!(i, attempts = req.attempt_count(), error = %e, "request failed")
                }
                Ok((req, Ok(()))) => {
                    tracing::debug!(i, attempts = req.attempt_count(), "request ok")
                }
                Err(e) => tracing::warn!(i, "request task failed: {:#}", e),
            }
            (out.map(|(_, res)| res), elapsed)
        }));
    }

    let mut tally = Tally::default();
    for task in tasks {
        let (out, elapsed) = task.await?;
        tally.record(&out?, elapsed);
    }

    println!(
        "ok={} budget={} status={} transport={} other={} slowest={}ms (budget {}ms)",
        tally.ok,
        tally.budget,
        tally.status,
        tally.transport,
        tally.other,
        tally.slowest.as_millis(),
        budget.as_millis()
    );
    Ok(())
}

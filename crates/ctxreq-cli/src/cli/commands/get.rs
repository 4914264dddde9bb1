//! `ctxreq get <url>` – one request within a time budget.

use anyhow::Result;
use ctxreq_core::config::ClientConfig;
use ctxreq_core::{execute_async, Client, ExecContext};
use std::time::Instant;

use super::build_request;
use crate::cli::RequestArgs;

pub async fn run_get(cfg: &ClientConfig, args: &RequestArgs) -> Result<()> {
    let client = Client::new(cfg);
    let ctx = ExecContext::with_timeout(args.budget(cfg));
    let req = build_request(&client, &ctx, args)?;

    let start = Instant::now();
    let (req, res) = execute_async(ctx, req).await?;
    let elapsed = start.elapsed();
    tracing::info!(
        url = %args.url,
        attempts = req.attempt_count(),
        elapsed_ms = elapsed.as_millis() as u64,
        ok = res.is_ok(),
        "get finished"
    );
    res?;

    if let Some(resp) = req.response() {
        eprintln!(
            "status: {} ({} attempt(s), {}ms)",
            resp.status(),
            req.attempt_count(),
            elapsed.as_millis()
        );
        for line in resp.headers().iter().skip(1) {
            eprintln!("{}", line);
        }
        print!("{}", resp.text());
    }
    Ok(())
}

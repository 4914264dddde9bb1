//! Async embedding: run `execute` on tokio's blocking pool.

use anyhow::{Context, Result};

use crate::context::ExecContext;
use crate::error::RequestError;
use crate::request::Request;

/// Execute `req` under `ctx` without blocking the async runtime. Hands the
/// request back together with its outcome. Fails only if the blocking task
/// panicked or was cancelled.
pub async fn execute_async(
    ctx: ExecContext,
    mut req: Request,
) -> Result<(Request, Result<(), RequestError>)> {
    tokio::task::spawn_blocking(move || {
        let res = super::execute(&ctx, &mut req);
        (req, res)
    })
    .await
    .context("execute task failed")
}

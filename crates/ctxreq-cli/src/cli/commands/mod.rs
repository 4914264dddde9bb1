//! CLI command handlers. Each command is in its own file.

mod config;
mod get;
mod pages;
mod soak;

pub use config::run_config;
pub use get::run_get;
pub use pages::run_pages;
pub use soak::run_soak;

use anyhow::{bail, Result};
use ctxreq_core::{Client, ExecContext, Request};

use super::RequestArgs;

/// Build the request described by `args`, gated by `ctx`.
pub(crate) fn build_request(
    client: &Client,
    ctx: &ExecContext,
    args: &RequestArgs,
) -> Result<Request> {
    let mut req = client.request_in(ctx, args.method.into(), args.url.clone());
    for raw in &args.headers {
        let Some((name, value)) = raw.split_once(':') else {
            bail!("invalid header {:?}: expected \"Name: value\"", raw);
        };
        req = req.with_header(name.trim(), value.trim());
    }
    Ok(req)
}

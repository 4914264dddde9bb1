//! `ctxreq pages <url>` – walk a paginated listing under one budget.

use anyhow::{Context, Result};
use ctxreq_core::config::ClientConfig;
use ctxreq_core::{execute_paginated, Client, ExecContext, Paginator};

use super::build_request;
use crate::cli::RequestArgs;

pub async fn run_pages(
    cfg: &ClientConfig,
    args: &RequestArgs,
    token_param: &str,
    next_token: &str,
    max_pages: Option<usize>,
) -> Result<()> {
    let client = Client::new(cfg);
    let ctx = ExecContext::with_timeout(args.budget(cfg));
    let mut req = build_request(&client, &ctx, args)?
        .with_paginator(Paginator::new(token_param, next_token));

    let pages = tokio::task::spawn_blocking(move || {
        let mut pages = 0usize;
        let res = execute_paginated(&ctx, &mut req, |resp, last| {
            pages += 1;
            println!("{}", resp.text());
            tracing::debug!(page = pages, last, "page received");
            max_pages.map_or(true, |max| pages < max)
        });
        res.map(|()| pages)
    })
    .await
    .context("pages task join")??;

    eprintln!("{} page(s)", pages);
    Ok(())
}

//! CLI for deadline-bound HTTP requests.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use ctxreq_core::config::{self, ClientConfig};
use ctxreq_core::Method;
use std::time::Duration;

use commands::{run_config, run_get, run_pages, run_soak};

/// Top-level CLI for ctxreq.
#[derive(Debug, Parser)]
#[command(name = "ctxreq")]
#[command(about = "ctxreq: HTTP requests bound to a time budget", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Options shared by every command that sends requests.
#[derive(Debug, Clone, Args)]
pub struct RequestArgs {
    /// Target URL.
    pub url: String,

    /// Time budget for the whole call in milliseconds (default from config).
    #[arg(long, value_name = "MS")]
    pub budget_ms: Option<u64>,

    /// Extra request header, "Name: value". May be repeated.
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    pub headers: Vec<String>,

    /// HTTP method.
    #[arg(short = 'X', long, value_enum, default_value_t = CliMethod::Get)]
    pub method: CliMethod,
}

impl RequestArgs {
    pub fn budget(&self, cfg: &ClientConfig) -> Duration {
        self.budget_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| cfg.default_budget())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl From<CliMethod> for Method {
    fn from(m: CliMethod) -> Self {
        match m {
            CliMethod::Get => Method::Get,
            CliMethod::Head => Method::Head,
            CliMethod::Post => Method::Post,
            CliMethod::Put => Method::Put,
            CliMethod::Patch => Method::Patch,
            CliMethod::Delete => Method::Delete,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Send one request within a time budget and print the response.
    Get {
        #[command(flatten)]
        request: RequestArgs,
    },

    /// Walk a token-paginated JSON listing within one time budget.
    Pages {
        #[command(flatten)]
        request: RequestArgs,

        /// Query parameter that carries the continuation token.
        #[arg(long, value_name = "NAME")]
        token_param: String,

        /// JSON pointer to the next token in each page, e.g. /next.
        #[arg(long, value_name = "POINTER")]
        next_token: String,

        /// Stop after this many pages.
        #[arg(long, value_name = "N")]
        max_pages: Option<usize>,
    },

    /// Issue many budget-bound requests concurrently and report outcomes.
    Soak {
        #[command(flatten)]
        request: RequestArgs,

        /// Total number of requests.
        #[arg(long, default_value = "100", value_name = "N")]
        iterations: usize,

        /// Requests in flight at once.
        #[arg(long, default_value = "4", value_name = "N")]
        concurrency: usize,
    },

    /// Show the config file path and effective configuration.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get { request } => run_get(&cfg, &request).await?,
            CliCommand::Pages {
                request,
                token_param,
                next_token,
                max_pages,
            } => run_pages(&cfg, &request, &token_param, &next_token, max_pages).await?,
            CliCommand::Soak {
                request,
                iterations,
                concurrency,
            } => run_soak(&cfg, &request, iterations, concurrency).await?,
            CliCommand::Config => run_config(&cfg)?,
        }

        Ok(())
    }
}

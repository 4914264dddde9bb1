//! `ctxreq config` – show config and log paths and effective values.

use anyhow::Result;
use ctxreq_core::config::{self, ClientConfig};
use ctxreq_core::logging;

pub fn run_config(cfg: &ClientConfig) -> Result<()> {
    println!("# config: {}", config::config_path()?.display());
    println!("# log: {}", logging::log_path()?.display());
    print!("{}", toml::to_string_pretty(cfg)?);
    Ok(())
}

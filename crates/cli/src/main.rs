// crates/cli/src/main.rs
//! range-advisor binary.
//!
//! Reads the slowest statements from `pg_stat_statements`, asks an LLM which
//! ones filter on ranges without a supporting range index, and prints the
//! report to stdout. Logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use range_advisor_cli::{analyze_slow_queries, init_tracing, load_config, Args};
use range_advisor_core::llm::create_provider;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = load_config(&args)?;
    tracing::debug!(?config, "configuration loaded");

    let provider = create_provider(&config.llm).context("creating LLM provider")?;
    if let Err(e) = provider.health_check().await {
        tracing::warn!(provider = provider.name(), error = %e, "LLM provider health check failed");
    }
    tracing::info!(provider = provider.name(), model = provider.model(), "LLM provider ready");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    analyze_slow_queries(&config, provider, &mut out).await?;
    Ok(())
}

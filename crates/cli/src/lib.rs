// crates/cli/src/lib.rs
//! `range-advisor` command: argument parsing, config merge and the
//! session-owning report run.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use range_advisor_core::llm::{LlmProvider, ProviderType};
use range_advisor_core::{AppConfig, PlanAnalyzer, ReportDriver, ReportSummary};
use range_advisor_db::{disconnect, Database};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "warn,range_advisor=info,range_advisor_core=info,range_advisor_db=info";
const VERBOSE_LOG_FILTER: &str =
    "warn,range_advisor=debug,range_advisor_core=debug,range_advisor_db=debug";

#[derive(Debug, Parser)]
#[command(name = "range-advisor")]
#[command(
    about = "Find slow queries that scan ranges without a range index",
    long_about = None,
    version
)]
pub struct Args {
    /// Path to a TOML config file
    #[arg(long, env = "RANGE_ADVISOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database host
    #[arg(long)]
    pub host: Option<String>,

    /// Database port
    #[arg(long)]
    pub port: Option<u16>,

    /// Database user
    #[arg(long)]
    pub user: Option<String>,

    /// Database name
    #[arg(long)]
    pub dbname: Option<String>,

    /// LLM provider (gemini, openai, ollama, claude-cli)
    #[arg(long)]
    pub provider: Option<ProviderType>,

    /// LLM model name
    #[arg(long)]
    pub model: Option<String>,

    /// Number of slowest statements to analyze
    #[arg(long)]
    pub limit: Option<u32>,

    /// Print the raw EXPLAIN JSON under each analysis
    #[arg(long, default_value_t = false)]
    pub show_plan: bool,

    /// Debug-level logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    /// Apply command-line overrides on top of file and env settings.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.database.host = host.clone();
        }
        if let Some(port) = self.port {
            config.database.port = port;
        }
        if let Some(user) = &self.user {
            config.database.user = user.clone();
        }
        if let Some(dbname) = &self.dbname {
            config.database.dbname = dbname.clone();
        }
        if let Some(provider) = self.provider {
            config.llm.provider = provider;
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(limit) = self.limit {
            config.report.top_n = limit;
        }
        if self.show_plan {
            config.report.show_plan = true;
        }
    }
}

/// Config file, then env, then flags; validated.
pub fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = AppConfig::load(args.config.as_deref()).context("loading configuration")?;
    args.apply_to(&mut config);
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Install the stderr subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

/// Open a session, print the report, and close the session on every path.
///
/// The report error, if any, is returned after the session is closed.
pub async fn analyze_slow_queries(
    config: &AppConfig,
    provider: Arc<dyn LlmProvider>,
    out: &mut dyn Write,
) -> Result<ReportSummary> {
    let mut session: Option<Database> = None;
    let result = run_with_session(&mut session, config, provider, out).await;
    disconnect(session.take()).await;
    if let Err(e) = &result {
        tracing::error!(error = %format!("{e:#}"), "error analyzing queries");
    }
    result
}

async fn run_with_session(
    session: &mut Option<Database>,
    config: &AppConfig,
    provider: Arc<dyn LlmProvider>,
    out: &mut dyn Write,
) -> Result<ReportSummary> {
    let db = session.insert(
        Database::connect(&config.database)
            .await
            .with_context(|| format!("connecting to {}", config.database.display_target()))?,
    );

    let version = db.server_version().await.context("reading server version")?;
    writeln!(out, "Database version: {version}")?;
    writeln!(out, "\nAnalyzing slow queries...")?;

    let analyzer = PlanAnalyzer::new(provider).with_temperature(config.llm.temperature);
    let driver = ReportDriver::new(analyzer, config.report.clone());
    let summary = driver.run(db, out).await?;

    tracing::info!(
        queries = summary.queries_analyzed,
        range_predicates = summary.range_predicates_found,
        plans_interpreted = summary.plans_interpreted,
        "report complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_args_parse_all_flags() {
        let args = Args::try_parse_from([
            "range-advisor",
            "--host",
            "db.internal",
            "--port",
            "5432",
            "--user",
            "admin",
            "--dbname",
            "shop",
            "--provider",
            "ollama",
            "--model",
            "llama3",
            "--limit",
            "5",
            "--show-plan",
            "-v",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        args.apply_to(&mut config);

        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.user, "admin");
        assert_eq!(config.database.dbname, "shop");
        assert_eq!(config.llm.provider, ProviderType::OpenAi);
        assert_eq!(config.llm.model, "llama3");
        assert_eq!(config.report.top_n, 5);
        assert!(config.report.show_plan);
        assert!(args.verbose);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let args = Args::try_parse_from(["range-advisor"]).unwrap();
        let mut config = AppConfig::default();
        config.database.host = "from-file".into();
        args.apply_to(&mut config);
        assert_eq!(config.database.host, "from-file");
        assert_eq!(config.report.top_n, 2);
        assert!(!config.report.show_plan);
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = Args::try_parse_from(["range-advisor", "--provider", "bard"]).unwrap_err();
        assert!(err.to_string().contains("bard"));
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Args::try_parse_from(["range-advisor", "--port", "70000"]).is_err());
    }

    #[tokio::test]
    async fn test_connection_failure_is_returned_without_output() {
        let mut config = AppConfig::default();
        config.database.host = "127.0.0.1".into();
        config.database.port = 1;
        config.database.connect_timeout_secs = 2;
        config.database.ssl_mode = range_advisor_core::SslMode::Disable;
        config.llm.provider = ProviderType::OpenAi;
        config.llm.endpoint = Some("http://127.0.0.1:1/v1".into());
        let provider = range_advisor_core::llm::create_provider(&config.llm).unwrap();

        let mut out = Vec::new();
        let err = analyze_slow_queries(&config, provider, &mut out)
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("connecting to 127.0.0.1:1/"));
        assert!(out.is_empty());
    }
}

// crates/core/src/config.rs
//! Runtime configuration: TOML file, then `RANGE_ADVISOR_*` env vars.
//!
//! CLI flags are applied on top by the binary. Call `validate()` before
//! connecting.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::llm::{LlmConfig, ProviderType};

const ENV_PREFIX: &str = "RANGE_ADVISOR_";
const CONFIG_FILENAME: &str = "config.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub report: ReportConfig,
}

/// TLS negotiation for the database session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SslMode {
    Disable,
    #[default]
    Prefer,
    Require,
}

impl std::str::FromStr for SslMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disable" => Ok(Self::Disable),
            "prefer" => Ok(Self::Prefer),
            "require" => Ok(Self::Require),
            other => Err(format!("unknown sslmode '{other}' (expected disable, prefer or require)")),
        }
    }
}

/// Connection parameters for the target database.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub dbname: String,
    pub connect_timeout_secs: u64,
    pub ssl_mode: SslMode,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5433,
            user: "yugabyte".into(),
            password: None,
            dbname: "yugabyte".into(),
            connect_timeout_secs: 10,
            ssl_mode: SslMode::Prefer,
        }
    }
}

impl DatabaseConfig {
    /// Password as sent to the server.
    ///
    /// A literal `%23` becomes `#`. This is a plain substring replacement for
    /// passwords copied out of URLs, not percent-decoding: no other escape is
    /// touched.
    pub fn resolved_password(&self) -> Option<String> {
        self.password.as_ref().map(|p| p.replace("%23", "#"))
    }

    /// `host:port/dbname as user`, safe to log.
    pub fn display_target(&self) -> String {
        format!("{}:{}/{} as {}", self.host, self.port, self.dbname, self.user)
    }
}

// Passwords stay out of logs.
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("dbname", &self.dbname)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

/// Report settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// How many of the slowest statements to analyze.
    pub top_n: u32,
    /// Print the raw plan JSON under each analysis.
    pub show_plan: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: 2,
            show_plan: false,
        }
    }
}

/// Default config location: `~/.config/range-advisor/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("range-advisor").join(CONFIG_FILENAME))
}

impl AppConfig {
    /// Parse a config file. A missing explicit path is an error.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_toml_str(&content).map_err(|message| ConfigError::MalformedToml {
            path: path.to_owned(),
            message,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load from `path`, or from the default location when it exists, then
    /// apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(p) => {
                    tracing::debug!(path = %p.display(), "loading default config file");
                    Self::from_file(&p)?
                }
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override fields from `RANGE_ADVISOR_*` variables looked up via `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let get = |name: &str| var(&format!("{ENV_PREFIX}{name}")).filter(|v| !v.is_empty());

        if let Some(v) = get("DB_HOST") {
            self.database.host = v;
        }
        if let Some(v) = get("DB_PORT") {
            self.database.port = parse_env("DB_PORT", &v)?;
        }
        if let Some(v) = get("DB_USER") {
            self.database.user = v;
        }
        if let Some(v) = get("DB_PASSWORD") {
            self.database.password = Some(v);
        }
        if let Some(v) = get("DB_NAME") {
            self.database.dbname = v;
        }
        if let Some(v) = get("DB_SSLMODE") {
            self.database.ssl_mode = parse_env("DB_SSLMODE", &v)?;
        }
        if let Some(v) = get("LLM_PROVIDER") {
            self.llm.provider = parse_env::<ProviderType>("LLM_PROVIDER", &v)?;
        }
        if let Some(v) = get("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = get("LLM_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = get("LLM_ENDPOINT") {
            self.llm.endpoint = Some(v);
        }
        if let Some(v) = get("TOP_N") {
            self.report.top_n = parse_env("TOP_N", &v)?;
        }
        Ok(())
    }

    /// Reject settings that cannot produce a working run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.host.trim().is_empty() {
            return Err(ConfigError::Missing("database.host"));
        }
        if self.database.port == 0 {
            return Err(ConfigError::invalid("database.port", "must be non-zero"));
        }
        if self.database.user.trim().is_empty() {
            return Err(ConfigError::Missing("database.user"));
        }
        if self.database.dbname.trim().is_empty() {
            return Err(ConfigError::Missing("database.dbname"));
        }
        if self.database.connect_timeout_secs == 0 {
            return Err(ConfigError::invalid("database.connect_timeout_secs", "must be at least 1"));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Missing("llm.model"));
        }
        if self.report.top_n == 0 {
            return Err(ConfigError::invalid("report.top_n", "must be at least 1"));
        }
        Ok(())
    }
}

fn parse_env<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(format!("{ENV_PREFIX}{name}"), e.to_string()))
}

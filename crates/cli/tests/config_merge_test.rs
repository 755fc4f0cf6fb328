//! Layering of config file, environment and command-line flags.

use clap::Parser;
use pretty_assertions::assert_eq;
use range_advisor_cli::{load_config, Args};
use range_advisor_core::llm::ProviderType;
use serial_test::serial;

const ENV_VARS: &[&str] = &[
    "RANGE_ADVISOR_CONFIG",
    "RANGE_ADVISOR_DB_HOST",
    "RANGE_ADVISOR_DB_PORT",
    "RANGE_ADVISOR_DB_USER",
    "RANGE_ADVISOR_DB_PASSWORD",
    "RANGE_ADVISOR_DB_NAME",
    "RANGE_ADVISOR_DB_SSLMODE",
    "RANGE_ADVISOR_LLM_PROVIDER",
    "RANGE_ADVISOR_LLM_MODEL",
    "RANGE_ADVISOR_LLM_API_KEY",
    "RANGE_ADVISOR_LLM_ENDPOINT",
    "RANGE_ADVISOR_TOP_N",
];

fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

fn write_config(dir: &tempfile::TempDir, body: &str) -> String {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, body).unwrap();
    path.display().to_string()
}

#[test]
#[serial]
fn test_flags_override_env_override_file() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
        [database]
        host = "file-host"
        port = 6000
        user = "file-user"
        password = "Secret%23"

        [llm]
        provider = "open-ai"
        model = "file-model"
        endpoint = "http://localhost:11434/v1"

        [report]
        top_n = 3
        "#,
    );
    std::env::set_var("RANGE_ADVISOR_DB_HOST", "env-host");
    std::env::set_var("RANGE_ADVISOR_TOP_N", "4");

    let args = Args::try_parse_from(["range-advisor", "--config", &path, "--limit", "7"]).unwrap();
    let config = load_config(&args).unwrap();
    clear_env();

    assert_eq!(config.database.host, "env-host");
    assert_eq!(config.database.port, 6000);
    assert_eq!(config.database.user, "file-user");
    assert_eq!(config.database.resolved_password().as_deref(), Some("Secret#"));
    assert_eq!(config.llm.provider, ProviderType::OpenAi);
    assert_eq!(config.llm.model, "file-model");
    assert_eq!(config.report.top_n, 7);
}

#[test]
#[serial]
fn test_config_path_from_env() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[database]\ndbname = \"analytics\"\n");
    std::env::set_var("RANGE_ADVISOR_CONFIG", &path);

    let args = Args::try_parse_from(["range-advisor"]).unwrap();
    let config = load_config(&args).unwrap();
    clear_env();

    assert_eq!(config.database.dbname, "analytics");
}

#[test]
#[serial]
fn test_zero_limit_fails_validation() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "");

    let args = Args::try_parse_from(["range-advisor", "--config", &path, "--limit", "0"]).unwrap();
    let err = load_config(&args).unwrap_err();

    assert!(format!("{err:#}").contains("report.top_n"));
}

#[test]
#[serial]
fn test_missing_config_file_is_an_error() {
    clear_env();
    let args = Args::try_parse_from(["range-advisor", "--config", "/nonexistent/range-advisor.toml"]).unwrap();
    let err = load_config(&args).unwrap_err();

    assert!(format!("{err:#}").contains("not found"));
}

#[test]
#[serial]
fn test_malformed_env_port_is_an_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "");
    std::env::set_var("RANGE_ADVISOR_DB_PORT", "five");

    let args = Args::try_parse_from(["range-advisor", "--config", &path]).unwrap();
    let result = load_config(&args);
    clear_env();

    assert!(format!("{:#}", result.unwrap_err()).contains("RANGE_ADVISOR_DB_PORT"));
}

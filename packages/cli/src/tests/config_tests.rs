use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use pretty_assertions::assert_eq;
use rstest::rstest;
use serial_test::serial;

use crate::config::{Config, ConfigError};

fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|name| map.get(name).cloned())
}

#[test]
fn test_config_defaults() {
    let config = config_from(&[]).unwrap();

    assert_eq!(config.port, 4001);
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.cors_origin, "http://localhost:5173");
    assert_eq!(config.reminder_lookahead_days, 3);
    assert_eq!(config.report_currency, "EUR");
    assert_eq!(config.email_timeout, Duration::from_secs(30));
    assert_eq!(config.email_api_url, "https://api.resend.com/emails");
    assert!(config.email_api_key.is_none());
    assert!(config.artifact_public_url.is_none());
    assert!(config.database_path.ends_with("robodesk.db"));
}

#[test]
fn test_config_reads_all_settings() {
    let config = config_from(&[
        ("ROBODESK_API_PORT", "8080"),
        ("ROBODESK_API_HOST", "0.0.0.0"),
        ("ROBODESK_CORS_ORIGIN", "https://crm.example.com"),
        ("ROBODESK_DATABASE_PATH", "/var/lib/robodesk/crm.db"),
        ("ROBODESK_ARTIFACT_ROOT", "/var/lib/robodesk/artifacts"),
        ("ROBODESK_ARTIFACT_PUBLIC_URL", "https://files.example.com/"),
        ("ROBODESK_EMAIL_API_KEY", "re_test_key"),
        ("ROBODESK_EMAIL_FROM", "Sales <sales@example.com>"),
        ("ROBODESK_EMAIL_TIMEOUT_SECS", "5"),
        ("ROBODESK_REMINDER_LOOKAHEAD_DAYS", "7"),
        ("ROBODESK_REPORT_CURRENCY", "SEK"),
    ])
    .unwrap();

    assert_eq!(config.bind_address(), "0.0.0.0:8080");
    assert_eq!(config.cors_origin, "https://crm.example.com");
    assert_eq!(config.database_path, PathBuf::from("/var/lib/robodesk/crm.db"));
    assert_eq!(
        config.artifact_public_url.as_deref(),
        Some("https://files.example.com")
    );
    assert_eq!(config.email_api_key().unwrap(), "re_test_key");
    assert_eq!(config.email_timeout, Duration::from_secs(5));

    let settings = config.service_settings();
    assert_eq!(settings.sender, "Sales <sales@example.com>");
    assert_eq!(settings.reminder_lookahead_days, 7);
    assert_eq!(settings.report_currency, "SEK");
}

#[test]
fn test_legacy_port_variable_is_honoured() {
    let config = config_from(&[("PORT", "3000")]).unwrap();
    assert_eq!(config.port, 3000);

    let config = config_from(&[("PORT", "3000"), ("ROBODESK_API_PORT", "3100")]).unwrap();
    assert_eq!(config.port, 3100);
}

#[rstest]
#[case("not-a-number")]
#[case("70000")]
#[case("-1")]
fn test_config_invalid_port(#[case] raw: &str) {
    let result = config_from(&[("ROBODESK_API_PORT", raw)]);
    assert!(matches!(result, Err(ConfigError::InvalidPort(_))));
}

#[test]
fn test_config_port_zero_is_rejected() {
    let result = config_from(&[("ROBODESK_API_PORT", "0")]);
    assert!(matches!(result, Err(ConfigError::PortOutOfRange(0))));
}

#[rstest]
#[case("-1", true)]
#[case("400", true)]
#[case("0", false)]
#[case("14", false)]
fn test_lookahead_bounds(#[case] raw: &str, #[case] rejected: bool) {
    let result = config_from(&[("ROBODESK_REMINDER_LOOKAHEAD_DAYS", raw)]);
    assert_eq!(
        matches!(result, Err(ConfigError::InvalidLookahead(_))),
        rejected
    );
}

#[test]
fn test_unparsable_timeout_falls_back_to_default() {
    let config = config_from(&[("ROBODESK_EMAIL_TIMEOUT_SECS", "soon")]).unwrap();
    assert_eq!(config.email_timeout, Duration::from_secs(30));
}

#[test]
fn test_blank_values_count_as_unset() {
    let config = config_from(&[("ROBODESK_REPORT_CURRENCY", "   "), ("ROBODESK_EMAIL_API_KEY", "")])
        .unwrap();
    assert_eq!(config.report_currency, "EUR");
    assert!(matches!(
        config.email_api_key(),
        Err(ConfigError::MissingVariable("ROBODESK_EMAIL_API_KEY"))
    ));
}

#[test]
#[serial]
fn test_from_env_reads_process_environment() {
    env::set_var("ROBODESK_API_PORT", "4555");
    env::set_var("ROBODESK_REPORT_CURRENCY", "NOK");

    let config = Config::from_env().unwrap();

    assert_eq!(config.port, 4555);
    assert_eq!(config.report_currency, "NOK");

    env::remove_var("ROBODESK_API_PORT");
    env::remove_var("ROBODESK_REPORT_CURRENCY");
}

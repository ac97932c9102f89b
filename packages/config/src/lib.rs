// ABOUTME: Environment-driven configuration helpers for Robodesk
// ABOUTME: Variable names live in `constants`; lookup and lenient parsing live here

pub mod constants;

use std::env;
use std::str::FromStr;

use tracing::warn;

/// Read an environment variable, treating blank values as unset
pub fn env_string(name: &str) -> Option<String> {
    normalize(env::var(name).ok())
}

/// Trim a raw value and drop it when blank
pub fn normalize(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse an optional raw value, falling back to `default` when unset or unparsable
///
/// `name` is only used for the warning logged on garbage input.
pub fn parse_or<T>(name: &str, raw: Option<&str>, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match raw {
        Some(raw) => match raw.parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    "Ignoring invalid value '{}' for {}, using default {:?}",
                    raw, name, default
                );
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_falls_back_on_garbage() {
        assert_eq!(parse_or::<u64>("TIMEOUT", Some("soon"), 30), 30);
        assert_eq!(parse_or::<u64>("TIMEOUT", None, 30), 30);
        assert_eq!(parse_or::<u64>("TIMEOUT", Some("45"), 30), 45);
    }

    #[test]
    fn test_normalize_treats_blank_as_unset() {
        assert_eq!(normalize(Some("   ".to_string())), None);
        assert_eq!(normalize(Some(" EUR ".to_string())), Some("EUR".to_string()));
        assert_eq!(normalize(None), None);
    }

    #[test]
    fn test_env_string_reads_process_environment() {
        env::set_var("ROBODESK_TEST_ENV_STRING", " value ");
        assert_eq!(
            env_string("ROBODESK_TEST_ENV_STRING"),
            Some("value".to_string())
        );
        env::remove_var("ROBODESK_TEST_ENV_STRING");
        assert!(env_string("ROBODESK_TEST_ENV_STRING").is_none());
    }
}

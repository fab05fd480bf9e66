use std::path::PathBuf;

use crate::app_config::{AppConfig, CredentialSource, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid or inconsistent.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid or inconsistent.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The core parsing/validation logic, decoupled from the actual environment so
/// it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let env = parse_environment(&or_default("BAGTREND_ENV", "development"));
    let log_level = or_default("BAGTREND_LOG_LEVEL", "info");

    let credential_source = match or_default("BAGTREND_CREDENTIAL_SOURCE", "file").as_str() {
        "app-secrets" => CredentialSource::AppSecrets,
        "file" => CredentialSource::File(PathBuf::from(or_default(
            "BAGTREND_CREDENTIALS_PATH",
            "./credentials.json",
        ))),
        other => {
            return Err(ConfigError::InvalidEnvVar {
                var: "BAGTREND_CREDENTIAL_SOURCE".to_string(),
                reason: format!("unknown credential source \"{other}\" (expected \"app-secrets\" or \"file\")"),
            })
        }
    };

    let store_base_url = or_default("BAGTREND_STORE_BASE_URL", "https://sheets.googleapis.com/v4");
    let keyword_cache_path = PathBuf::from(or_default(
        "BAGTREND_KEYWORD_CACHE_PATH",
        "./data/keyword_cache.json",
    ));

    let trends_base_url = or_default("BAGTREND_TRENDS_BASE_URL", "https://trends.google.com");
    let trends_timeframe = or_default("BAGTREND_TRENDS_TIMEFRAME", "today 3-m");
    let trends_batch_size = parse_usize("BAGTREND_TRENDS_BATCH_SIZE", "5")?;

    let marketplace_base_url = or_default(
        "BAGTREND_MARKETPLACE_BASE_URL",
        "https://www.ebay.com/sch/i.html",
    );

    let delay_min_secs = parse_u64("BAGTREND_DELAY_MIN_SECS", "5")?;
    let delay_max_secs = parse_u64("BAGTREND_DELAY_MAX_SECS", "15")?;
    let request_timeout_secs = parse_u64("BAGTREND_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default(
        "BAGTREND_USER_AGENT",
        "bagtrend/0.1 (market-interest collector)",
    );

    if trends_batch_size == 0 {
        return Err(ConfigError::Validation(
            "BAGTREND_TRENDS_BATCH_SIZE must be at least 1".to_string(),
        ));
    }
    if delay_min_secs > delay_max_secs {
        return Err(ConfigError::Validation(format!(
            "BAGTREND_DELAY_MIN_SECS ({delay_min_secs}) must not exceed BAGTREND_DELAY_MAX_SECS ({delay_max_secs})"
        )));
    }

    Ok(AppConfig {
        env,
        log_level,
        credential_source,
        store_base_url,
        keyword_cache_path,
        trends_base_url,
        trends_timeframe,
        trends_batch_size,
        marketplace_base_url,
        delay_min_secs,
        delay_max_secs,
        request_timeout_secs,
        user_agent,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

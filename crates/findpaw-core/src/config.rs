use crate::app_config::{AppConfig, Environment};
use crate::geo::Coordinate;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

fn invalid(var: &str, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: reason.to_string(),
    }
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing is decoupled from the process environment so tests can feed a
/// plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e))
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e))
    };

    let supabase_url = require("SUPABASE_URL")?;
    if !(supabase_url.starts_with("http://") || supabase_url.starts_with("https://")) {
        return Err(invalid("SUPABASE_URL", "must start with http:// or https://"));
    }
    let supabase_anon_key = require("SUPABASE_ANON_KEY")?;

    let env = parse_environment(&or_default("FINDPAW_ENV", "development"));
    let log_level = or_default("FINDPAW_LOG_LEVEL", "info");
    let storage_bucket = or_default("FINDPAW_STORAGE_BUCKET", "images");

    let request_timeout_secs = parse_u64("FINDPAW_REQUEST_TIMEOUT_SECS", "30")?;
    if request_timeout_secs == 0 {
        return Err(invalid("FINDPAW_REQUEST_TIMEOUT_SECS", "must be greater than 0"));
    }
    let max_retries = parse_u32("FINDPAW_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("FINDPAW_RETRY_BACKOFF_BASE_MS", "500")?;
    let sighting_window_days = parse_u32("FINDPAW_SIGHTING_WINDOW_DAYS", "30")?;

    let fallback_lat = parse_f64(
        "FINDPAW_FALLBACK_LAT",
        &Coordinate::FALLBACK.latitude.to_string(),
    )?;
    let fallback_lng = parse_f64(
        "FINDPAW_FALLBACK_LNG",
        &Coordinate::FALLBACK.longitude.to_string(),
    )?;
    let fallback_location =
        Coordinate::new(fallback_lat, fallback_lng).map_err(|e| invalid("FINDPAW_FALLBACK_LAT", e))?;

    let auth_redirect_url = or_default(
        "FINDPAW_AUTH_REDIRECT_URL",
        "http://localhost:3000/auth/callback",
    );

    Ok(AppConfig {
        supabase_url,
        supabase_anon_key,
        env,
        log_level,
        storage_bucket,
        request_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
        sighting_window_days,
        fallback_location,
        auth_redirect_url,
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

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

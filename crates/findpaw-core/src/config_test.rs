use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated with valid defaults.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("SUPABASE_URL", "https://project.supabase.co");
    m.insert("SUPABASE_ANON_KEY", "anon-key");
    m
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(parse_environment("development"), Environment::Development);
    assert_eq!(parse_environment("test"), Environment::Test);
    assert_eq!(parse_environment("production"), Environment::Production);
}

#[test]
fn parse_environment_unknown_defaults_to_development() {
    assert_eq!(parse_environment("staging"), Environment::Development);
}

#[test]
fn build_app_config_fails_without_supabase_url() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "SUPABASE_URL"),
        "expected MissingEnvVar(SUPABASE_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_without_anon_key() {
    let mut map: HashMap<&str, &str> = HashMap::new();
    map.insert("SUPABASE_URL", "https://project.supabase.co");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "SUPABASE_ANON_KEY"),
        "expected MissingEnvVar(SUPABASE_ANON_KEY), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_url_without_scheme() {
    let mut map = full_env();
    map.insert("SUPABASE_URL", "project.supabase.co");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SUPABASE_URL"),
        "expected InvalidEnvVar(SUPABASE_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_succeeds_with_defaults() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.storage_bucket, "images");
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.max_retries, 3);
    assert_eq!(cfg.retry_backoff_base_ms, 500);
    assert_eq!(cfg.sighting_window_days, 30);
    assert_eq!(cfg.fallback_location, Coordinate::FALLBACK);
    assert_eq!(cfg.auth_redirect_url, "http://localhost:3000/auth/callback");
}

#[test]
fn build_app_config_reads_overrides() {
    let mut map = full_env();
    map.insert("FINDPAW_ENV", "production");
    map.insert("FINDPAW_STORAGE_BUCKET", "photos");
    map.insert("FINDPAW_SIGHTING_WINDOW_DAYS", "7");
    map.insert("FINDPAW_FALLBACK_LAT", "35.1796");
    map.insert("FINDPAW_FALLBACK_LNG", "129.0756");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Production);
    assert_eq!(cfg.storage_bucket, "photos");
    assert_eq!(cfg.sighting_window_days, 7);
    assert_eq!(cfg.fallback_location.latitude, 35.1796);
    assert_eq!(cfg.fallback_location.longitude, 129.0756);
}

#[test]
fn build_app_config_rejects_zero_timeout() {
    let mut map = full_env();
    map.insert("FINDPAW_REQUEST_TIMEOUT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "FINDPAW_REQUEST_TIMEOUT_SECS"),
        "expected InvalidEnvVar(FINDPAW_REQUEST_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_non_numeric_retries() {
    let mut map = full_env();
    map.insert("FINDPAW_MAX_RETRIES", "many");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "FINDPAW_MAX_RETRIES"),
        "expected InvalidEnvVar(FINDPAW_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_out_of_range_fallback() {
    let mut map = full_env();
    map.insert("FINDPAW_FALLBACK_LAT", "123.0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "FINDPAW_FALLBACK_LAT"),
        "expected InvalidEnvVar(FINDPAW_FALLBACK_LAT), got: {result:?}"
    );
}

#[test]
fn debug_output_redacts_anon_key() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("anon-key"), "anon key leaked: {rendered}");
    assert!(rendered.contains("[redacted]"));
}

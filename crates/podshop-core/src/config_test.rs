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
    m.insert("PODSHOP_BACKEND_URL", "https://project.supabase.co");
    m.insert("PODSHOP_BACKEND_KEY", "anon-key");
    m
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "PODSHOP_ENV"));
}

#[test]
fn build_app_config_fails_without_backend_url() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "PODSHOP_BACKEND_URL"),
        "expected MissingEnvVar(PODSHOP_BACKEND_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_without_backend_key() {
    let mut map: HashMap<&str, &str> = HashMap::new();
    map.insert("PODSHOP_BACKEND_URL", "https://project.supabase.co");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "PODSHOP_BACKEND_KEY"),
        "expected MissingEnvVar(PODSHOP_BACKEND_KEY), got: {result:?}"
    );
}

#[test]
fn blank_backend_key_counts_as_missing() {
    let mut map = full_env();
    map.insert("PODSHOP_BACKEND_KEY", "   ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "PODSHOP_BACKEND_KEY"));
}

#[test]
fn build_app_config_succeeds_with_all_required_vars() {
    let map = full_env();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.backend_url, "https://project.supabase.co");
    assert_eq!(cfg.backend_key, "anon-key");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.proxy_bind_addr.to_string(), "0.0.0.0:8787");
    assert!(cfg.gateway_secret_key.is_none());
    assert_eq!(cfg.gateway_base_url, "https://api.paymongo.com/v1");
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.stock_policy, StockPolicy::Exact);
    assert_eq!(cfg.image_buckets, vec!["product-images", "images"]);
}

#[test]
fn proxy_port_override() {
    let mut map = full_env();
    map.insert("PODSHOP_PROXY_PORT", "9000");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.proxy_bind_addr.port(), 9000);
}

#[test]
fn proxy_port_invalid() {
    let mut map = full_env();
    map.insert("PODSHOP_PROXY_PORT", "70000");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PODSHOP_PROXY_PORT"),
        "expected InvalidEnvVar(PODSHOP_PROXY_PORT), got: {result:?}"
    );
}

#[test]
fn request_timeout_secs_invalid() {
    let mut map = full_env();
    map.insert("PODSHOP_REQUEST_TIMEOUT_SECS", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PODSHOP_REQUEST_TIMEOUT_SECS"),
        "expected InvalidEnvVar(PODSHOP_REQUEST_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn stock_policy_subset_override() {
    let mut map = full_env();
    map.insert("PODSHOP_STOCK_POLICY", "subset");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.stock_policy, StockPolicy::Subset);
}

#[test]
fn stock_policy_unknown_is_rejected() {
    let mut map = full_env();
    map.insert("PODSHOP_STOCK_POLICY", "fuzzy");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PODSHOP_STOCK_POLICY")
    );
}

#[test]
fn image_buckets_are_trimmed_and_ordered() {
    let mut map = full_env();
    map.insert("PODSHOP_IMAGE_BUCKETS", " designs , ,product-images ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.image_buckets, vec!["designs", "product-images"]);
}

#[test]
fn image_buckets_empty_list_is_rejected() {
    let mut map = full_env();
    map.insert("PODSHOP_IMAGE_BUCKETS", " , ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PODSHOP_IMAGE_BUCKETS")
    );
}

#[test]
fn debug_output_redacts_secrets() {
    let mut map = full_env();
    map.insert("PODSHOP_GATEWAY_SECRET_KEY", "sk_test_abc");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("anon-key"));
    assert!(!rendered.contains("sk_test_abc"));
    assert!(rendered.contains("[redacted]"));
}

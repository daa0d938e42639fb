use crate::app_config::{AppConfig, Environment};
use crate::stock::StockPolicy;
use crate::ConfigError;

const DEFAULT_GATEWAY_BASE_URL: &str = "https://api.paymongo.com/v1";
const DEFAULT_IMAGE_BUCKETS: &str = "product-images,images";

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

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::{Ipv4Addr, SocketAddr};

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u16 = |var: &str, default: &str| -> Result<u16, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u16>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let backend_url = require("PODSHOP_BACKEND_URL")?;
    let backend_key = require("PODSHOP_BACKEND_KEY")?;

    let env = parse_environment(&or_default("PODSHOP_ENV", "development"))?;
    let log_level = or_default("PODSHOP_LOG_LEVEL", "info");

    let proxy_port = parse_u16("PODSHOP_PROXY_PORT", "8787")?;
    let proxy_bind_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, proxy_port));

    let gateway_secret_key = lookup("PODSHOP_GATEWAY_SECRET_KEY")
        .ok()
        .filter(|v| !v.trim().is_empty());
    let gateway_base_url = or_default("PODSHOP_GATEWAY_BASE_URL", DEFAULT_GATEWAY_BASE_URL);

    let request_timeout_secs = parse_u64("PODSHOP_REQUEST_TIMEOUT_SECS", "30")?;

    let stock_policy = or_default("PODSHOP_STOCK_POLICY", "exact")
        .parse::<StockPolicy>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "PODSHOP_STOCK_POLICY".to_string(),
            reason: e.to_string(),
        })?;

    let image_buckets: Vec<String> = or_default("PODSHOP_IMAGE_BUCKETS", DEFAULT_IMAGE_BUCKETS)
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    if image_buckets.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "PODSHOP_IMAGE_BUCKETS".to_string(),
            reason: "at least one bucket name is required".to_string(),
        });
    }

    Ok(AppConfig {
        backend_url,
        backend_key,
        env,
        log_level,
        proxy_bind_addr,
        gateway_secret_key,
        gateway_base_url,
        request_timeout_secs,
        stock_policy,
        image_buckets,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PODSHOP_ENV".to_string(),
            reason: format!("expected development, test, or production, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

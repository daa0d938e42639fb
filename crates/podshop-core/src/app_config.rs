use std::net::SocketAddr;

use crate::stock::StockPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// Project URL of the hosted backend, e.g. `https://abc.supabase.co`.
    pub backend_url: String,
    /// Anonymous (publishable) key sent as `apikey` on every backend request.
    pub backend_key: String,
    pub env: Environment,
    pub log_level: String,
    pub proxy_bind_addr: SocketAddr,
    /// Secret key for the payment gateway. Only the proxy needs it.
    pub gateway_secret_key: Option<String>,
    pub gateway_base_url: String,
    pub request_timeout_secs: u64,
    pub stock_policy: StockPolicy,
    /// Storage buckets tried in order when resolving product image keys.
    pub image_buckets: Vec<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("backend_url", &self.backend_url)
            .field("backend_key", &"[redacted]")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("proxy_bind_addr", &self.proxy_bind_addr)
            .field(
                "gateway_secret_key",
                &self.gateway_secret_key.as_ref().map(|_| "[redacted]"),
            )
            .field("gateway_base_url", &self.gateway_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("stock_policy", &self.stock_policy)
            .field("image_buckets", &self.image_buckets)
            .finish()
    }
}

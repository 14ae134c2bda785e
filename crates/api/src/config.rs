/// Server configuration loaded from environment variables.
///
/// All fields except the vendor API key have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Mollie API key (`test_…` or `live_…`); the prefix decides the
    /// vendor mode.
    pub mollie_api_key: String,
    /// Mollie API base URL; override only for sandboxes and tests.
    pub mollie_api_url: Option<String>,
    /// Public base URL of this deployment. When set, the webhook endpoint
    /// under it is registered on every created payment.
    pub public_base_url: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `3000`                  |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `MOLLIE_API_KEY`       | required                |
    /// | `MOLLIE_API_URL`       | unset                   |
    /// | `PUBLIC_BASE_URL`      | unset                   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let mollie_api_key =
            std::env::var("MOLLIE_API_KEY").expect("MOLLIE_API_KEY must be set");

        let mollie_api_url = std::env::var("MOLLIE_API_URL").ok();
        let public_base_url = std::env::var("PUBLIC_BASE_URL").ok();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            mollie_api_key,
            mollie_api_url,
            public_base_url,
        }
    }

    /// The webhook endpoint registered with the vendor, when the
    /// deployment is publicly reachable.
    pub fn webhook_url(&self) -> Option<String> {
        self.public_base_url
            .as_ref()
            .map(|base| format!("{}/api/v1/webhooks/mollie", base.trim_end_matches('/')))
    }
}

use std::path::PathBuf;

/// Where the remote store's service-account credentials come from.
///
/// Selected once at startup via configuration — the adapter never sniffs its
/// runtime environment to decide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Credentials injected by the hosting application's secret store,
    /// exposed to the process as environment variables.
    AppSecrets,
    /// Credentials read from a local service-account JSON file.
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub credential_source: CredentialSource,
    /// Base URL of the remote tabular store API.
    pub store_base_url: String,
    pub keyword_cache_path: PathBuf,
    /// Base URL of the search-interest API.
    pub trends_base_url: String,
    /// Time window sent with every interest-over-time request.
    pub trends_timeframe: String,
    /// Maximum comparison-set size per interest-over-time request.
    pub trends_batch_size: usize,
    /// Base URL of the marketplace listing search page.
    pub marketplace_base_url: String,
    /// Politeness delay bounds between outbound sub-batch requests, seconds.
    pub delay_min_secs: u64,
    pub delay_max_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
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

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("configuration validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("keyword cache io error for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("keyword cache parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

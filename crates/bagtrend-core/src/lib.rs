//! Core types and configuration for the bagtrend collection pipeline.
//!
//! Defines the keyword categories and their remote table names, the layered
//! keyword resolution chain (local cache file, remote table, hardcoded
//! defaults), and the environment-driven application configuration shared by
//! the fetcher and store crates.

pub mod app_config;
pub mod categories;
pub mod config;
pub mod error;
pub mod keywords;

pub use app_config::{AppConfig, CredentialSource};
pub use categories::{Category, ERROR_TABLE, KEYWORD_TABLE, PRICE_TABLE};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{CacheError, ConfigError};
pub use keywords::{
    resolve_keywords, resolve_keywords_with_provenance, CacheFileSource, DefaultKeywords,
    KeywordCacheFile, KeywordSet, KeywordSource,
};

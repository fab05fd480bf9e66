//! Keyword configuration commands.
//!
//! `sync` is the out-of-band step that snapshots the remote keyword table
//! into the local cache file, so collection runs can resolve keywords without
//! a remote round trip. `show` prints the resolved set with provenance.

use chrono::Utc;
use clap::Subcommand;

use bagtrend_core::{
    resolve_keywords_with_provenance, AppConfig, CacheFileSource, Category, DefaultKeywords,
    KeywordCacheFile, KeywordSet, KeywordSource,
};
use bagtrend_sheets::{resolve_credentials, SheetKeywordSource, SheetStore};

/// Sub-commands available under `keywords`.
#[derive(Debug, Subcommand)]
pub enum KeywordCommands {
    /// Snapshot the remote keyword table into the local cache file
    Sync,
    /// Print the resolved keyword set and where each category came from
    Show,
}

pub(crate) async fn handle(cmd: KeywordCommands, config: &AppConfig) -> anyhow::Result<()> {
    match cmd {
        KeywordCommands::Sync => run_sync(config).await,
        KeywordCommands::Show => run_show(config).await,
    }
}

/// Read the remote keyword table and rewrite the local cache file.
///
/// Categories absent from the remote table are written as empty lists; the
/// resolver falls past them to the defaults at collection time.
///
/// # Errors
///
/// Returns an error if credentials cannot be resolved, the store client
/// cannot be built, or the cache file cannot be written.
async fn run_sync(config: &AppConfig) -> anyhow::Result<()> {
    let credentials = resolve_credentials(&config.credential_source)?;
    let store = SheetStore::new(
        &config.store_base_url,
        credentials,
        config.request_timeout_secs,
        &config.user_agent,
    )?;

    let remote = SheetKeywordSource::new(&store);
    let mut set = KeywordSet::default();
    for category in Category::ALL {
        set.set(
            category,
            remote.keywords_for(category).await.unwrap_or_default(),
        );
    }

    let synced_at = Utc::now();
    let cache = KeywordCacheFile::new(set, synced_at);
    cache.save(&config.keyword_cache_path)?;

    let total: usize = Category::ALL
        .iter()
        .map(|c| cache.keywords.get(*c).len())
        .sum();
    println!(
        "synced {total} keywords to {} at {synced_at}",
        config.keyword_cache_path.display()
    );
    Ok(())
}

/// Resolve the keyword set the same way a collection run would and print it.
///
/// A store that cannot be reached (or credentials that do not resolve) only
/// drops the remote layer: the cache file and defaults still answer.
async fn run_show(config: &AppConfig) -> anyhow::Result<()> {
    let cache = CacheFileSource::open(&config.keyword_cache_path);
    if let Some(synced_at) = cache.synced_at() {
        println!("cache synced at {synced_at}");
    } else {
        println!("no usable keyword cache");
    }

    // A store that cannot be built only drops the remote layer — the cache
    // file and defaults still answer.
    let store = build_store(config);
    let remote = store.as_ref().map(SheetKeywordSource::new);

    let defaults = DefaultKeywords;
    let mut sources: Vec<&dyn KeywordSource> = vec![&cache];
    if let Some(remote) = &remote {
        sources.push(remote);
    }
    sources.push(&defaults);

    for (category, source, keywords) in resolve_keywords_with_provenance(&sources).await {
        println!("{category} [{source}] ({}):", keywords.len());
        for keyword in keywords {
            println!("  {keyword}");
        }
    }
    Ok(())
}

fn build_store(config: &AppConfig) -> Option<SheetStore> {
    let credentials = match resolve_credentials(&config.credential_source) {
        Ok(credentials) => credentials,
        Err(e) => {
            tracing::warn!(error = %e, "store credentials unavailable");
            return None;
        }
    };
    match SheetStore::new(
        &config.store_base_url,
        credentials,
        config.request_timeout_secs,
        &config.user_agent,
    ) {
        Ok(store) => Some(store),
        Err(e) => {
            tracing::warn!(error = %e, "store client construction failed");
            None
        }
    }
}

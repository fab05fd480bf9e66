//! Collection run orchestration.
//!
//! A run resolves the keyword snapshot once, then walks the trend categories
//! in fixed order and finishes with the price track. Failures inside a
//! category are caught, routed to the error table, and never stop the walk —
//! a run always reaches its summary. Trend tables get full-replace
//! persistence; the price table only ever grows.

use chrono::Utc;
use clap::Subcommand;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use bagtrend_core::{
    resolve_keywords, AppConfig, CacheFileSource, Category, DefaultKeywords, KeywordSet,
    PRICE_TABLE,
};
use bagtrend_scraper::{DelayRange, MarketplaceClient, TrendsClient};
use bagtrend_sheets::{resolve_credentials, CellValue, SheetKeywordSource, SheetStore};

const TREND_HEADERS: [&str; 4] = ["date", "keyword", "interest", "scraped_at"];
const PRICE_HEADERS: [&str; 4] = ["query", "title", "price", "date_scraped"];

/// Sub-commands available under `collect`.
#[derive(Debug, Subcommand)]
pub enum CollectCommands {
    /// Fetch fresh signals for every category and persist them
    Run {
        /// Restrict the run to a single trend category (skips the price track)
        #[arg(long)]
        category: Option<String>,

        /// Resolve keywords and print the plan without fetching or writing
        #[arg(long)]
        dry_run: bool,
    },
}

pub(crate) async fn handle(cmd: CollectCommands, config: &AppConfig) -> anyhow::Result<()> {
    match cmd {
        CollectCommands::Run { category, dry_run } => {
            let filter = category
                .as_deref()
                .map(str::parse::<Category>)
                .transpose()
                .map_err(anyhow::Error::msg)?;
            run_collect(config, filter, dry_run).await
        }
    }
}

/// Execute one collection run.
///
/// With `category_filter` set, only that trend category is collected and the
/// price track is skipped. `dry_run` stops after keyword resolution.
///
/// # Errors
///
/// Returns an error only for setup failures (credentials, client
/// construction). Once the run is underway every per-category failure
/// degrades and is logged; the run itself completes.
pub(crate) async fn run_collect(
    config: &AppConfig,
    category_filter: Option<Category>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let credentials = resolve_credentials(&config.credential_source)?;
    let store = SheetStore::new(
        &config.store_base_url,
        credentials,
        config.request_timeout_secs,
        &config.user_agent,
    )?;

    let cache = CacheFileSource::open(&config.keyword_cache_path);
    if cache.synced_at().is_none() {
        tracing::info!(
            path = %config.keyword_cache_path.display(),
            "no usable keyword cache; resolution will go remote"
        );
    }
    let remote = SheetKeywordSource::new(&store);
    let keyword_set = resolve_keywords(&[&cache, &remote, &DefaultKeywords]).await;

    let categories: Vec<Category> =
        category_filter.map_or_else(|| Category::ALL.to_vec(), |c| vec![c]);

    if dry_run {
        println!("dry-run: would collect {} categories", categories.len());
        for category in &categories {
            let keywords = keyword_set.get(*category);
            println!(
                "  {category} -> {} ({} keywords)",
                category.table_name(),
                keywords.len()
            );
        }
        if category_filter.is_none() {
            println!(
                "  price track -> {PRICE_TABLE} ({} queries)",
                keyword_set.get(Category::VintageBrands).len()
            );
        }
        return Ok(());
    }

    let delay = DelayRange::new(config.delay_min_secs, config.delay_max_secs);
    let trends = TrendsClient::new(
        &config.trends_base_url,
        &config.trends_timeframe,
        config.trends_batch_size,
        delay,
        config.request_timeout_secs,
        &config.user_agent,
    )?;

    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    tracing::info!(%run_id, categories = categories.len(), "starting collection run");

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received; cancelling run");
            signal_cancel.cancel();
        }
    });

    let mut trend_rows: usize = 0;
    let mut persisted: usize = 0;
    let mut skipped: usize = 0;

    for category in &categories {
        if cancel.is_cancelled() {
            tracing::info!("run cancelled; skipping remaining categories");
            break;
        }
        match collect_trend_category(&store, &trends, *category, &keyword_set, started_at, &cancel)
            .await
        {
            Some(rows) => {
                trend_rows += rows;
                persisted += 1;
            }
            None => skipped += 1,
        }
    }

    let price_rows = if category_filter.is_none() && !cancel.is_cancelled() {
        collect_prices(config, &store, &keyword_set, delay, &cancel).await
    } else {
        0
    };

    println!(
        "run {run_id}: {trend_rows} trend rows across {persisted} categories ({skipped} skipped), {price_rows} price rows appended"
    );
    Ok(())
}

/// Fetch one trend category and replace its table with the fresh window.
///
/// Returns the number of rows written, or `None` when the category was
/// skipped — an empty fetch leaves the previous run's table untouched, so a
/// broken source never erases data that was good yesterday.
async fn collect_trend_category(
    store: &SheetStore,
    trends: &TrendsClient,
    category: Category,
    keyword_set: &KeywordSet,
    started_at: chrono::DateTime<Utc>,
    cancel: &CancellationToken,
) -> Option<usize> {
    let keywords = keyword_set.get(category);
    tracing::info!(%category, keywords = keywords.len(), "fetching trend category");

    let outcome = trends.fetch_category(keywords, cancel).await;
    for message in &outcome.errors {
        store.log_error(message).await;
    }

    if outcome.records.is_empty() {
        tracing::warn!(%category, "category produced no data; leaving its table untouched");
        return None;
    }

    let rows: Vec<Vec<CellValue>> = outcome
        .records
        .iter()
        .map(|r| {
            vec![
                CellValue::from(r.date),
                CellValue::from(r.keyword.clone()),
                CellValue::from(r.interest),
                CellValue::from(started_at),
            ]
        })
        .collect();

    if store
        .clear_and_write(category.table_name(), &TREND_HEADERS, &rows)
        .await
    {
        tracing::info!(%category, rows = rows.len(), "trend table replaced");
        Some(rows.len())
    } else {
        tracing::warn!(%category, "trend table write degraded; counting category as skipped");
        None
    }
}

/// Run the price track: one marketplace query per vintage-brand keyword,
/// appended to the accumulating price table. No clear — history grows.
async fn collect_prices(
    config: &AppConfig,
    store: &SheetStore,
    keyword_set: &KeywordSet,
    delay: DelayRange,
    cancel: &CancellationToken,
) -> usize {
    let market = match MarketplaceClient::new(
        &config.marketplace_base_url,
        delay,
        config.request_timeout_secs,
        &config.user_agent,
    ) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "marketplace client construction failed; skipping price track");
            store
                .log_error(&format!("price track skipped: {e}"))
                .await;
            return 0;
        }
    };

    let queries = keyword_set.get(Category::VintageBrands);
    tracing::info!(queries = queries.len(), "fetching sold-listing prices");

    let outcome = market.fetch_category(queries, cancel).await;
    for message in &outcome.errors {
        store.log_error(message).await;
    }

    if outcome.records.is_empty() {
        tracing::warn!("price track produced no listings");
        return 0;
    }

    let rows: Vec<Vec<CellValue>> = outcome
        .records
        .iter()
        .map(|l| {
            vec![
                CellValue::from(l.query.clone()),
                CellValue::from(l.title.clone()),
                CellValue::from(l.price),
                CellValue::from(l.date_scraped),
            ]
        })
        .collect();

    if store.append_rows(PRICE_TABLE, &rows, &PRICE_HEADERS).await {
        tracing::info!(rows = rows.len(), "price rows appended");
        rows.len()
    } else {
        tracing::warn!("price table append degraded");
        0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[path = "collect_test.rs"]
mod tests;

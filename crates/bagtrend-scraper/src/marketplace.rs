//! Marketplace sold-listings fetcher.
//!
//! One request per query (no sub-batching): the search page is asked for
//! completed, sold listings sorted by end date, and the returned document is
//! parsed by structural selectors. Placeholder entries are skipped, and a
//! listing whose price text cannot be parsed keeps a null price rather than
//! being discarded.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::Utc;
use regex::Regex;
use scraper::{Html, Selector};
use tokio_util::sync::CancellationToken;

use crate::batch::{polite_delay, DelayRange};
use crate::error::FetchError;
use crate::types::ListingRecord;

/// Only the first page of results matters; deeper entries are stale.
const MAX_LISTINGS: usize = 20;

static PRICE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9][0-9,]*\.?[0-9]*").expect("price regex is valid"));

struct Selectors {
    item: Selector,
    title: Selector,
    price: Selector,
}

impl Selectors {
    fn compile() -> Result<Self, FetchError> {
        let parse = |s: &str| {
            Selector::parse(s).map_err(|_| FetchError::Selector(s.to_string()))
        };
        Ok(Self {
            item: parse(".s-item")?,
            title: parse(".s-item__title")?,
            price: parse(".s-item__price")?,
        })
    }
}

/// Result of fetching one batch of queries: the surviving listings plus one
/// message per failed query, for the caller to report.
#[derive(Debug, Default)]
pub struct ListingsFetch {
    pub records: Vec<ListingRecord>,
    pub errors: Vec<String>,
}

/// Client for the marketplace sold-listings search page.
pub struct MarketplaceClient {
    client: reqwest::Client,
    base_url: String,
    delay: DelayRange,
    selectors: Selectors,
}

impl MarketplaceClient {
    /// Creates a `MarketplaceClient` with configured timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`FetchError::Selector`] if a structural
    /// selector fails to compile.
    pub fn new(
        base_url: &str,
        delay: DelayRange,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            delay,
            selectors: Selectors::compile()?,
        })
    }

    /// Fetch sold listings for a batch of queries, one request per query.
    ///
    /// Pauses politely between queries. A failing query is collected as a
    /// message and never aborts the batch; cancelling the run ends the batch
    /// early with whatever was already collected.
    pub async fn fetch_category(
        &self,
        queries: &[String],
        cancel: &CancellationToken,
    ) -> ListingsFetch {
        let mut outcome = ListingsFetch::default();
        let query_count = queries.len();

        for (index, query) in queries.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::info!(
                    query = index + 1,
                    query_count,
                    "run cancelled; abandoning remaining queries"
                );
                break;
            }
            match self.search_sold_listings(query).await {
                Ok(listings) => outcome.records.extend(listings),
                Err(e) => {
                    tracing::warn!(query = %query, error = %e, "listing fetch failed; continuing");
                    outcome
                        .errors
                        .push(format!("listing fetch failed for \"{query}\": {e}"));
                }
            }
            if index + 1 < query_count && !polite_delay(self.delay, cancel).await {
                break;
            }
        }

        outcome
    }

    /// Search sold, completed listings for one query, newest first.
    ///
    /// Returns the parsed listings from the first [`MAX_LISTINGS`] result
    /// entries. Each record is stamped with the scrape time.
    ///
    /// # Errors
    ///
    /// - [`FetchError::UnexpectedStatus`] — any non-2xx status.
    /// - [`FetchError::Http`] — network or TLS failure.
    pub async fn search_sold_listings(
        &self,
        query: &str,
    ) -> Result<Vec<ListingRecord>, FetchError> {
        let url = self.search_url(query)?;
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }
        let body = response.text().await?;
        let listings = self.parse_listings(&body, query);
        tracing::debug!(query, count = listings.len(), "parsed sold listings");
        Ok(listings)
    }

    /// Builds the search URL selecting only completed, sold listings sorted
    /// by end date.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidBaseUrl`] if the configured base cannot
    /// be parsed as a URL.
    fn search_url(&self, query: &str) -> Result<String, FetchError> {
        let mut url =
            reqwest::Url::parse(&self.base_url).map_err(|e| FetchError::InvalidBaseUrl {
                base_url: self.base_url.clone(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("_nkw", query)
            .append_pair("LH_Sold", "1")
            .append_pair("LH_Complete", "1")
            .append_pair("_sop", "13");
        Ok(url.to_string())
    }

    fn parse_listings(&self, html: &str, query: &str) -> Vec<ListingRecord> {
        let document = Html::parse_document(html);
        let date_scraped = Utc::now();
        let mut listings = Vec::new();

        for item in document.select(&self.selectors.item).take(MAX_LISTINGS) {
            let Some(title_el) = item.select(&self.selectors.title).next() else {
                continue;
            };
            let Some(price_el) = item.select(&self.selectors.price).next() else {
                continue;
            };
            let title = collapse_text(title_el.text());
            if title.is_empty() || title.contains("Shop on eBay") {
                continue;
            }
            let price = parse_price(&collapse_text(price_el.text()));
            listings.push(ListingRecord {
                query: query.to_string(),
                title,
                price,
                date_scraped,
            });
        }

        listings
    }
}

fn collapse_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.collect::<String>().trim().to_string()
}

/// Extract a numeric price from listing price text.
///
/// A range such as `"$120.00 to $140.00"` collapses to the arithmetic mean
/// of its two bounds; a single value is taken as-is; text without digits
/// yields `None`. Thousands separators are stripped.
#[must_use]
pub fn parse_price(price_text: &str) -> Option<f64> {
    let mut numbers = PRICE_NUMBER
        .find_iter(price_text)
        .filter_map(|m| m.as_str().replace(',', "").parse::<f64>().ok());
    let first = numbers.next()?;
    if price_text.to_lowercase().contains("to") {
        if let Some(second) = numbers.next() {
            return Some((first + second) / 2.0);
        }
    }
    Some(first)
}

#[cfg(test)]
#[path = "marketplace_test.rs"]
mod tests;

//! Search-interest batch fetcher.
//!
//! The upstream API compares at most a handful of keywords per request, so a
//! category's keyword list is partitioned into fixed-size sub-batches, each
//! fetched with one request and a randomized politeness pause before the
//! next. A failing sub-batch is logged and skipped; the category degrades to
//! whatever the surviving sub-batches produced.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::batch::{polite_delay, DelayRange};
use crate::error::FetchError;
use crate::types::InterestRecord;

/// Result of fetching one category: the surviving long-format records plus
/// one message per failed sub-batch, for the caller to report.
#[derive(Debug, Default)]
pub struct CategoryFetch {
    pub records: Vec<InterestRecord>,
    pub errors: Vec<String>,
}

/// Client for the search-interest API's interest-over-time endpoint.
pub struct TrendsClient {
    client: reqwest::Client,
    base_url: String,
    timeframe: String,
    batch_size: usize,
    delay: DelayRange,
}

/// Wide response shape: one entry per date, one value per compared keyword.
#[derive(Debug, Deserialize)]
struct InterestResponse {
    #[serde(default)]
    timeline: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimelinePoint {
    date: NaiveDate,
    #[serde(default)]
    values: BTreeMap<String, f64>,
    /// Discarded: trailing partial observations are not flagged downstream.
    #[serde(default, rename = "is_partial")]
    _is_partial: bool,
}

impl TrendsClient {
    /// Creates a `TrendsClient` with configured timeout and `User-Agent`.
    ///
    /// `batch_size` is the maximum comparison-set size per request; values
    /// below 1 are treated as 1.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        timeframe: &str,
        batch_size: usize,
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
            base_url: base_url.trim_end_matches('/').to_string(),
            timeframe: timeframe.to_string(),
            batch_size: batch_size.max(1),
            delay,
        })
    }

    /// Fetch long-format interest records for one keyword category.
    ///
    /// Issues `ceil(len / batch_size)` requests, pausing politely between
    /// sub-batches. Sub-batch failures are collected as messages and never
    /// abort the category; if every sub-batch fails the records are simply
    /// empty. Exact-duplicate records are dropped. Cancelling the run ends
    /// the category early with whatever was already collected.
    pub async fn fetch_category(
        &self,
        keywords: &[String],
        cancel: &CancellationToken,
    ) -> CategoryFetch {
        let mut outcome = CategoryFetch::default();
        let batches: Vec<&[String]> = keywords.chunks(self.batch_size).collect();
        let batch_count = batches.len();

        for (index, batch) in batches.into_iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::info!(
                    batch = index + 1,
                    batch_count,
                    "run cancelled; abandoning remaining sub-batches"
                );
                break;
            }
            match self.fetch_interest_over_time(batch).await {
                Ok(records) => {
                    tracing::debug!(
                        batch = index + 1,
                        batch_count,
                        count = records.len(),
                        "collected interest records"
                    );
                    outcome.records.extend(records);
                }
                Err(e) => {
                    tracing::warn!(
                        batch = index + 1,
                        batch_count,
                        keywords = ?batch,
                        error = %e,
                        "sub-batch fetch failed; continuing"
                    );
                    outcome
                        .errors
                        .push(format!("interest fetch failed for {batch:?}: {e}"));
                }
            }
            if index + 1 < batch_count && !polite_delay(self.delay, cancel).await {
                break;
            }
        }

        dedup_records(&mut outcome.records);
        outcome
    }

    /// One sub-batch request: at most `batch_size` comparison keywords.
    ///
    /// # Errors
    ///
    /// - [`FetchError::UnexpectedStatus`] — any non-2xx status.
    /// - [`FetchError::Http`] — network or TLS failure.
    /// - [`FetchError::Deserialize`] — response body is not the wide shape.
    async fn fetch_interest_over_time(
        &self,
        keywords: &[String],
    ) -> Result<Vec<InterestRecord>, FetchError> {
        let url = self.interest_url(keywords)?;
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        let parsed: InterestResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Deserialize {
                context: format!("interest response for {keywords:?}"),
                source: e,
            })?;

        Ok(reshape(keywords, parsed))
    }

    fn interest_url(&self, keywords: &[String]) -> Result<String, FetchError> {
        let base = format!("{}/api/interest_over_time", self.base_url);
        let mut url = reqwest::Url::parse(&base).map_err(|e| FetchError::InvalidBaseUrl {
            base_url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut()
            .append_pair("keywords", &keywords.join(","))
            .append_pair("timeframe", &self.timeframe)
            .append_pair("geo", "")
            .append_pair("gprop", "");
        Ok(url.to_string())
    }
}

/// Reshape a wide response (one row per date, one column per keyword) into
/// long-format records: one row per (date, keyword, value).
///
/// Only the requested keywords are taken from each row — stray columns are
/// ignored — and a keyword missing from a row produces no record for that
/// date. Values are clamped into the source's nominal `[0, 100]` scale.
fn reshape(keywords: &[String], response: InterestResponse) -> Vec<InterestRecord> {
    let mut records = Vec::new();
    for point in response.timeline {
        for keyword in keywords {
            if let Some(value) = point.values.get(keyword) {
                records.push(InterestRecord {
                    date: point.date,
                    keyword: keyword.clone(),
                    interest: value.clamp(0.0, 100.0),
                });
            }
        }
    }
    records
}

/// Drop exact-duplicate records, keeping first occurrences in order.
fn dedup_records(records: &mut Vec<InterestRecord>) {
    let mut seen: HashSet<(NaiveDate, String, u64)> = HashSet::new();
    records.retain(|r| seen.insert((r.date, r.keyword.clone(), r.interest.to_bits())));
}

#[cfg(test)]
#[path = "trends_test.rs"]
mod tests;

use chrono::{DateTime, NaiveDate, Utc};

/// One long-format search-interest observation: a score for one keyword on
/// one calendar day. Scores are normalized to `[0, 100]` by the source.
#[derive(Debug, Clone, PartialEq)]
pub struct InterestRecord {
    pub date: NaiveDate,
    pub keyword: String,
    pub interest: f64,
}

/// One marketplace sold listing captured for a search query.
///
/// `price` is `None` when the listing's price text could not be parsed; the
/// record is kept anyway. Listings repeating across runs are intentionally
/// not deduplicated — the store accumulates price history.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    pub query: String,
    pub title: String,
    pub price: Option<f64>,
    pub date_scraped: DateTime<Utc>,
}

//! Batch fetchers for the pipeline's external signal sources.
//!
//! One client per source: [`TrendsClient`] for the search-interest API
//! (sub-batched, throttled, wide-to-long reshaping) and
//! [`MarketplaceClient`] for the marketplace sold-listings HTML source.
//! Both share the capability shape "keywords in, records out" and degrade
//! per-batch failures to partial results instead of hard errors.

pub mod batch;
pub mod error;
pub mod marketplace;
pub mod trends;
pub mod types;

pub use batch::DelayRange;
pub use error::FetchError;
pub use marketplace::{ListingsFetch, MarketplaceClient};
pub use trends::{CategoryFetch, TrendsClient};
pub use types::{InterestRecord, ListingRecord};

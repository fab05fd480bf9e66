//! Remote tabular store adapter for the bagtrend pipeline.
//!
//! Talks to a spreadsheet-backed HTTPS API: ensures named tables exist,
//! reads tables as rows, appends row batches, clears-and-rewrites tables,
//! and best-effort logs operational errors into a dedicated error table.
//! The adapter owns all network and credential state and knows nothing about
//! what the data means.
//!
//! Every public operation degrades on failure — reads return empty results,
//! writes report `false` — and routes the underlying error through the error
//! table, so a remote-store outage turns individual operations into no-ops
//! instead of crashing a collection run.

pub mod auth;
pub mod cell;
pub mod client;
pub mod error;
pub mod keywords;

pub use auth::{resolve_credentials, SheetCredentials};
pub use cell::CellValue;
pub use client::SheetStore;
pub use error::StoreError;
pub use keywords::SheetKeywordSource;

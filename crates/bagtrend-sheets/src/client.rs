//! Spreadsheet-backed tabular store client.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use bagtrend_core::ERROR_TABLE;

use crate::auth::SheetCredentials;
use crate::cell::CellValue;
use crate::error::StoreError;

/// Header row written when the error table is first created.
const ERROR_HEADERS: [&str; 2] = ["timestamp", "message"];

/// Client for the remote tabular store.
///
/// Tables are named ranges in one spreadsheet document; a table is a header
/// row of column names followed by homogeneous string-typed data rows.
///
/// The client holds no session state — every request carries its own bearer
/// header, so operations are independently retryable by re-invoking them.
/// Public operations never propagate errors: reads degrade to empty results,
/// writes to a `false` return, and the underlying error is routed to the
/// error table via [`SheetStore::log_error`].
pub struct SheetStore {
    client: reqwest::Client,
    base_url: String,
    credentials: SheetCredentials,
}

#[derive(Serialize)]
struct ValueRangeBody {
    values: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Serialize)]
struct BatchUpdateBody {
    requests: Vec<AddSheetRequest>,
}

#[derive(Serialize)]
struct AddSheetRequest {
    #[serde(rename = "addSheet")]
    add_sheet: AddSheet,
}

#[derive(Serialize)]
struct AddSheet {
    properties: SheetProperties,
}

#[derive(Serialize)]
struct SheetProperties {
    title: String,
}

impl SheetStore {
    /// Creates a `SheetStore` with configured timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        base_url: &str,
        credentials: SheetCredentials,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Ensure a table exists, creating it with the given header row if absent.
    ///
    /// Idempotent. Concurrent creators may race on the create call; the loser
    /// observes an "already exists" response and converges to the existing
    /// table, whose header row is whatever the winner wrote.
    pub async fn ensure_table(&self, name: &str, headers: &[&str]) -> bool {
        match self.try_ensure_table(name, headers).await {
            Ok(()) => true,
            Err(e) => {
                self.report(name, "ensuring", &e).await;
                false
            }
        }
    }

    /// Read a table as rows keyed by its header row.
    ///
    /// A missing table yields an empty result, not an error. Rows shorter
    /// than the header are padded with empty cells.
    pub async fn read_table(&self, name: &str) -> Vec<HashMap<String, String>> {
        let values = match self.try_read_values(name).await {
            Ok(Some(values)) => values,
            Ok(None) => return Vec::new(),
            Err(e) => {
                self.report(name, "reading", &e).await;
                return Vec::new();
            }
        };

        let mut rows = values.into_iter();
        let Some(header) = rows.next() else {
            return Vec::new();
        };
        rows.map(|row| {
            header
                .iter()
                .enumerate()
                .map(|(i, column)| (column.clone(), row.get(i).cloned().unwrap_or_default()))
                .collect()
        })
        .collect()
    }

    /// Read a table as its raw cell grid, header row included.
    ///
    /// Used for column-oriented tables where the header-keyed view of
    /// [`SheetStore::read_table`] would lose column positions.
    pub async fn read_table_values(&self, name: &str) -> Vec<Vec<String>> {
        match self.try_read_values(name).await {
            Ok(Some(values)) => values,
            Ok(None) => Vec::new(),
            Err(e) => {
                self.report(name, "reading", &e).await;
                Vec::new()
            }
        }
    }

    /// Append rows to a table, creating it (and writing the header row when
    /// the table is empty) as needed.
    ///
    /// All data rows travel in a single append call — appending N rows costs
    /// a constant number of round trips, not N.
    pub async fn append_rows(&self, name: &str, rows: &[Vec<CellValue>], headers: &[&str]) -> bool {
        if rows.is_empty() {
            return true;
        }
        match self.try_append_rows(name, rows, headers).await {
            Ok(()) => true,
            Err(e) => {
                self.report(name, "appending to", &e).await;
                false
            }
        }
    }

    /// Remove all rows from a table. A missing table counts as success —
    /// there is nothing to clear.
    pub async fn clear_table(&self, name: &str) -> bool {
        match self.try_clear(name).await {
            Ok(()) | Err(StoreError::TableNotFound(_)) => true,
            Err(e) => {
                self.report(name, "clearing", &e).await;
                false
            }
        }
    }

    /// Clear a table and rewrite it with a header row plus fresh data rows.
    ///
    /// Replace semantics: after a successful call the table contains exactly
    /// the given dataset, however many times the call is repeated.
    pub async fn clear_and_write(
        &self,
        name: &str,
        headers: &[&str],
        rows: &[Vec<CellValue>],
    ) -> bool {
        match self.try_clear_and_write(name, headers, rows).await {
            Ok(()) => true,
            Err(e) => {
                self.report(name, "rewriting", &e).await;
                false
            }
        }
    }

    /// Best-effort append of an error message to the error table.
    ///
    /// Never fails and never blocks the caller's control flow: if the write
    /// itself fails the failure is discarded, so error reporting cannot loop.
    pub async fn log_error(&self, message: &str) {
        let entry = vec![Utc::now().to_rfc3339(), message.to_string()];
        if let Err(e) = self.try_log_error(entry).await {
            tracing::debug!(error = %e, "error-table write failed; discarding");
        }
    }

    async fn report(&self, table: &str, op: &str, err: &StoreError) {
        tracing::warn!(table, error = %err, "store operation degraded while {op} table");
        self.log_error(&format!("error {op} {table}: {err}")).await;
    }

    async fn try_ensure_table(&self, name: &str, headers: &[&str]) -> Result<(), StoreError> {
        if self.try_read_values(name).await?.is_some() {
            return Ok(());
        }
        let created = self.try_add_sheet(name).await?;
        if created && !headers.is_empty() {
            self.try_append(name, vec![to_row(headers)]).await?;
        }
        Ok(())
    }

    async fn try_append_rows(
        &self,
        name: &str,
        rows: &[Vec<CellValue>],
        headers: &[&str],
    ) -> Result<(), StoreError> {
        let existing = self.try_read_values(name).await?;
        let mut payload: Vec<Vec<String>> = Vec::with_capacity(rows.len() + 1);
        match &existing {
            Some(values) if !values.is_empty() => {}
            other => {
                if other.is_none() {
                    self.try_add_sheet(name).await?;
                }
                if !headers.is_empty() {
                    payload.push(to_row(headers));
                }
            }
        }
        payload.extend(rows.iter().map(|row| {
            row.iter()
                .cloned()
                .map(CellValue::into_cell)
                .collect::<Vec<String>>()
        }));
        self.try_append(name, payload).await
    }

    async fn try_clear_and_write(
        &self,
        name: &str,
        headers: &[&str],
        rows: &[Vec<CellValue>],
    ) -> Result<(), StoreError> {
        match self.try_clear(name).await {
            Ok(()) => {}
            Err(StoreError::TableNotFound(_)) => {
                self.try_add_sheet(name).await?;
            }
            Err(e) => return Err(e),
        }
        let mut payload: Vec<Vec<String>> = Vec::with_capacity(rows.len() + 1);
        payload.push(to_row(headers));
        payload.extend(rows.iter().map(|row| {
            row.iter()
                .cloned()
                .map(CellValue::into_cell)
                .collect::<Vec<String>>()
        }));
        self.try_append(name, payload).await
    }

    async fn try_log_error(&self, entry: Vec<String>) -> Result<(), StoreError> {
        self.try_ensure_table(ERROR_TABLE, &ERROR_HEADERS).await?;
        self.try_append(ERROR_TABLE, vec![entry]).await
    }

    async fn try_read_values(&self, name: &str) -> Result<Option<Vec<Vec<String>>>, StoreError> {
        let url = self.values_url(name);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.credentials.access_token)
            .send()
            .await?;
        let status = response.status();

        // The store answers an unknown table name with a range-parse error.
        if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StoreError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        let range: ValueRange =
            serde_json::from_str(&body).map_err(|e| StoreError::Deserialize {
                context: format!("values of {name}"),
                source: e,
            })?;
        Ok(Some(range.values))
    }

    async fn try_append(&self, name: &str, values: Vec<Vec<String>>) -> Result<(), StoreError> {
        let url = format!("{}:append?valueInputOption=RAW", self.values_url(name));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.credentials.access_token)
            .json(&ValueRangeBody { values })
            .send()
            .await?;
        expect_success(name, &url, response.status())
    }

    async fn try_clear(&self, name: &str) -> Result<(), StoreError> {
        let url = format!("{}:clear", self.values_url(name));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.credentials.access_token)
            .send()
            .await?;
        expect_success(name, &url, response.status())
    }

    /// Create a table. Returns `false` when the table already exists — the
    /// store rejects duplicate titles, which racing creators rely on to
    /// converge.
    async fn try_add_sheet(&self, name: &str) -> Result<bool, StoreError> {
        let url = format!(
            "{}/spreadsheets/{}:batchUpdate",
            self.base_url, self.credentials.document_id
        );
        let body = BatchUpdateBody {
            requests: vec![AddSheetRequest {
                add_sheet: AddSheet {
                    properties: SheetProperties {
                        title: name.to_string(),
                    },
                },
            }],
        };
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.credentials.access_token)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST {
            return Ok(false);
        }
        if !status.is_success() {
            return Err(StoreError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }
        Ok(true)
    }

    fn values_url(&self, name: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}",
            self.base_url, self.credentials.document_id, name
        )
    }
}

fn expect_success(name: &str, url: &str, status: reqwest::StatusCode) -> Result<(), StoreError> {
    if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::NOT_FOUND {
        return Err(StoreError::TableNotFound(name.to_string()));
    }
    if !status.is_success() {
        return Err(StoreError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(())
}

fn to_row(headers: &[&str]) -> Vec<String> {
    headers.iter().map(|h| (*h).to_string()).collect()
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;

//! Remote keyword table as a resolution layer.

use async_trait::async_trait;
use bagtrend_core::{Category, KeywordSource, KEYWORD_TABLE};
use tokio::sync::OnceCell;

use crate::client::SheetStore;

/// Second resolution layer: the remote keyword configuration table.
///
/// The table is column-oriented — one category per column, in the fixed
/// order given by [`Category::keyword_column`] — so columns may have unequal
/// lengths. The grid is fetched lazily, on the first category the cache
/// layer could not answer, and at most once per snapshot; when every
/// category is served from the cache the table is never read at all. A
/// missing table or a degraded read leaves the grid empty and this source
/// answers `None`.
pub struct SheetKeywordSource<'a> {
    store: Option<&'a SheetStore>,
    grid: OnceCell<Vec<Vec<String>>>,
}

impl<'a> SheetKeywordSource<'a> {
    #[must_use]
    pub fn new(store: &'a SheetStore) -> Self {
        Self {
            store: Some(store),
            grid: OnceCell::new(),
        }
    }

    /// A source over an already-materialized grid; no store reads happen.
    #[must_use]
    pub fn from_grid(grid: Vec<Vec<String>>) -> Self {
        Self {
            store: None,
            grid: OnceCell::new_with(Some(grid)),
        }
    }

    async fn grid(&self) -> &[Vec<String>] {
        self.grid
            .get_or_init(|| async {
                match self.store {
                    Some(store) => store.read_table_values(KEYWORD_TABLE).await,
                    None => Vec::new(),
                }
            })
            .await
    }

    async fn column(&self, index: usize) -> Vec<String> {
        self.grid()
            .await
            .iter()
            .skip(1) // header row
            .filter_map(|row| row.get(index))
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl KeywordSource for SheetKeywordSource<'_> {
    fn name(&self) -> &'static str {
        "keyword-table"
    }

    async fn keywords_for(&self, category: Category) -> Option<Vec<String>> {
        let keywords = self.column(category.keyword_column()).await;
        if keywords.is_empty() {
            None
        } else {
            Some(keywords)
        }
    }
}

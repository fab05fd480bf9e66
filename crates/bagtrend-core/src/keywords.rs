//! Layered keyword configuration resolution.
//!
//! Keywords are resolved per category through an ordered chain of sources:
//! the local cache file written by an out-of-band sync, the remote keyword
//! table, and the hardcoded defaults. The first source with a non-empty
//! answer for a category wins; categories resolve independently, so a cache
//! that is missing one category does not force the other four to go remote.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::categories::Category;
use crate::CacheError;

/// One run's immutable keyword snapshot: an ordered keyword list per category.
///
/// Order is not semantically significant but is stable within a run so that
/// sub-batch numbering is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSet {
    pub brands: Vec<String>,
    pub vintage_brands: Vec<String>,
    pub colors: Vec<String>,
    pub styles: Vec<String>,
    pub textures: Vec<String>,
}

impl KeywordSet {
    #[must_use]
    pub fn get(&self, category: Category) -> &[String] {
        match category {
            Category::Brands => &self.brands,
            Category::VintageBrands => &self.vintage_brands,
            Category::Colors => &self.colors,
            Category::Styles => &self.styles,
            Category::Textures => &self.textures,
        }
    }

    pub fn set(&mut self, category: Category, keywords: Vec<String>) {
        match category {
            Category::Brands => self.brands = keywords,
            Category::VintageBrands => self.vintage_brands = keywords,
            Category::Colors => self.colors = keywords,
            Category::Styles => self.styles = keywords,
            Category::Textures => self.textures = keywords,
        }
    }
}

/// On-disk keyword cache, written by `keywords sync` and read as the first
/// resolution layer. Absence of the file is a valid, handled state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordCacheFile {
    #[serde(flatten)]
    pub keywords: KeywordSet,
    pub synced_at: DateTime<Utc>,
}

impl KeywordCacheFile {
    #[must_use]
    pub fn new(keywords: KeywordSet, synced_at: DateTime<Utc>) -> Self {
        Self { keywords, synced_at }
    }

    /// Read and parse the cache file.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, CacheError> {
        let raw = std::fs::read_to_string(path).map_err(|e| CacheError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write the cache file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if directories cannot be created or the file
    /// cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        let io_err = |e: std::io::Error| CacheError::Io {
            path: path.display().to_string(),
            source: e,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let body = serde_json::to_string_pretty(self)?;
        std::fs::write(path, body).map_err(|e| CacheError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }
}

/// One layer of the keyword resolution chain.
#[async_trait]
pub trait KeywordSource: Send + Sync {
    /// Short name used in logs and provenance output.
    fn name(&self) -> &'static str;

    /// Keywords for one category, or `None` when this layer has no answer.
    ///
    /// An empty `Vec` is treated the same as `None` by the resolver.
    async fn keywords_for(&self, category: Category) -> Option<Vec<String>>;
}

/// First resolution layer: the local cache file.
///
/// The file is read once at construction; an unreadable or absent file makes
/// this source answer `None` for every category.
pub struct CacheFileSource {
    cache: Option<KeywordCacheFile>,
}

impl CacheFileSource {
    #[must_use]
    pub fn open(path: &Path) -> Self {
        Self {
            cache: KeywordCacheFile::load(path).ok(),
        }
    }

    #[must_use]
    pub fn from_cache(cache: KeywordCacheFile) -> Self {
        Self { cache: Some(cache) }
    }

    /// When the cache was last synced, if a cache was loaded.
    #[must_use]
    pub fn synced_at(&self) -> Option<DateTime<Utc>> {
        self.cache.as_ref().map(|c| c.synced_at)
    }
}

#[async_trait]
impl KeywordSource for CacheFileSource {
    fn name(&self) -> &'static str {
        "cache-file"
    }

    async fn keywords_for(&self, category: Category) -> Option<Vec<String>> {
        let cache = self.cache.as_ref()?;
        let keywords = cache.keywords.get(category);
        if keywords.is_empty() {
            None
        } else {
            Some(keywords.to_vec())
        }
    }
}

/// Terminal resolution layer: the hardcoded per-category defaults.
pub struct DefaultKeywords;

#[async_trait]
impl KeywordSource for DefaultKeywords {
    fn name(&self) -> &'static str {
        "defaults"
    }

    async fn keywords_for(&self, category: Category) -> Option<Vec<String>> {
        Some(
            category
                .defaults()
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        )
    }
}

/// Resolve one immutable [`KeywordSet`] through the given source chain.
///
/// Each category is resolved independently: sources are tried in order and
/// the first non-empty answer wins. If every source comes up empty for a
/// category, the hardcoded defaults are used, so the returned set is never
/// empty in any category regardless of chain composition.
pub async fn resolve_keywords(sources: &[&dyn KeywordSource]) -> KeywordSet {
    let mut set = KeywordSet::default();
    for category in Category::ALL {
        let mut resolved = Vec::new();
        for source in sources {
            if let Some(keywords) = source.keywords_for(category).await {
                if !keywords.is_empty() {
                    resolved = keywords;
                    break;
                }
            }
        }
        if resolved.is_empty() {
            resolved = category
                .defaults()
                .iter()
                .map(|s| (*s).to_string())
                .collect();
        }
        set.set(category, resolved);
    }
    set
}

/// Resolve keywords and report which source answered each category.
///
/// Same semantics as [`resolve_keywords`]; used by `keywords show` to print
/// provenance alongside the resolved lists.
pub async fn resolve_keywords_with_provenance(
    sources: &[&dyn KeywordSource],
) -> Vec<(Category, &'static str, Vec<String>)> {
    let mut resolved = Vec::with_capacity(Category::ALL.len());
    for category in Category::ALL {
        let mut answer: Option<(&'static str, Vec<String>)> = None;
        for source in sources {
            if let Some(keywords) = source.keywords_for(category).await {
                if !keywords.is_empty() {
                    answer = Some((source.name(), keywords));
                    break;
                }
            }
        }
        let (name, keywords) = answer.unwrap_or_else(|| {
            (
                "defaults",
                category
                    .defaults()
                    .iter()
                    .map(|s| (*s).to_string())
                    .collect(),
            )
        });
        resolved.push((category, name, keywords));
    }
    resolved
}

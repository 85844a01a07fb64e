use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Version metadata for a stored page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    pub name: String,
    pub version: u32,
    pub author: Option<String>,
    pub last_modified: DateTime<Utc>,
}

/// Storage collaborator supplying page content and version metadata.
///
/// The pipeline calls this to fetch pre-save content and to commit post-save
/// content; persistence formats are the provider's business.
pub trait PageProvider: Send + Sync + 'static {
    /// Provider name used in diagnostics.
    fn provider_info(&self) -> &'static str;

    fn page_exists(&self, name: &str) -> bool;

    fn get_page_text(&self, name: &str) -> Result<Option<String>, AppError>;

    fn get_page_info(&self, name: &str) -> Result<Option<PageInfo>, AppError>;

    /// Commit new content for a page, creating it if absent. Returns the
    /// resulting version metadata.
    fn put_page_text(
        &self,
        name: &str,
        text: &str,
        author: Option<&str>,
    ) -> Result<PageInfo, AppError>;
}

struct StoredPage {
    text: String,
    info: PageInfo,
}

/// In-memory provider used by tests and the developer CLI.
#[derive(Default)]
pub struct MemoryPageProvider {
    pages: RwLock<HashMap<String, StoredPage>>,
}

impl MemoryPageProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PageProvider for MemoryPageProvider {
    fn provider_info(&self) -> &'static str {
        "memory"
    }

    fn page_exists(&self, name: &str) -> bool {
        self.pages
            .read()
            .map(|pages| pages.contains_key(name))
            .unwrap_or(false)
    }

    fn get_page_text(&self, name: &str) -> Result<Option<String>, AppError> {
        let pages = self.pages.read().map_err(poisoned)?;
        Ok(pages.get(name).map(|page| page.text.clone()))
    }

    fn get_page_info(&self, name: &str) -> Result<Option<PageInfo>, AppError> {
        let pages = self.pages.read().map_err(poisoned)?;
        Ok(pages.get(name).map(|page| page.info.clone()))
    }

    fn put_page_text(
        &self,
        name: &str,
        text: &str,
        author: Option<&str>,
    ) -> Result<PageInfo, AppError> {
        let mut pages = self.pages.write().map_err(poisoned)?;
        let version = pages.get(name).map(|page| page.info.version + 1).unwrap_or(1);
        let info = PageInfo {
            name: name.to_string(),
            version,
            author: author.map(str::to_string),
            last_modified: Utc::now(),
        };
        pages.insert(
            name.to_string(),
            StoredPage {
                text: text.to_string(),
                info: info.clone(),
            },
        );
        Ok(info)
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> AppError {
    AppError::new(
        ErrorCategory::ProviderError,
        "page store lock poisoned by a panicked writer",
    )
    .with_code("PAGE-LOCK-001")
}

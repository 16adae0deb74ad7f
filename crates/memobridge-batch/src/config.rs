//! Batch engine configuration.

use memobridge_core::defaults;

/// Configuration for candidate queries issued by the batch engine.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Page size for candidate queries. `None` issues a single unpaged query.
    pub page_size: Option<i64>,
    /// Also select archived notes. By default only normal notes are touched.
    pub include_archived: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            page_size: Some(defaults::BATCH_PAGE_SIZE),
            include_archived: false,
        }
    }
}

impl BatchConfig {
    /// Create configuration from environment variables.
    ///
    /// - `MEMOBRIDGE_BATCH_PAGE_SIZE`: page size, `0` disables paging
    /// - `MEMOBRIDGE_BATCH_INCLUDE_ARCHIVED`: `true`/`1` to include archived notes
    pub fn from_env() -> Self {
        let page_size = std::env::var("MEMOBRIDGE_BATCH_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .map(|v| if v > 0 { Some(v) } else { None })
            .unwrap_or(Some(defaults::BATCH_PAGE_SIZE));

        let include_archived = std::env::var("MEMOBRIDGE_BATCH_INCLUDE_ARCHIVED")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Self {
            page_size,
            include_archived,
        }
    }

    pub fn with_page_size(mut self, page_size: Option<i64>) -> Self {
        self.page_size = page_size.filter(|p| *p > 0);
        self
    }

    pub fn with_archived(mut self, include: bool) -> Self {
        self.include_archived = include;
        self
    }
}

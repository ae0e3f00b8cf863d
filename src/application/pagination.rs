//! Numbered-page pagination helpers.
//!
//! Out-of-range or malformed page requests clamp to the nearest valid page
//! instead of erroring, so every listing URL renders something.

use serde::Deserialize;

/// Upper bound on the number of posts a single page may carry; configuration
/// and the repositories both honor it so page arithmetic and query limits
/// cannot disagree.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query-string shape for listing endpoints (`?page=3`).
///
/// The raw value stays a string so malformed input clamps instead of failing
/// extraction.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// Requested page number; absent, malformed, or non-positive input falls
    /// back to the first page.
    pub fn number(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|&n| n >= 1)
            .unwrap_or(1)
    }
}

/// A resolved slice request: 1-based page number and a bounded page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    number: u32,
    size: u32,
}

impl PageRequest {
    pub fn new(number: u32, size: u32) -> Self {
        Self {
            number: number.max(1),
            size: size.max(1),
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.number - 1) * u64::from(self.size)
    }

    /// Clamp the requested number into `[1, page_count(total)]`.
    pub fn clamp(self, total_count: u64) -> Self {
        let pages = page_count(total_count, self.size);
        Self {
            number: self.number.min(pages),
            size: self.size,
        }
    }
}

/// Number of pages needed for `total_count` items; at least 1 so an empty
/// result set still has a valid first page.
pub fn page_count(total_count: u64, page_size: u32) -> u32 {
    let size = u64::from(page_size.max(1));
    let pages = total_count.div_ceil(size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// One bounded page of a larger result set plus its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page_count: u32,
    pub current_page: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: u64, request: PageRequest) -> Self {
        let page_count = page_count(total_count, request.size());
        Self {
            items,
            total_count,
            page_count,
            current_page: request.number().min(page_count),
        }
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.page_count
    }

    pub fn previous_page(&self) -> Option<u32> {
        self.has_previous().then(|| self.current_page - 1)
    }

    pub fn next_page(&self) -> Option<u32> {
        self.has_next().then(|| self.current_page + 1)
    }
}

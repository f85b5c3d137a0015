//! Page/limit normalization shared by all listings.

/// Page size used when the requested limit is out of range.
pub const DEFAULT_LIMIT: u64 = 10;

/// Largest accepted page size.
pub const MAX_LIMIT: u64 = 100;

/// A normalized page request. `page` is 1-based; `limit` is in `1..=MAX_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    /// Clamp raw caller input: pages below 1 become 1, limits outside
    /// `1..=MAX_LIMIT` become [`DEFAULT_LIMIT`].
    pub fn new(page: i64, limit: i64) -> Self {
        let page = u64::try_from(page).unwrap_or(0).max(1);
        let limit = match u64::try_from(limit) {
            Ok(limit) if (1..=MAX_LIMIT).contains(&limit) => limit,
            _ => DEFAULT_LIMIT,
        };
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// `ceil(total / limit)`; zero when there is nothing to show.
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

use serde::{Deserialize, Serialize};

/// One window of a listing plus the size of the whole matching set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct ListResult<T> {
    #[serde(rename = "total_records")]
    pub total: u64,
    #[serde(rename = "current_page")]
    pub page: u64,
    #[serde(rename = "per_page")]
    pub limit: u64,
    pub records: Vec<T>,
}

impl<T> ListResult<T> {
    pub fn new(total: u64, page: u64, limit: u64, records: Vec<T>) -> Self {
        Self {
            total,
            page,
            limit,
            records,
        }
    }

    /// Number of pages needed to show `total` records, at least 1.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 1;
        }
        self.total.div_ceil(self.limit).max(1)
    }
}

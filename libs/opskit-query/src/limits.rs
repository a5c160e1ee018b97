//! Caps applied to listing input.
//!
//! - page size is clamped into `[1, max_limit]`
//! - bracket keys may not nest deeper than `max_depth` segments
//! - repeated or `[]` keys may not collect more than `max_array_len` values

use crate::Error;

/// Hard ceiling for `limit`, `max_depth` and `max_array_len` alike.
pub const HARD_MAX_LIMIT: u64 = 100;
pub const HARD_MAX_DEPTH: usize = 10;
pub const HARD_MAX_ARRAY_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListLimits {
    /// Page size used when `limit` is missing or not a number (default: 10)
    pub default_limit: u64,
    /// Largest page size a caller may request (default: 100)
    pub max_limit: u64,
    /// Maximum bracket segments per key, top-level name included (default: 10)
    pub max_depth: usize,
    /// Maximum values collected under one key (default: 100)
    pub max_array_len: usize,
}

impl Default for ListLimits {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: HARD_MAX_LIMIT,
            max_depth: HARD_MAX_DEPTH,
            max_array_len: HARD_MAX_ARRAY_LEN,
        }
    }
}

impl ListLimits {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_default_limit(mut self, limit: u64) -> Self {
        self.default_limit = limit;
        self
    }

    #[must_use]
    pub fn with_max_limit(mut self, limit: u64) -> Self {
        self.max_limit = limit;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    #[must_use]
    pub fn with_max_array_len(mut self, len: usize) -> Self {
        self.max_array_len = len;
        self
    }

    /// Check that the configured caps are internally consistent and within the hard ceilings.
    ///
    /// # Errors
    /// Returns `Error::InvalidLimits` describing the first violated rule.
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_limit == 0 || self.max_limit > HARD_MAX_LIMIT {
            return Err(Error::InvalidLimits("max_limit must be within 1..=100"));
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(Error::InvalidLimits(
                "default_limit must be within 1..=max_limit",
            ));
        }
        if self.max_depth == 0 || self.max_depth > HARD_MAX_DEPTH {
            return Err(Error::InvalidLimits("max_depth must be within 1..=10"));
        }
        if self.max_array_len == 0 || self.max_array_len > HARD_MAX_ARRAY_LEN {
            return Err(Error::InvalidLimits("max_array_len must be within 1..=100"));
        }
        Ok(())
    }

    /// Clamp a requested page size into `[1, max_limit]`.
    #[must_use]
    pub fn clamp_limit(&self, requested: i64) -> u64 {
        let max = self.max_limit.max(1);
        u64::try_from(requested).map_or(1, |v| v.clamp(1, max))
    }
}

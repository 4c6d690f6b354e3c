//! Pagination types for list endpoints.
//!
//! Pages are offset based and not snapshot cursors: concurrent writes may
//! shift rows between two calls.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Largest page a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-indexed).
    #[serde(default = "default_page_number")]
    pub page_number: u32,
    /// Number of items per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_number() -> u32 {
    1
}

fn default_page_size() -> u32 {
    10
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: default_page_number(),
            page_size: default_page_size(),
        }
    }
}

impl PageRequest {
    /// Creates a page request.
    #[must_use]
    pub const fn new(page_number: u32, page_size: u32) -> Self {
        Self {
            page_number,
            page_size,
        }
    }

    /// Checks the request bounds.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if `page_number` is zero or `page_size`
    /// is outside `1..=MAX_PAGE_SIZE`.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.page_number == 0 {
            return Err(AppError::Validation(
                "page_number must be at least 1".to_string(),
            ));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(AppError::Validation(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }

    /// Calculates the offset for database queries: `page_size * (page_number - 1)`.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page_number.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// Returns the limit for database queries.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod bid;
pub mod crew;
pub mod files;
pub mod marketplace;
pub mod message;
pub mod notification;
pub mod review;
pub mod specialist;
pub mod tender;
pub mod user;

use crate::config::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Trimmed filter value, or `None` for missing/blank query parameters.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Clamps `limit`/`offset` query parameters: limit to 1..=MAX_PAGE_SIZE, offset to >= 0.
pub(crate) fn page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_clamps() {
        assert_eq!(page(None, None), (DEFAULT_PAGE_SIZE, 0));
        assert_eq!(page(Some(1000), Some(-5)), (MAX_PAGE_SIZE, 0));
        assert_eq!(page(Some(0), Some(20)), (1, 20));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(&Some(" roof ".to_string())), Some("roof"));
        assert_eq!(non_blank(&Some("   ".to_string())), None);
        assert_eq!(non_blank(&None), None);
    }
}

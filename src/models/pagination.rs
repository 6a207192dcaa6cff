//! Page addressing shared by the rides endpoint, the admin page and the
//! dashboard client.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Raw `page` / `pageSize` query parameters, kept as strings so malformed
/// input can be rejected instead of failing extraction. `page=` arrives as
/// `Some("")`, not `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default, rename = "pageSize")]
    pub page_size: Option<String>,
}

/// Zero-based page index plus page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    #[serde(rename = "page")]
    page_index: u32,
    #[serde(rename = "pageSize")]
    page_size: u32,
}

impl Pagination {
    pub const MAX_PAGE_SIZE: u32 = 100;

    pub fn new(page_index: u32, page_size: u32) -> Result<Self, AppError> {
        if page_size == 0 {
            return Err(AppError::Validation(
                "pageSize must be a positive integer".into(),
            ));
        }
        if page_size > Self::MAX_PAGE_SIZE {
            return Err(AppError::Validation(format!(
                "pageSize must not exceed {}",
                Self::MAX_PAGE_SIZE
            )));
        }
        Ok(Self {
            page_index,
            page_size,
        })
    }

    /// Missing parameters fall back to page 0 and `default_size`; anything
    /// present, including an empty value, must parse as an integer in range.
    pub fn from_query(query: &PageQuery, default_size: u32) -> Result<Self, AppError> {
        let page_index = match query.page.as_deref() {
            Some(raw) => parse_param("page", raw)?,
            None => 0,
        };
        let page_size = match query.page_size.as_deref() {
            Some(raw) => parse_param("pageSize", raw)?,
            None => default_size,
        };
        Self::new(page_index, page_size)
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page_index) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn next(&self) -> Self {
        Self {
            page_index: self.page_index.saturating_add(1),
            ..*self
        }
    }

    pub fn previous(&self) -> Self {
        Self {
            page_index: self.page_index.saturating_sub(1),
            ..*self
        }
    }

    /// Changing the size restarts at the first page.
    pub fn with_page_size(&self, page_size: u32) -> Result<Self, AppError> {
        Self::new(0, page_size)
    }
}

fn parse_param(name: &str, raw: &str) -> Result<u32, AppError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| AppError::Validation(format!("{name} must be a non-negative integer, got {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, page_size: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(str::to_string),
            page_size: page_size.map(str::to_string),
        }
    }

    #[test]
    fn missing_params_use_defaults() {
        let p = Pagination::from_query(&PageQuery::default(), 10).unwrap();
        assert_eq!(p.page_index(), 0);
        assert_eq!(p.page_size(), 10);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn offset_is_page_times_size() {
        let p = Pagination::from_query(&query(Some("3"), Some("25")), 10).unwrap();
        assert_eq!(p.offset(), 75);
        assert_eq!(p.limit(), 25);
    }

    #[test]
    fn malformed_params_are_rejected() {
        for (page, size) in [
            (Some("abc"), Some("10")),
            (Some("1"), Some("ten")),
            (Some("-1"), Some("10")),
            (Some("1.5"), Some("10")),
            (Some(""), Some("10")),
            (Some("0"), Some("")),
            (Some(" "), Some("10")),
            (Some("0"), Some("0")),
            (Some("0"), Some("101")),
        ] {
            let err = Pagination::from_query(&query(page, size), 10).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{page:?}/{size:?}");
        }
    }

    #[test]
    fn previous_never_goes_below_zero() {
        let p = Pagination::new(0, 10).unwrap();
        assert_eq!(p.previous().page_index(), 0);
        assert_eq!(p.next().page_index(), 1);
        assert_eq!(p.next().next().previous().page_index(), 1);
    }

    #[test]
    fn changing_page_size_restarts_at_first_page() {
        let p = Pagination::new(4, 10).unwrap().with_page_size(20).unwrap();
        assert_eq!(p, Pagination::new(0, 20).unwrap());
    }

    #[test]
    fn empty_values_are_not_page_zero() {
        let parsed: PageQuery = serde_json::from_str(r#"{"page":"","pageSize":"5"}"#).unwrap();
        assert_eq!(parsed.page.as_deref(), Some(""));
        let err = Pagination::from_query(&parsed, 10).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let missing: PageQuery = serde_json::from_str(r#"{"pageSize":"5"}"#).unwrap();
        let p = Pagination::from_query(&missing, 10).unwrap();
        assert_eq!((p.page_index(), p.page_size()), (0, 5));
    }
}

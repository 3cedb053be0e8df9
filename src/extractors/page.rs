use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::Deserialize;

use crate::error::ApiError;

const DEFAULT_PAGE: u64 = 1;
const DEFAULT_LIMIT: u64 = 10;

/// Validated pagination query parameters.
///
/// `page` and `limit` default to 1 and 10 and must be positive integers.
/// Non-numeric or non-positive input is a validation error, raised here
/// before any store access.
///
/// Usage in handlers:
/// ```rust,ignore
/// async fn list_roles(page: Page) -> impl IntoResponse {
///     // page.page, page.limit, page.offset()
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: u64,
    pub limit: u64,
}

/// Raw query shape before validation; unknown parameters are ignored.
#[derive(Debug, Default, Deserialize)]
struct RawPage {
    page: Option<String>,
    limit: Option<String>,
}

impl Default for Page {
    fn default() -> Self {
        Page {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Page {
    /// Zero-based row offset for this page.
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }

    fn parse_field(raw: Option<String>, name: &str, default: u64) -> Result<u64, ApiError> {
        match raw {
            None => Ok(default),
            Some(value) => match value.parse::<u64>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(ApiError::Validation(format!(
                    "'{}' must be a positive integer, got '{}'",
                    name, value
                ))),
            },
        }
    }
}

impl<S> FromRequestParts<S> for Page
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let query = parts.uri.query().unwrap_or("");
        let raw: RawPage = serde_urlencoded::from_str(query).unwrap_or_default();

        Ok(Page {
            page: Page::parse_field(raw.page, "page", DEFAULT_PAGE)?,
            limit: Page::parse_field(raw.limit, "limit", DEFAULT_LIMIT)?,
        })
    }
}

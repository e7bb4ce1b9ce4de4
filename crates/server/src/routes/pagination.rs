//! Page-number pagination for list endpoints.
//!
//! Lists take `?page=<n>&limit=<size>` and respond with
//! `{"count", "next", "previous", "results"}`, where `next`/`previous` are
//! absolute URLs carrying the same query with only `page` changed.

use axum::http::Uri;
use serde::Serialize;
use url::Url;

use crate::error::AppError;

/// Page size when `limit` is absent or unusable.
pub const DEFAULT_PAGE_SIZE: i64 = 6;

/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: i64 = 50;

/// One page of results.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// The pagination parameters of a request plus what is needed to link to
/// neighbouring pages.
#[derive(Debug, Clone)]
pub struct Pagination {
    page: i64,
    limit: i64,
    offset: i64,
    endpoint: String,
    pairs: Vec<(String, String)>,
}

impl Pagination {
    /// Read `page` and `limit` from the request URI.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if `page` is not a positive integer or
    /// starts past the largest representable offset.
    pub fn from_uri(base_url: &str, uri: &Uri) -> Result<Self, AppError> {
        let pairs = query_pairs(uri);

        let page = match lookup(&pairs, "page") {
            None => 1,
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|page| *page >= 1)
                .ok_or_else(|| AppError::NotFound("Invalid page".to_owned()))?,
        };

        let limit = lookup(&pairs, "limit")
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|limit| *limit >= 1)
            .map_or(DEFAULT_PAGE_SIZE, |limit| limit.min(MAX_PAGE_SIZE));

        let offset = (page - 1)
            .checked_mul(limit)
            .ok_or_else(|| AppError::NotFound("Invalid page".to_owned()))?;

        Ok(Self {
            page,
            limit,
            offset,
            endpoint: format!("{base_url}{}", uri.path()),
            pairs,
        })
    }

    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.limit
    }

    #[must_use]
    pub const fn offset(&self) -> i64 {
        self.offset
    }

    /// All query parameters of the request, in order, for endpoint filters.
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Reject pages past the end. Page 1 always exists.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the page starts beyond `count`.
    pub fn ensure_in_range(&self, count: i64) -> Result<(), AppError> {
        if self.page > 1 && self.offset >= count {
            return Err(AppError::NotFound("Invalid page".to_owned()));
        }
        Ok(())
    }

    /// Wrap `results` into a page of a list of `count` items.
    #[must_use]
    pub fn page<T>(&self, count: i64, results: Vec<T>) -> Page<T> {
        let next = self
            .offset
            .checked_add(self.limit)
            .filter(|end| *end < count)
            .and_then(|_| self.page.checked_add(1))
            .map(|next| self.link(Some(next)));
        let previous = (self.page > 1).then(|| {
            let previous = self.page - 1;
            self.link((previous > 1).then_some(previous))
        });

        Page {
            count,
            next,
            previous,
            results,
        }
    }

    fn link(&self, page: Option<i64>) -> String {
        let mut pairs: Vec<(&str, String)> = self
            .pairs
            .iter()
            .filter(|(key, _)| key != "page")
            .map(|(key, value)| (key.as_str(), value.clone()))
            .collect();
        if let Some(page) = page {
            pairs.push(("page", page.to_string()));
        }

        let Ok(mut url) = Url::parse(&self.endpoint) else {
            return self.endpoint.clone();
        };
        if pairs.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }
        url.into()
    }
}

/// Decode the query string of `uri` into ordered key/value pairs.
#[must_use]
pub fn query_pairs(uri: &Uri) -> Vec<(String, String)> {
    uri.query()
        .map(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}

/// First value of `key`.
#[must_use]
pub fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Whether a boolean filter such as `is_favorited=1` is switched on.
#[must_use]
pub fn flag(pairs: &[(String, String)], key: &str) -> bool {
    matches!(lookup(pairs, key), Some("1" | "true" | "True"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:8000";

    fn pagination(uri: &str) -> Pagination {
        Pagination::from_uri(BASE, &uri.parse::<Uri>().unwrap()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let p = pagination("/api/recipes/");
        assert_eq!(p.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(pagination("/api/recipes/?limit=500").limit(), MAX_PAGE_SIZE);
        assert_eq!(pagination("/api/recipes/?limit=0").limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(pagination("/api/recipes/?limit=abc").limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(pagination("/api/recipes/?limit=3&page=3").offset(), 6);
    }

    #[test]
    fn test_invalid_page_is_not_found() {
        for uri in ["/api/users/?page=0", "/api/users/?page=x", "/api/users/?page=-1"] {
            let err = Pagination::from_uri(BASE, &uri.parse::<Uri>().unwrap()).unwrap_err();
            assert!(matches!(err, AppError::NotFound(_)), "{uri}");
        }
    }

    #[test]
    fn test_huge_page_is_not_found() {
        let uri = "/api/recipes/?page=9223372036854775807&limit=50"
            .parse::<Uri>()
            .unwrap();
        let err = Pagination::from_uri(BASE, &uri).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_huge_page_within_range_has_no_next() {
        let p = pagination("/api/recipes/?page=9223372036854775807&limit=1");
        assert_eq!(p.offset(), i64::MAX - 1);
        assert!(p.ensure_in_range(10).is_err());
        assert_eq!(p.page(i64::MAX, vec![()]).next, None);
    }

    #[test]
    fn test_out_of_range() {
        let p = pagination("/api/users/?page=3&limit=5");
        assert!(p.ensure_in_range(10).is_err());
        assert!(p.ensure_in_range(11).is_ok());
        assert!(pagination("/api/users/").ensure_in_range(0).is_ok());
    }

    #[test]
    fn test_links_keep_filters() {
        let p = pagination("/api/recipes/?tags=lunch&tags=dinner&page=2&limit=2");
        let page = p.page(7, vec![(), ()]);

        assert_eq!(page.count, 7);
        assert_eq!(
            page.next.as_deref(),
            Some("http://localhost:8000/api/recipes/?tags=lunch&tags=dinner&limit=2&page=3")
        );
        assert_eq!(
            page.previous.as_deref(),
            Some("http://localhost:8000/api/recipes/?tags=lunch&tags=dinner&limit=2")
        );
    }

    #[test]
    fn test_last_page_has_no_next() {
        let page = pagination("/api/users/?page=2&limit=3").page(6, vec![1, 2, 3]);
        assert_eq!(page.next, None);
        assert_eq!(
            page.previous.as_deref(),
            Some("http://localhost:8000/api/users/?limit=3")
        );

        let page = pagination("/api/users/?page=2").page(7, vec![1]);
        assert_eq!(page.previous.as_deref(), Some("http://localhost:8000/api/users/"));
    }

    #[test]
    fn test_flag() {
        let pairs = query_pairs(&"/?is_favorited=1&is_in_shopping_cart=0".parse().unwrap());
        assert!(flag(&pairs, "is_favorited"));
        assert!(!flag(&pairs, "is_in_shopping_cart"));
        assert!(!flag(&pairs, "missing"));
    }
}

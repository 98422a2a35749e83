//! Query-string construction for list endpoints.
//!
//! Clauses are always emitted in the same order (page, per_page, filter,
//! include, sort) no matter how the options were built, so identical
//! options always produce identical URLs.

use serde::{Deserialize, Serialize};

use crate::error::{PteroError, Result};

pub const MAX_PAGE: u32 = 50;
pub const MAX_PER_PAGE: u32 = 100;

/// `filter[<field>]=<value>` clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub value: String,
}

impl Filter {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter = Some(Filter::new(field, value));
        self
    }

    pub fn include<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = relations.into_iter().map(Into::into).collect();
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.page.is_none()
            && self.per_page.is_none()
            && self.filter.is_none()
            && self.include.iter().all(String::is_empty)
            && self.sort.is_none()
    }

    pub fn to_query_string(&self) -> Result<String> {
        build_query_string(self)
    }
}

/// Build the `?a=b&c=d` suffix for `options`, or an empty string when no
/// clause applies.
///
/// Fails with [`PteroError::Validation`] before anything is sent when
/// `page` is outside `1..=50` or `per_page` is outside `1..=100`.
pub fn build_query_string(options: &QueryOptions) -> Result<String> {
    let mut clauses = Vec::new();

    if let Some(page) = options.page {
        if !(1..=MAX_PAGE).contains(&page) {
            return Err(PteroError::Validation(format!(
                "page number must be between 1 and {MAX_PAGE}"
            )));
        }
        clauses.push(format!("page={page}"));
    }

    if let Some(per_page) = options.per_page {
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(PteroError::Validation(format!(
                "per_page number must be between 1 and {MAX_PER_PAGE}"
            )));
        }
        clauses.push(format!("per_page={per_page}"));
    }

    if let Some(filter) = &options.filter {
        clauses.push(format!("filter[{}]={}", filter.field, filter.value));
    }

    let include: Vec<&str> = options
        .include
        .iter()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();
    if !include.is_empty() {
        clauses.push(format!("include={}", include.join(",")));
    }

    if let Some(sort) = &options.sort {
        clauses.push(format!("sort={sort}"));
    }

    if clauses.is_empty() {
        return Ok(String::new());
    }

    Ok(format!("?{}", clauses.join("&")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_options() {
        assert_eq!(build_query_string(&QueryOptions::new()).unwrap(), "");
        assert!(QueryOptions::new().is_empty());
    }

    #[test]
    fn test_page_bounds() {
        for page in 1..=MAX_PAGE {
            let query = build_query_string(&QueryOptions::new().page(page)).unwrap();
            assert_eq!(query, format!("?page={page}"));
        }

        for page in [0, MAX_PAGE + 1, 1000] {
            let err = build_query_string(&QueryOptions::new().page(page)).unwrap_err();
            assert!(matches!(err, PteroError::Validation(_)), "page {page} accepted");
        }
    }

    #[test]
    fn test_per_page_bounds() {
        for per_page in 1..=MAX_PER_PAGE {
            let query = build_query_string(&QueryOptions::new().per_page(per_page)).unwrap();
            assert!(query.contains(&format!("per_page={per_page}")));
        }

        for per_page in [0, MAX_PER_PAGE + 1] {
            let err = build_query_string(&QueryOptions::new().per_page(per_page)).unwrap_err();
            assert!(matches!(err, PteroError::Validation(_)));
        }
    }

    #[test]
    fn test_include_drops_empty_entries() {
        let options = QueryOptions::new().include(["", "a", "", "b"]);
        assert_eq!(build_query_string(&options).unwrap(), "?include=a,b");

        let options = QueryOptions::new().include(["", ""]);
        assert_eq!(build_query_string(&options).unwrap(), "");
        assert!(options.is_empty());
    }

    #[test]
    fn test_fixed_clause_order() {
        let options = QueryOptions::new().sort("-name").page(2);
        assert_eq!(build_query_string(&options).unwrap(), "?page=2&sort=-name");

        let options = QueryOptions::new()
            .sort("id")
            .include(["allocations"])
            .filter("name", "minecraft")
            .per_page(25)
            .page(1);
        assert_eq!(
            options.to_query_string().unwrap(),
            "?page=1&per_page=25&filter[name]=minecraft&include=allocations&sort=id"
        );
    }

    #[test]
    fn test_validation_fails_before_other_clauses() {
        let options = QueryOptions::new().sort("id").per_page(500);
        let err = options.to_query_string().unwrap_err();
        assert!(err.to_string().contains("per_page"));
    }
}

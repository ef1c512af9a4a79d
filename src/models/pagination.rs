//! Page windows, paginated result lists and their navigation links

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::book::{Book, BookSummary};
use super::user::UserSummary;
use crate::error::AppResult;

/// Hard upper bound on the number of items in one page
pub const MAX_PAGE_SIZE: i64 = 50;
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Query parameter carrying the page number in generated links
pub const PAGE_NUMBER_PARAM: &str = "pageNumber";

/// A normalized page window: `page_number >= 1`, `1 <= page_size <= 50`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_number: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// Oversized pages are capped, never rejected. Values below 1 are raised to 1.
    pub fn new(page_number: Option<i64>, page_size: Option<i64>) -> Self {
        Self {
            page_number: page_number.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page_number - 1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn from_descending(descending: Option<bool>) -> Self {
        if descending.unwrap_or(false) {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// HATEOAS navigation link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Link {
    pub href: String,
    pub rel: String,
    pub method: String,
}

/// Resolves a named route plus parameters into an absolute URL
pub trait UrlTemplate: Send + Sync {
    fn build_url(&self, route_name: &str, params: &[(&str, String)]) -> AppResult<String>;
}

/// One page of results with its position in the whole result set
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[aliases(
    PaginatedBooks = PaginatedList<Book>,
    PaginatedBookSummaries = PaginatedList<BookSummary>,
    PaginatedUsers = PaginatedList<UserSummary>
)]
pub struct PaginatedList<T> {
    pub items: Vec<T>,
    pub page_index: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub total_count: i64,
    pub has_previous: bool,
    pub has_next: bool,
    pub links: Vec<Link>,
}

impl<T> PaginatedList<T> {
    pub fn new(items: Vec<T>, total_count: i64, page: PageRequest) -> Self {
        let total_pages = if total_count <= 0 {
            0
        } else {
            (total_count + page.page_size - 1) / page.page_size
        };

        Self {
            items,
            page_index: page.page_number,
            page_size: page.page_size,
            total_pages,
            total_count: total_count.max(0),
            has_previous: page.page_number > 1,
            has_next: page.page_number < total_pages,
            links: Vec::new(),
        }
    }

    /// Reshape the items while keeping the page metadata
    pub fn map<U, F>(self, f: F) -> PaginatedList<U>
    where
        F: FnMut(T) -> U,
    {
        PaginatedList {
            items: self.items.into_iter().map(f).collect(),
            page_index: self.page_index,
            page_size: self.page_size,
            total_pages: self.total_pages,
            total_count: self.total_count,
            has_previous: self.has_previous,
            has_next: self.has_next,
            links: self.links,
        }
    }

    /// Append navigation links in the order previous, next, first, last.
    ///
    /// `route_values` are echoed into every link; the page number is set per link.
    pub fn add_pagination_links(
        &mut self,
        urls: &dyn UrlTemplate,
        route_name: &str,
        route_values: &[(&str, String)],
    ) -> AppResult<()> {
        if self.page_index > 1 {
            let link = page_link(urls, route_name, route_values, self.page_index - 1, "previousPage")?;
            self.links.push(link);
        }

        if self.has_next {
            let link = page_link(urls, route_name, route_values, self.page_index + 1, "nextPage")?;
            self.links.push(link);
        }

        self.links
            .push(page_link(urls, route_name, route_values, 1, "firstPage")?);
        self.links.push(page_link(
            urls,
            route_name,
            route_values,
            self.total_pages,
            "lastPage",
        )?);

        Ok(())
    }
}

fn page_link(
    urls: &dyn UrlTemplate,
    route_name: &str,
    route_values: &[(&str, String)],
    page_number: i64,
    rel: &str,
) -> AppResult<Link> {
    let mut params: Vec<(&str, String)> = route_values
        .iter()
        .filter(|(name, _)| *name != PAGE_NUMBER_PARAM)
        .cloned()
        .collect();
    params.push((PAGE_NUMBER_PARAM, page_number.to_string()));

    Ok(Link {
        href: urls.build_url(route_name, &params)?,
        rel: rel.to_string(),
        method: "GET".to_string(),
    })
}

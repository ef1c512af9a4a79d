//! Book model and related request/response types

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::genre::Genre;
use super::pagination::{PageRequest, SortDirection};
use super::user::User;
use super::validation::{attribute_errors, require_non_blank, FieldError, Validated};

static ISBN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d{10}|\d{13})$").expect("valid ISBN regex"));

/// Book as stored. `borrower_id` is set exactly while the book is lent out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publication_year: i32,
    pub image_url: Option<String>,
    pub borrower_id: Option<i32>,
    /// Optimistic concurrency token, bumped on every write
    #[serde(default)]
    pub version: i32,
    // Loaded separately, only on detail reads
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<Genre>>,
}

/// Lending state of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LendingState {
    Available,
    Borrowed { borrower_id: i32 },
}

impl Book {
    pub fn lending_state(&self) -> LendingState {
        match self.borrower_id {
            Some(borrower_id) => LendingState::Borrowed { borrower_id },
            None => LendingState::Available,
        }
    }

    /// Copy the editable fields of an input onto this book
    pub fn apply(&mut self, input: BookInput) {
        self.title = input.title;
        self.author = input.author;
        self.isbn = input.isbn;
        self.publication_year = input.publication_year;
    }
}

/// Book projection returned by search: no relationship details besides genre names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub id: i32,
    pub image_url: Option<String>,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publication_year: i32,
    pub genres: Vec<String>,
}

/// Editable book fields, as submitted by create/update forms
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookInput {
    /// Must match the path id when present on update
    pub id: Option<i32>,
    #[validate(length(min = 1, max = 100, message = "Title is required and cannot exceed 100 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 50, message = "Author is required and cannot exceed 50 characters"))]
    pub author: String,
    #[validate(regex(path = *ISBN_REGEX, message = "ISBN must be 10 or 13 digits long"))]
    pub isbn: String,
    #[validate(range(min = 1000, max = 9999, message = "Year of publication must be between 1000 and 9999"))]
    pub publication_year: i32,
}

impl Validated for BookInput {
    fn validation_errors(&self) -> Vec<FieldError> {
        let mut errors = attribute_errors(self);
        require_non_blank(&mut errors, "title", &self.title, "Title is required");
        require_non_blank(&mut errors, "author", &self.author, "Author is required");
        if !self.title.trim().is_empty() && self.title.trim().eq_ignore_ascii_case(self.author.trim()) {
            errors.push(FieldError::new(
                "title",
                "Book title cannot be identical to author's name",
            ));
        }
        errors
    }
}

/// Values for a new book row
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publication_year: i32,
    pub image_url: Option<String>,
}

impl NewBook {
    pub fn from_input(input: BookInput, image_url: Option<String>) -> Self {
        Self {
            title: input.title,
            author: input.author,
            isbn: input.isbn,
            publication_year: input.publication_year,
            image_url,
        }
    }
}

/// Columns books can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSortKey {
    Title,
    Author,
    PublicationYear,
}

impl BookSortKey {
    /// Unknown keys fall back to title
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("author") => BookSortKey::Author,
            Some("publicationyear") | Some("publication_year") | Some("year") => {
                BookSortKey::PublicationYear
            }
            _ => BookSortKey::Title,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            BookSortKey::Title => "title",
            BookSortKey::Author => "author",
            BookSortKey::PublicationYear => "publication_year",
        }
    }
}

/// Paginated book listing parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Page number, starting at 1 (default: 1)
    pub page_number: Option<i64>,
    /// Items per page, capped at 50 (default: 10)
    pub page_size: Option<i64>,
    /// title | author | publicationYear (default: title)
    pub sort_by: Option<String>,
    pub sort_descending: Option<bool>,
}

impl BookQuery {
    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.page_number, self.page_size)
    }

    pub fn sort_key(&self) -> BookSortKey {
        BookSortKey::from_param(self.sort_by.as_deref())
    }

    pub fn direction(&self) -> SortDirection {
        SortDirection::from_descending(self.sort_descending)
    }

    /// Parameters echoed into pagination links (page number excluded)
    pub fn route_values(&self) -> Vec<(&'static str, String)> {
        let page = self.page();
        let mut values = vec![("pageSize", page.page_size.to_string())];
        if let Some(ref sort_by) = self.sort_by {
            values.push(("sortBy", sort_by.clone()));
        }
        values.push(("sortDescending", self.sort_descending.unwrap_or(false).to_string()));
        values
    }
}

/// Book search parameters. Every supplied criterion must match.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BookSearchQuery {
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    /// Case-insensitive substring of the author
    pub author: Option<String>,
    /// Exact ISBN
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
    pub genre_id: Option<i32>,
    /// Case-insensitive substring of one of the book's genre names
    pub genre_name: Option<String>,
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}

impl BookSearchQuery {
    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.page_number, self.page_size)
    }

    pub fn filter(&self) -> BookFilter {
        BookFilter {
            title: non_empty(&self.title),
            author: non_empty(&self.author),
            isbn: non_empty(&self.isbn),
            publication_year: self.publication_year,
            genre_id: self.genre_id,
            genre_name: non_empty(&self.genre_name),
        }
    }
}

/// Normalized search predicates; `None` means "do not filter"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
    pub genre_id: Option<i32>,
    pub genre_name: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Borrow request body
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRequest {
    pub user_id: i32,
}

/// A successful borrow: the updated book and who holds it
#[derive(Debug, Clone)]
pub struct BorrowedBook {
    pub book: Book,
    pub borrower: User,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowResponse {
    pub book_id: i32,
    pub title: String,
    pub author: String,
    pub borrower_id: i32,
    pub borrower_username: String,
}

impl From<BorrowedBook> for BorrowResponse {
    fn from(borrowed: BorrowedBook) -> Self {
        Self {
            book_id: borrowed.book.id,
            title: borrowed.book.title,
            author: borrowed.book.author,
            borrower_id: borrowed.borrower.id,
            borrower_username: borrowed.borrower.username,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnResponse {
    pub book_id: i32,
    pub title: String,
    pub is_returned: bool,
}

impl From<Book> for ReturnResponse {
    fn from(book: Book) -> Self {
        Self {
            book_id: book.id,
            title: book.title,
            is_returned: book.borrower_id.is_none(),
        }
    }
}

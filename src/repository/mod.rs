//! Repository layer for database operations
//!
//! Each entity is reached through an async store trait so services can be
//! exercised without a database. The PostgreSQL implementations live in the
//! submodules.

pub mod books;
pub mod genres;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookFilter, BookSortKey, BookSummary, NewBook},
        genre::{Genre, GenreInput},
        pagination::{PageRequest, SortDirection},
        user::{User, UserInput, UserSortKey},
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn find(&self, id: i32) -> AppResult<Option<Book>>;

    async fn list(&self) -> AppResult<Vec<Book>>;

    /// One sorted page of all books plus the total number of books
    async fn page(
        &self,
        sort: BookSortKey,
        direction: SortDirection,
        page: PageRequest,
    ) -> AppResult<(Vec<Book>, i64)>;

    /// One page of books matching every predicate of `filter`, ordered by title,
    /// plus the total number of matches
    async fn search(&self, filter: &BookFilter, page: PageRequest) -> AppResult<(Vec<BookSummary>, i64)>;

    async fn insert(&self, book: &NewBook) -> AppResult<Book>;

    /// Write every column of `book` if its `version` is still current.
    ///
    /// Fails with `ConcurrencyConflict` when the row changed or disappeared
    /// since it was read.
    async fn update(&self, book: &Book) -> AppResult<Book>;

    /// Returns false when no such book existed
    async fn delete(&self, id: i32) -> AppResult<bool>;

    async fn genres_of(&self, book_id: i32) -> AppResult<Vec<Genre>>;

    /// Insert the association unless it already exists
    async fn add_genre(&self, book_id: i32, genre_id: i32) -> AppResult<()>;

    /// Delete the association if present
    async fn remove_genre(&self, book_id: i32, genre_id: i32) -> AppResult<()>;

    async fn borrowed_by(&self, user_id: i32) -> AppResult<Vec<Book>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenreStore: Send + Sync {
    async fn find(&self, id: i32) -> AppResult<Option<Genre>>;

    async fn list(&self) -> AppResult<Vec<Genre>>;

    async fn insert(&self, genre: &GenreInput) -> AppResult<Genre>;

    async fn update(&self, id: i32, genre: &GenreInput) -> AppResult<Option<Genre>>;

    async fn delete(&self, id: i32) -> AppResult<bool>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find(&self, id: i32) -> AppResult<Option<User>>;

    async fn list(&self) -> AppResult<Vec<User>>;

    async fn page(
        &self,
        sort: UserSortKey,
        direction: SortDirection,
        page: PageRequest,
    ) -> AppResult<(Vec<User>, i64)>;

    /// Fails with `Conflict` when the username or email is taken
    async fn insert(&self, user: &UserInput) -> AppResult<User>;

    async fn update(&self, id: i32, user: &UserInput) -> AppResult<Option<User>>;

    async fn delete(&self, id: i32) -> AppResult<bool>;
}

/// Main repository struct holding one store per entity
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookStore>,
    pub genres: Arc<dyn GenreStore>,
    pub users: Arc<dyn UserStore>,
}

impl Repository {
    /// Create a PostgreSQL-backed repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            genres: Arc::new(genres::GenresRepository::new(pool.clone())),
            users: Arc::new(users::UsersRepository::new(pool)),
        }
    }

    pub fn from_stores(
        books: Arc<dyn BookStore>,
        genres: Arc<dyn GenreStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self { books, genres, users }
    }
}

/// Map unique-constraint violations to `Conflict`, everything else to `Database`
pub(crate) fn unique_violation(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(message.to_string()),
        _ => AppError::Database(err),
    }
}

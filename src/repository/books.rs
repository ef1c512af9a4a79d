//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};

use super::BookStore;
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookFilter, BookSortKey, BookSummary, NewBook},
        genre::Genre,
        pagination::{PageRequest, SortDirection},
    },
};

const BOOK_COLUMNS: &str =
    "id, title, author, isbn, publication_year, image_url, borrower_id, version";

/// Escape LIKE metacharacters and wrap the term for a substring match
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Append the WHERE clause for `filter`; every predicate is bound, never interpolated
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &BookFilter) {
    qb.push(" WHERE 1=1");

    if let Some(ref title) = filter.title {
        qb.push(" AND b.title ILIKE ").push_bind(like_pattern(title));
    }

    if let Some(ref author) = filter.author {
        qb.push(" AND b.author ILIKE ").push_bind(like_pattern(author));
    }

    if let Some(ref isbn) = filter.isbn {
        qb.push(" AND b.isbn = ").push_bind(isbn.clone());
    }

    if let Some(year) = filter.publication_year {
        qb.push(" AND b.publication_year = ").push_bind(year);
    }

    if let Some(genre_id) = filter.genre_id {
        qb.push(" AND EXISTS (SELECT 1 FROM book_genres bg WHERE bg.book_id = b.id AND bg.genre_id = ")
            .push_bind(genre_id)
            .push(")");
    }

    if let Some(ref genre_name) = filter.genre_name {
        qb.push(
            " AND EXISTS (SELECT 1 FROM book_genres bg JOIN genres g ON g.id = bg.genre_id \
             WHERE bg.book_id = b.id AND g.name ILIKE ",
        )
        .push_bind(like_pattern(genre_name))
        .push(")");
    }
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    // =========================================================================
    // READ
    // =========================================================================

    async fn find(&self, id: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!("SELECT {} FROM books ORDER BY id", BOOK_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn page(
        &self,
        sort: BookSortKey,
        direction: SortDirection,
        page: PageRequest,
    ) -> AppResult<(Vec<Book>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        // Sort column comes from a closed enum
        let query = format!(
            "SELECT {} FROM books ORDER BY {} {}, id LIMIT $1 OFFSET $2",
            BOOK_COLUMNS,
            sort.column(),
            direction.as_sql()
        );

        let books = sqlx::query_as::<_, Book>(&query)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((books, total))
    }

    // =========================================================================
    // SEARCH
    // =========================================================================

    async fn search(&self, filter: &BookFilter, page: PageRequest) -> AppResult<(Vec<BookSummary>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM books b");
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(
            r#"
            SELECT b.id, b.image_url, b.title, b.author, b.isbn, b.publication_year,
                   ARRAY(
                       SELECT g.name::text
                       FROM book_genres bg
                       JOIN genres g ON g.id = bg.genre_id
                       WHERE bg.book_id = b.id
                       ORDER BY g.name
                   ) AS genres
            FROM books b
            "#,
        );
        push_filter(&mut select, filter);
        select
            .push(" ORDER BY b.title, b.id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let items = select
            .build_query_as::<BookSummary>()
            .fetch_all(&self.pool)
            .await?;

        Ok((items, total))
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    async fn insert(&self, book: &NewBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (title, author, isbn, publication_year, image_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(book.publication_year)
        .bind(&book.image_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update(&self, book: &Book) -> AppResult<Book> {
        let updated = sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books SET
                title = $1,
                author = $2,
                isbn = $3,
                publication_year = $4,
                image_url = $5,
                borrower_id = $6,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $7 AND version = $8
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(book.publication_year)
        .bind(&book.image_url)
        .bind(book.borrower_id)
        .bind(book.id)
        .bind(book.version)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| {
            AppError::ConcurrencyConflict(format!(
                "Book {} was modified by another request",
                book.id
            ))
        })
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // RELATIONS
    // =========================================================================

    async fn genres_of(&self, book_id: i32) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>(
            r#"
            SELECT g.id, g.name, g.description
            FROM book_genres bg
            JOIN genres g ON g.id = bg.genre_id
            WHERE bg.book_id = $1
            ORDER BY g.name
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(genres)
    }

    async fn add_genre(&self, book_id: i32, genre_id: i32) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO book_genres (book_id, genre_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(book_id)
        .bind(genre_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_genre(&self, book_id: i32, genre_id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM book_genres WHERE book_id = $1 AND genre_id = $2")
            .bind(book_id)
            .bind(genre_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn borrowed_by(&self, user_id: i32) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE borrower_id = $1 ORDER BY title, id",
            BOOK_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }
}

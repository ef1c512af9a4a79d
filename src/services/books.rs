//! Book catalog service: CRUD, paginated listing, search, lending and genres

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookInput, BookQuery, BookSearchQuery, BookSummary, BorrowedBook, LendingState, NewBook},
        pagination::PaginatedList,
        validation::Validated,
    },
    repository::Repository,
    services::images::{validate_image, ImageStore, ImageUpload},
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
    images: Arc<dyn ImageStore>,
    max_image_bytes: usize,
}

impl BooksService {
    pub fn new(repository: Repository, images: Arc<dyn ImageStore>, max_image_bytes: usize) -> Self {
        Self {
            repository,
            images,
            max_image_bytes,
        }
    }

    /// Get all books
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    /// Get a book with its genres
    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        let mut book = self.find_book(id).await?;
        book.genres = Some(self.repository.books.genres_of(id).await?);
        Ok(book)
    }

    /// One sorted page of books
    pub async fn paginate(&self, query: &BookQuery) -> AppResult<PaginatedList<Book>> {
        let page = query.page();
        let (books, total) = self
            .repository
            .books
            .page(query.sort_key(), query.direction(), page)
            .await?;
        Ok(PaginatedList::new(books, total, page))
    }

    /// Search books; all supplied criteria must match
    pub async fn search(&self, query: &BookSearchQuery) -> AppResult<PaginatedList<BookSummary>> {
        let page = query.page();
        let (items, total) = self.repository.books.search(&query.filter(), page).await?;
        Ok(PaginatedList::new(items, total, page))
    }

    /// Create a new book, storing its cover first when one is supplied
    pub async fn create_book(&self, input: BookInput, image: Option<ImageUpload>) -> AppResult<Book> {
        input.ensure_valid()?;

        let image_url = match image {
            Some(ref upload) => Some(self.store_image(upload).await?),
            None => None,
        };

        match self
            .repository
            .books
            .insert(&NewBook::from_input(input, image_url.clone()))
            .await
        {
            Ok(book) => {
                tracing::info!("Created book {} ({})", book.id, book.title);
                Ok(book)
            }
            Err(e) => {
                if let Some(url) = image_url {
                    self.discard_image(&url).await;
                }
                Err(e)
            }
        }
    }

    /// Update an existing book; a new cover replaces and deletes the old one
    pub async fn update_book(&self, id: i32, input: BookInput, image: Option<ImageUpload>) -> AppResult<Book> {
        if input.id.is_some_and(|body_id| body_id != id) {
            return Err(AppError::BadRequest(
                "The book ID does not match the route ID".to_string(),
            ));
        }
        input.ensure_valid()?;

        let mut book = self.find_book(id).await?;
        book.apply(input);

        let previous_image = match image {
            Some(ref upload) => {
                let url = self.store_image(upload).await?;
                book.image_url.replace(url)
            }
            None => None,
        };

        let saved = match self.save(&book).await {
            Ok(saved) => saved,
            Err(e) => {
                if image.is_some() {
                    if let Some(ref url) = book.image_url {
                        self.discard_image(url).await;
                    }
                }
                return Err(e);
            }
        };

        if let Some(url) = previous_image {
            self.discard_image(&url).await;
        }

        tracing::info!("Updated book {}", saved.id);
        Ok(saved)
    }

    /// Delete a book and its stored cover
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        let book = self.find_book(id).await?;

        if !self.repository.books.delete(id).await? {
            return Err(AppError::not_found("Book", id));
        }

        if let Some(ref url) = book.image_url {
            self.discard_image(url).await;
        }

        tracing::info!("Deleted book {}", id);
        Ok(())
    }

    // =========================================================================
    // LENDING
    // =========================================================================

    /// Lend an available book to a user
    pub async fn borrow_book(&self, book_id: i32, user_id: i32) -> AppResult<BorrowedBook> {
        let mut book = self.find_book(book_id).await?;

        let borrower = self
            .repository
            .users
            .find(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User", user_id))?;

        if let LendingState::Borrowed { borrower_id } = book.lending_state() {
            tracing::warn!(
                "Borrow refused: book {} is already borrowed by user {}",
                book_id,
                borrower_id
            );
            return Err(AppError::InvalidState(format!(
                "Book with ID {} is already borrowed",
                book_id
            )));
        }

        book.borrower_id = Some(borrower.id);
        let book = self.save(&book).await?;

        tracing::info!("Book {} borrowed by user {}", book.id, borrower.id);
        Ok(BorrowedBook { book, borrower })
    }

    /// Take a borrowed book back
    pub async fn return_book(&self, book_id: i32) -> AppResult<Book> {
        let mut book = self.find_book(book_id).await?;

        let LendingState::Borrowed { borrower_id } = book.lending_state() else {
            tracing::warn!("Return refused: book {} is not borrowed", book_id);
            return Err(AppError::InvalidState(format!(
                "Book with ID {} is not currently borrowed",
                book_id
            )));
        };

        book.borrower_id = None;
        let book = self.save(&book).await?;

        tracing::info!("Book {} returned by user {}", book.id, borrower_id);
        Ok(book)
    }

    // =========================================================================
    // GENRES
    // =========================================================================

    /// Attach a genre to a book; attaching twice is harmless
    pub async fn add_genre(&self, book_id: i32, genre_id: i32) -> AppResult<()> {
        self.ensure_book_and_genre(book_id, genre_id).await?;
        self.repository.books.add_genre(book_id, genre_id).await?;
        tracing::info!("Genre {} added to book {}", genre_id, book_id);
        Ok(())
    }

    /// Detach a genre from a book; detaching an absent association is a no-op
    pub async fn remove_genre(&self, book_id: i32, genre_id: i32) -> AppResult<()> {
        self.ensure_book_and_genre(book_id, genre_id).await?;
        self.repository.books.remove_genre(book_id, genre_id).await?;
        tracing::info!("Genre {} removed from book {}", genre_id, book_id);
        Ok(())
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    async fn find_book(&self, id: i32) -> AppResult<Book> {
        self.repository
            .books
            .find(id)
            .await?
            .ok_or_else(|| AppError::not_found("Book", id))
    }

    async fn ensure_book_and_genre(&self, book_id: i32, genre_id: i32) -> AppResult<()> {
        self.find_book(book_id).await?;
        self.repository
            .genres
            .find(genre_id)
            .await?
            .ok_or_else(|| AppError::not_found("Genre", genre_id))?;
        Ok(())
    }

    /// Persist with the optimistic version check. A failed check is reported as
    /// a conflict only if the book still exists.
    async fn save(&self, book: &Book) -> AppResult<Book> {
        match self.repository.books.update(book).await {
            Err(AppError::ConcurrencyConflict(msg)) => {
                if self.repository.books.find(book.id).await?.is_none() {
                    Err(AppError::not_found("Book", book.id))
                } else {
                    Err(AppError::ConcurrencyConflict(msg))
                }
            }
            other => other,
        }
    }

    async fn store_image(&self, upload: &ImageUpload) -> AppResult<String> {
        validate_image(upload, self.max_image_bytes)?;
        self.images.upload(upload).await
    }

    /// Image cleanup never fails the request that triggered it
    async fn discard_image(&self, url: &str) {
        if let Err(e) = self.images.delete(url).await {
            tracing::error!("Failed to delete image {}: {}", url, e);
        }
    }
}

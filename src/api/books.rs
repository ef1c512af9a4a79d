//! Book endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Multipart;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookInput, BookQuery, BookSearchQuery, BookSummary, BorrowRequest, BorrowResponse, ReturnResponse},
        pagination::{PaginatedBookSummaries, PaginatedBooks, PaginatedList},
    },
    services::images::ImageUpload,
    AppState,
};

use super::{links::GET_BOOKS, AuthenticatedUser};

/// Book form as posted by the catalog editor
#[derive(Debug, Default)]
struct BookForm {
    input: BookInput,
    image: Option<ImageUpload>,
}

/// Read the multipart fields `id`, `title`, `author`, `isbn`, `publicationYear`
/// and the optional file field `image`
async fn read_book_form(mut multipart: Multipart) -> AppResult<BookForm> {
    let mut form = BookForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "image" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Invalid image upload: {}", e)))?;
            // Browsers send an empty part when no file was chosen
            if !file_name.is_empty() || !bytes.is_empty() {
                form.image = Some(ImageUpload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid field '{}': {}", name, e)))?;

        match name.as_str() {
            "id" if !value.trim().is_empty() => form.input.id = Some(parse_number(&name, &value)?),
            "title" => form.input.title = value,
            "author" => form.input.author = value,
            "isbn" => form.input.isbn = value.trim().to_string(),
            "publicationYear" => form.input.publication_year = parse_number(&name, &value)?,
            _ => {}
        }
    }

    Ok(form)
}

fn parse_number(field: &str, value: &str) -> AppResult<i32> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Field '{}' must be a whole number", field)))
}

/// Get all books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All books", body = Vec<Book>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Book>>> {
    claims.require_user()?;
    let books = state.services.books.list_books().await?;
    Ok(Json(books))
}

/// Get one page of books with navigation links
#[utoipa::path(
    get,
    path = "/books/paginated-list",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "One page of books", body = PaginatedBooks),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn paginate_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<PaginatedList<Book>>> {
    claims.require_user()?;

    let mut page = state.services.books.paginate(&query).await?;
    page.add_pagination_links(state.urls.as_ref(), GET_BOOKS, &query.route_values())?;

    Ok(Json(page))
}

/// Search books by any combination of criteria
#[utoipa::path(
    get,
    path = "/books/search",
    tag = "books",
    params(BookSearchQuery),
    responses(
        (status = 200, description = "Matching books", body = PaginatedBookSummaries)
    )
)]
pub async fn search_books(
    State(state): State<AppState>,
    Query(query): Query<BookSearchQuery>,
) -> AppResult<Json<PaginatedList<BookSummary>>> {
    let results = state.services.books.search(&query).await?;
    Ok(Json(results))
}

/// Get a book with its genres
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Book>> {
    claims.require_user()?;
    let book = state.services.books.get_book(id).await?;
    Ok(Json(book))
}

/// Create a book from a multipart form with an optional cover image
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body(content = BookInput, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<Book>)> {
    claims.require_admin()?;

    let form = read_book_form(multipart).await?;
    let created = state.services.books.create_book(form.input, form.image).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a book from a multipart form; a new image replaces the old one
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body(content = BookInput, content_type = "multipart/form-data"),
    responses(
        (status = 204, description = "Book updated"),
        (status = 400, description = "Invalid input or ID mismatch", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book modified concurrently")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    let form = read_book_form(multipart).await?;
    state.services.books.update_book(id, form.input, form.image).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete a book and its cover image
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;
    state.services.books.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Lend a book to a user
#[utoipa::path(
    post,
    path = "/books/{id}/borrow",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = BorrowRequest,
    responses(
        (status = 200, description = "Book borrowed", body = BorrowResponse),
        (status = 400, description = "Book is already borrowed", body = crate::error::ErrorResponse),
        (status = 404, description = "Book or user not found"),
        (status = 409, description = "Book modified concurrently")
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<BorrowRequest>,
) -> AppResult<Json<BorrowResponse>> {
    claims.require_user()?;
    let borrowed = state.services.books.borrow_book(id, request.user_id).await?;
    Ok(Json(borrowed.into()))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/books/{id}/return",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 400, description = "Book is not borrowed", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book modified concurrently")
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ReturnResponse>> {
    claims.require_user()?;
    let book = state.services.books.return_book(id).await?;
    Ok(Json(book.into()))
}

/// Attach a genre to a book
#[utoipa::path(
    post,
    path = "/books/{id}/genres/{genre_id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID"),
        ("genre_id" = i32, Path, description = "Genre ID")
    ),
    responses(
        (status = 204, description = "Genre attached"),
        (status = 404, description = "Book or genre not found")
    )
)]
pub async fn add_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, genre_id)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;
    state.services.books.add_genre(id, genre_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Detach a genre from a book
#[utoipa::path(
    delete,
    path = "/books/{id}/genres/{genre_id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID"),
        ("genre_id" = i32, Path, description = "Genre ID")
    ),
    responses(
        (status = 204, description = "Genre detached (or was not attached)"),
        (status = 404, description = "Book or genre not found")
    )
)]
pub async fn remove_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, genre_id)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;
    state.services.books.remove_genre(id, genre_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

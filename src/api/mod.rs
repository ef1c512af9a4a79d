//! API handlers for the library REST endpoints

pub mod books;
pub mod genres;
pub mod health;
pub mod links;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Room left for the text fields of a book form on top of the image itself
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.config.images.max_bytes + FORM_OVERHEAD_BYTES;

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route("/books/paginated-list", get(books::paginate_books))
        .route("/books/search", get(books::search_books))
        .route(
            "/books/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        .route("/books/:id/borrow", post(books::borrow_book))
        .route("/books/:id/return", post(books::return_book))
        .route(
            "/books/:id/genres/:genre_id",
            post(books::add_genre).delete(books::remove_genre),
        )
        // Genres
        .route("/genres", get(genres::list_genres).post(genres::create_genre))
        .route(
            "/genres/:id",
            get(genres::get_genre).put(genres::update_genre).delete(genres::delete_genre),
        )
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/paginated-list", get(users::paginate_users))
        .route(
            "/users/:id",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state.clone());

    let mut app = Router::new()
        .nest("/api", api)
        .merge(openapi::create_openapi_router());

    let images_prefix = state.config.images.url_prefix.trim_end_matches('/');
    if !images_prefix.is_empty() {
        app = app.nest_service(images_prefix, ServeDir::new(&state.config.images.directory));
    }

    app.layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

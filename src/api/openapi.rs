//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, genres, health, users};

/// Registers the `bearer_auth` scheme referenced by protected endpoints
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library API",
        version = "1.0.0",
        description = "Library management REST API: catalog, genres, users and lending",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::paginate_books,
        books::search_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::add_genre,
        books::remove_genre,
        // Lending
        books::borrow_book,
        books::return_book,
        // Genres
        genres::list_genres,
        genres::get_genre,
        genres::create_genre,
        genres::update_genre,
        genres::delete_genre,
        // Users
        users::list_users,
        users::paginate_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::BookInput,
            crate::models::book::BorrowRequest,
            crate::models::book::BorrowResponse,
            crate::models::book::ReturnResponse,
            // Genres
            crate::models::genre::Genre,
            crate::models::genre::GenreInput,
            // Users
            crate::models::user::Role,
            crate::models::user::User,
            crate::models::user::UserSummary,
            crate::models::user::UserInput,
            // Pagination
            crate::models::pagination::Link,
            crate::models::pagination::PaginatedBooks,
            crate::models::pagination::PaginatedBookSummaries,
            crate::models::pagination::PaginatedUsers,
            // Health
            health::HealthResponse,
            // Errors
            crate::models::validation::FieldError,
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Catalog management and search"),
        (name = "lending", description = "Borrowing and returning books"),
        (name = "genres", description = "Genre management"),
        (name = "users", description = "User management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

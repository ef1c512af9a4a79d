//! Genre endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::genre::{Genre, GenreInput},
    AppState,
};

use super::AuthenticatedUser;

/// Get all genres
#[utoipa::path(
    get,
    path = "/genres",
    tag = "genres",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All genres", body = Vec<Genre>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_genres(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Genre>>> {
    claims.require_user()?;
    let genres = state.services.genres.list_genres().await?;
    Ok(Json(genres))
}

#[utoipa::path(
    get,
    path = "/genres/{id}",
    tag = "genres",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Genre ID")),
    responses(
        (status = 200, description = "Genre details", body = Genre),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn get_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Genre>> {
    claims.require_user()?;
    let genre = state.services.genres.get_genre(id).await?;
    Ok(Json(genre))
}

#[utoipa::path(
    post,
    path = "/genres",
    tag = "genres",
    security(("bearer_auth" = [])),
    request_body = GenreInput,
    responses(
        (status = 201, description = "Genre created", body = Genre),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(input): Json<GenreInput>,
) -> AppResult<(StatusCode, Json<Genre>)> {
    claims.require_admin()?;
    let created = state.services.genres.create_genre(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/genres/{id}",
    tag = "genres",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Genre ID")),
    request_body = GenreInput,
    responses(
        (status = 204, description = "Genre updated"),
        (status = 400, description = "Invalid input or ID mismatch"),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn update_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(input): Json<GenreInput>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;
    state.services.genres.update_genre(id, input).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a genre; books lose the association
#[utoipa::path(
    delete,
    path = "/genres/{id}",
    tag = "genres",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Genre ID")),
    responses(
        (status = 204, description = "Genre deleted"),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn delete_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;
    state.services.genres.delete_genre(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

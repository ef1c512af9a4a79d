//! User management endpoints (administrators only)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        pagination::{PaginatedList, PaginatedUsers},
        user::{User, UserInput, UserQuery, UserSummary},
    },
    AppState,
};

use super::{links::GET_USERS, AuthenticatedUser};

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All users", body = Vec<UserSummary>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<UserSummary>>> {
    claims.require_admin()?;

    let users = state.services.users.list_users().await?;
    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}

/// One page of users with navigation links
#[utoipa::path(
    get,
    path = "/users/paginated-list",
    tag = "users",
    security(("bearer_auth" = [])),
    params(UserQuery),
    responses(
        (status = 200, description = "One page of users", body = PaginatedUsers),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn paginate_users(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<PaginatedList<UserSummary>>> {
    claims.require_admin()?;

    let mut page = state.services.users.paginate(&query).await?.map(UserSummary::from);
    page.add_pagination_links(state.urls.as_ref(), GET_USERS, &query.route_values())?;

    Ok(Json(page))
}

/// Get a user with the books they currently hold
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<User>> {
    claims.require_admin()?;
    let user = state.services.users.get_user(id).await?;
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UserInput,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Username or email already exists")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(input): Json<UserInput>,
) -> AppResult<(StatusCode, Json<User>)> {
    claims.require_admin()?;
    let created = state.services.users.create_user(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UserInput,
    responses(
        (status = 204, description = "User updated"),
        (status = 400, description = "Invalid input or ID mismatch"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Username or email already exists")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(input): Json<UserInput>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;
    state.services.users.update_user(id, input).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a user; books they held become available
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;
    state.services.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

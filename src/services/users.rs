//! User management service

use crate::{
    error::{AppError, AppResult},
    models::{
        pagination::PaginatedList,
        user::{User, UserInput, UserQuery},
        validation::Validated,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        self.repository.users.list().await
    }

    /// Get a user along with the books they currently hold
    pub async fn get_user(&self, id: i32) -> AppResult<User> {
        let mut user = self
            .repository
            .users
            .find(id)
            .await?
            .ok_or_else(|| AppError::not_found("User", id))?;
        user.borrowed_books = self.repository.books.borrowed_by(id).await?;
        Ok(user)
    }

    pub async fn paginate(&self, query: &UserQuery) -> AppResult<PaginatedList<User>> {
        let page = query.page();
        let (users, total) = self
            .repository
            .users
            .page(query.sort_key(), query.direction(), page)
            .await?;
        Ok(PaginatedList::new(users, total, page))
    }

    pub async fn create_user(&self, input: UserInput) -> AppResult<User> {
        input.ensure_valid()?;
        let user = self.repository.users.insert(&input).await?;
        tracing::info!("Created user {} ({})", user.id, user.username);
        Ok(user)
    }

    pub async fn update_user(&self, id: i32, input: UserInput) -> AppResult<User> {
        if input.id.is_some_and(|body_id| body_id != id) {
            return Err(AppError::BadRequest(
                "The user ID does not match the route ID".to_string(),
            ));
        }
        input.ensure_valid()?;

        self.repository
            .users
            .update(id, &input)
            .await?
            .ok_or_else(|| AppError::not_found("User", id))
    }

    /// Books the user held become available again
    pub async fn delete_user(&self, id: i32) -> AppResult<()> {
        if !self.repository.users.delete(id).await? {
            return Err(AppError::not_found("User", id));
        }
        tracing::info!("Deleted user {}", id);
        Ok(())
    }
}

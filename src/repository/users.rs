//! Users repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{unique_violation, UserStore};
use crate::{
    error::AppResult,
    models::{
        pagination::{PageRequest, SortDirection},
        user::{User, UserInput, UserSortKey},
    },
};

const USER_COLUMNS: &str = "id, username, email, role";
const DUPLICATE_USER: &str = "A user with this username or email already exists";

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UsersRepository {
    /// Get user by ID
    async fn find(&self, id: i32) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users ORDER BY username, id", USER_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn page(
        &self,
        sort: UserSortKey,
        direction: SortDirection,
        page: PageRequest,
    ) -> AppResult<(Vec<User>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let query = format!(
            "SELECT {} FROM users ORDER BY {} {}, id LIMIT $1 OFFSET $2",
            USER_COLUMNS,
            sort.column(),
            direction.as_sql()
        );

        let users = sqlx::query_as::<_, User>(&query)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((users, total))
    }

    async fn insert(&self, user: &UserInput) -> AppResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, role) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.role.unwrap_or_default())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, DUPLICATE_USER))
    }

    /// Role is kept unless the input carries one
    async fn update(&self, id: i32, user: &UserInput) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                username = $1,
                email = $2,
                role = COALESCE($3, role),
                updated_at = NOW()
            WHERE id = $4
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.role)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unique_violation(e, DUPLICATE_USER))
    }

    /// Books held by the user become available through `ON DELETE SET NULL`
    async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

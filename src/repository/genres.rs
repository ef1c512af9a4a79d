//! Genres repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::GenreStore;
use crate::{
    error::AppResult,
    models::genre::{Genre, GenreInput},
};

#[derive(Clone)]
pub struct GenresRepository {
    pool: Pool<Postgres>,
}

impl GenresRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GenreStore for GenresRepository {
    async fn find(&self, id: i32) -> AppResult<Option<Genre>> {
        let genre = sqlx::query_as::<_, Genre>("SELECT id, name, description FROM genres WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(genre)
    }

    async fn list(&self) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>("SELECT id, name, description FROM genres ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(genres)
    }

    async fn insert(&self, genre: &GenreInput) -> AppResult<Genre> {
        let created = sqlx::query_as::<_, Genre>(
            "INSERT INTO genres (name, description) VALUES ($1, $2) RETURNING id, name, description",
        )
        .bind(&genre.name)
        .bind(&genre.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update(&self, id: i32, genre: &GenreInput) -> AppResult<Option<Genre>> {
        let updated = sqlx::query_as::<_, Genre>(
            r#"
            UPDATE genres SET name = $1, description = $2
            WHERE id = $3
            RETURNING id, name, description
            "#,
        )
        .bind(&genre.name)
        .bind(&genre.description)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    /// Associations are removed by the `book_genres` cascade
    async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM genres WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

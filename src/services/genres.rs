//! Genre management service

use crate::{
    error::{AppError, AppResult},
    models::{
        genre::{Genre, GenreInput},
        validation::Validated,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct GenresService {
    repository: Repository,
}

impl GenresService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.list().await
    }

    pub async fn get_genre(&self, id: i32) -> AppResult<Genre> {
        self.repository
            .genres
            .find(id)
            .await?
            .ok_or_else(|| AppError::not_found("Genre", id))
    }

    pub async fn create_genre(&self, input: GenreInput) -> AppResult<Genre> {
        input.ensure_valid()?;
        let genre = self.repository.genres.insert(&input).await?;
        tracing::info!("Created genre {} ({})", genre.id, genre.name);
        Ok(genre)
    }

    pub async fn update_genre(&self, id: i32, input: GenreInput) -> AppResult<Genre> {
        if input.id.is_some_and(|body_id| body_id != id) {
            return Err(AppError::BadRequest(
                "The genre ID does not match the route ID".to_string(),
            ));
        }
        input.ensure_valid()?;

        self.repository
            .genres
            .update(id, &input)
            .await?
            .ok_or_else(|| AppError::not_found("Genre", id))
    }

    /// Book associations go with the genre
    pub async fn delete_genre(&self, id: i32) -> AppResult<()> {
        if !self.repository.genres.delete(id).await? {
            return Err(AppError::not_found("Genre", id));
        }
        tracing::info!("Deleted genre {}", id);
        Ok(())
    }
}

//! Business logic services

pub mod books;
pub mod genres;
pub mod images;
pub mod users;

use std::sync::Arc;

use crate::repository::Repository;

use self::images::ImageStore;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub genres: genres::GenresService,
    pub users: users::UsersService,
}

impl Services {
    /// Create all services with the given repository and cover storage
    pub fn new(repository: Repository, images: Arc<dyn ImageStore>, max_image_bytes: usize) -> Self {
        Self {
            books: books::BooksService::new(repository.clone(), images, max_image_bytes),
            genres: genres::GenresService::new(repository.clone()),
            users: users::UsersService::new(repository),
        }
    }
}

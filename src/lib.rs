//! Library Management Server
//!
//! A REST JSON API for a small lending library: a book catalog with genres,
//! paginated listing and search, and borrow/return of books by users.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub urls: Arc<api::links::RouteUrls>,
}

impl AppState {
    pub fn new(config: AppConfig, services: services::Services) -> AppResult<Self> {
        let urls = api::links::RouteUrls::new(&config.server.public_url)?;
        Ok(Self {
            config: Arc::new(config),
            services: Arc::new(services),
            urls: Arc::new(urls),
        })
    }
}

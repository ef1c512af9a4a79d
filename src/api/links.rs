//! Named routes resolved to absolute URLs for pagination links

use url::Url;

use crate::{
    error::{AppError, AppResult},
    models::pagination::UrlTemplate,
};

pub const GET_BOOKS: &str = "GetBooks";
pub const GET_USERS: &str = "GetUsers";

const ROUTES: [(&str, &str); 2] = [
    (GET_BOOKS, "/api/books/paginated-list"),
    (GET_USERS, "/api/users/paginated-list"),
];

/// Builds links against the server's public base URL
#[derive(Debug, Clone)]
pub struct RouteUrls {
    base: Url,
}

impl RouteUrls {
    pub fn new(public_url: &str) -> AppResult<Self> {
        let base = Url::parse(public_url)
            .map_err(|e| AppError::Internal(format!("Invalid public URL '{}': {}", public_url, e)))?;
        Ok(Self { base })
    }
}

impl UrlTemplate for RouteUrls {
    fn build_url(&self, route_name: &str, params: &[(&str, String)]) -> AppResult<String> {
        let path = ROUTES
            .iter()
            .find(|(name, _)| *name == route_name)
            .map(|(_, path)| *path)
            .ok_or_else(|| AppError::Internal(format!("Unknown route '{}'", route_name)))?;

        let mut url = self
            .base
            .join(path)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));

        Ok(url.to_string())
    }
}

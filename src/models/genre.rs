//! Genre model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::validation::{attribute_errors, FieldError, Validated};

/// Genre. The books side of the association is never serialized from here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: i32,
    pub name: String,
    pub description: String,
}

/// Create/update genre request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct GenreInput {
    /// Must match the path id when present on update
    pub id: Option<i32>,
    #[validate(length(min = 2, max = 50, message = "The name must contain between 2 and 50 characters"))]
    pub name: String,
    #[validate(length(min = 10, max = 500, message = "The description must contain between 10 and 500 characters"))]
    pub description: String,
}

impl Validated for GenreInput {
    fn validation_errors(&self) -> Vec<FieldError> {
        attribute_errors(self)
    }
}

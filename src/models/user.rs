//! User model, roles and token claims

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::book::Book;
use super::pagination::{PageRequest, SortDirection};
use super::validation::{attribute_errors, require_non_blank, FieldError, Validated};
use crate::error::AppError;

/// User role, stored as its lowercase slug
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as Decode<Postgres>>::decode(value)?;
        Ok(s.parse()?)
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// User as stored; borrowed books are resolved through `books.borrower_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[sqlx(skip)]
    #[serde(default)]
    pub borrowed_books: Vec<Book>,
}

/// Short user representation for lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub email: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// Create/update user request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    /// Must match the path id when present on update
    pub id: Option<i32>,
    #[validate(length(min = 1, max = 50, message = "Username is required and cannot exceed 50 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub role: Option<Role>,
}

impl Validated for UserInput {
    fn validation_errors(&self) -> Vec<FieldError> {
        let mut errors = attribute_errors(self);
        require_non_blank(&mut errors, "email", &self.email, "Email is required");
        require_non_blank(&mut errors, "username", &self.username, "Username is required");
        errors
    }
}

/// Columns users can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortKey {
    Username,
    Email,
}

impl UserSortKey {
    /// Unknown keys fall back to username
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("email") => UserSortKey::Email,
            _ => UserSortKey::Username,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            UserSortKey::Username => "username",
            UserSortKey::Email => "email",
        }
    }
}

/// Paginated user listing parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
    /// username | email (default: username)
    pub sort_by: Option<String>,
    pub sort_descending: Option<bool>,
}

impl UserQuery {
    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.page_number, self.page_size)
    }

    pub fn sort_key(&self) -> UserSortKey {
        UserSortKey::from_param(self.sort_by.as_deref())
    }

    pub fn direction(&self) -> SortDirection {
        SortDirection::from_descending(self.sort_descending)
    }

    pub fn route_values(&self) -> Vec<(&'static str, String)> {
        let mut values = vec![("pageSize", self.page().page_size.to_string())];
        if let Some(ref sort_by) = self.sort_by {
            values.push(("sortBy", sort_by.clone()));
        }
        values.push(("sortDescending", self.sort_descending.unwrap_or(false).to_string()));
        values
    }
}

/// JWT claims issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    pub fn new(user_id: i32, username: &str, role: Role, ttl_seconds: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: username.to_string(),
            user_id,
            role,
            exp: now + ttl_seconds,
            iat: now,
        }
    }

    /// Create a new JWT token.
    ///
    /// Tokens are normally issued by the external identity provider; this
    /// exists for test harnesses and local tooling.
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    // Any authenticated role may read and borrow
    pub fn require_user(&self) -> Result<(), AppError> {
        match self.role {
            Role::User | Role::Admin => Ok(()),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }
}

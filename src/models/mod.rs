//! Data models for the library server

pub mod book;
pub mod genre;
pub mod pagination;
pub mod user;
pub mod validation;

// Re-export commonly used types
pub use book::{Book, BookInput, BookSummary, BorrowResponse, ReturnResponse};
pub use genre::{Genre, GenreInput};
pub use pagination::{Link, PageRequest, PaginatedList, SortDirection};
pub use user::{Role, User, UserClaims, UserInput, UserSummary};
pub use validation::{FieldError, Validated};

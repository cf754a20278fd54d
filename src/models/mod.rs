//! Data models for the catalog

pub mod account;
pub mod author;
pub mod book;
pub mod bookshelf;
pub mod form;
pub mod genre;
pub mod pagination;

// Re-export commonly used types
pub use account::{Account, Action, Capability, Entity, UserClaims};
pub use author::{Author, AuthorForm, AuthorRecord, AuthorRef};
pub use book::{Book, BookForm, BookMediaField, BookPayload, BookRecord, BookSummary};
pub use bookshelf::Bookshelf;
pub use form::{FormData, Upload};
pub use genre::{Genre, GenreForm, GenreRecord};
pub use pagination::{Page, PageQuery, PageRequest};

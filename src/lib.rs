//! ReadMe library catalog server
//!
//! Authors, genres and books with access-gated edit flows, per-user bookshelves
//! and a small REST API for books.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod media;
pub mod models;
pub mod repository;
pub mod services;
pub mod slug;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

//! Repository layer: entity store traits and their backends

pub mod memory;
pub mod postgres;
pub mod relations;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        Account, Author, AuthorRecord, AuthorRef, Book, BookMediaField, BookRecord, Bookshelf,
        Genre, GenreRecord,
    },
};

#[async_trait]
pub trait AuthorStore: Send + Sync {
    async fn author_count(&self) -> AppResult<i64>;

    /// Authors ordered by first name, then last name
    async fn author_list(&self, offset: i64, limit: i64) -> AppResult<Vec<Author>>;

    /// Every author, for form choices
    async fn author_choices(&self) -> AppResult<Vec<AuthorRef>>;

    async fn author_get_by_id(&self, id: i32) -> AppResult<Author>;

    async fn author_get_by_slug(&self, slug: &str) -> AppResult<Author>;

    /// Whether another author (not `exclude`) already has this name pair
    async fn author_name_taken(
        &self,
        first_name: &str,
        last_name: &str,
        exclude: Option<i32>,
    ) -> AppResult<bool>;

    async fn author_create(&self, record: &AuthorRecord) -> AppResult<Author>;

    async fn author_update(&self, id: i32, record: &AuthorRecord) -> AppResult<Author>;

    async fn author_set_image(&self, id: i32, image: Option<&str>) -> AppResult<()>;

    /// Delete an author, releasing its references per `relations::AUTHOR_REFERENCES`
    async fn author_delete(&self, id: i32) -> AppResult<()>;
}

#[async_trait]
pub trait GenreStore: Send + Sync {
    async fn genre_count(&self) -> AppResult<i64>;

    /// Every genre ordered by name
    async fn genre_list(&self) -> AppResult<Vec<Genre>>;

    async fn genre_get_by_slug(&self, slug: &str) -> AppResult<Genre>;

    /// Genres among `ids` that exist, ordered by name
    async fn genre_get_many(&self, ids: &[i32]) -> AppResult<Vec<Genre>>;

    async fn genre_name_taken(&self, name: &str, exclude: Option<i32>) -> AppResult<bool>;

    async fn genre_create(&self, record: &GenreRecord) -> AppResult<Genre>;

    async fn genre_update(&self, id: i32, record: &GenreRecord) -> AppResult<Genre>;

    async fn genre_delete(&self, id: i32) -> AppResult<()>;
}

/// Books are always returned with their author reference and genres loaded
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn book_count(&self) -> AppResult<i64>;

    /// Books ordered by title, then author
    async fn book_list(&self, offset: i64, limit: i64) -> AppResult<Vec<Book>>;

    async fn book_count_by_author(&self, author_id: i32) -> AppResult<i64>;

    async fn book_list_by_author(
        &self,
        author_id: i32,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<Book>>;

    async fn book_get_by_id(&self, id: i32) -> AppResult<Book>;

    async fn book_get_by_slug(&self, slug: &str) -> AppResult<Book>;

    async fn book_title_taken(&self, title: &str, exclude: Option<i32>) -> AppResult<bool>;

    /// Insert a book with its genre links
    async fn book_create(&self, record: &BookRecord) -> AppResult<Book>;

    /// Replace a book's fields and genre links
    async fn book_update(&self, id: i32, record: &BookRecord) -> AppResult<Book>;

    async fn book_set_media(
        &self,
        id: i32,
        field: BookMediaField,
        path: Option<&str>,
    ) -> AppResult<()>;

    async fn book_delete(&self, id: i32) -> AppResult<()>;
}

#[async_trait]
pub trait BookshelfStore: Send + Sync {
    async fn bookshelf_get(&self, account_id: i32) -> AppResult<Option<Bookshelf>>;

    /// Fetch the account's shelf, creating it on first access
    async fn bookshelf_get_or_create(&self, account_id: i32) -> AppResult<Bookshelf>;

    async fn bookshelf_count_books(&self, shelf_id: i32) -> AppResult<i64>;

    /// Shelf books ordered by title
    async fn bookshelf_list_books(
        &self,
        shelf_id: i32,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<Book>>;

    async fn bookshelf_contains(&self, shelf_id: i32, book_id: i32) -> AppResult<bool>;

    /// Add a book; adding it twice is a no-op
    async fn bookshelf_add_book(&self, shelf_id: i32, book_id: i32) -> AppResult<()>;

    /// Returns false when the book was not on the shelf
    async fn bookshelf_remove_book(&self, shelf_id: i32, book_id: i32) -> AppResult<bool>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn account_get(&self, id: i32) -> AppResult<Option<Account>>;

    /// Mirror an identity, refreshing its username
    async fn account_upsert(&self, id: i32, username: &str) -> AppResult<Account>;

    /// Delete the account and everything it owns; false when unknown
    async fn account_delete(&self, id: i32) -> AppResult<bool>;
}

/// A complete entity store backend
#[async_trait]
pub trait CatalogStore: AuthorStore + GenreStore + BookStore + BookshelfStore + AccountStore {
    fn backend(&self) -> &'static str;

    /// Check the backend can serve requests
    async fn ping(&self) -> AppResult<()>;
}

/// Shared handle on the configured store
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn CatalogStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Repository backed by a Postgres pool
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self::new(Arc::new(postgres::PgStore::new(pool)))
    }

    /// Repository backed by process memory
    pub fn memory() -> Self {
        Self::new(Arc::new(memory::MemoryStore::new()))
    }
}

impl Deref for Repository {
    type Target = dyn CatalogStore;

    fn deref(&self) -> &Self::Target {
        self.store.as_ref()
    }
}

//! Bookshelf service

use crate::{
    error::AppResult,
    models::{Book, Bookshelf, Page, PageRequest, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct BookshelfService {
    repository: Repository,
    page_size: u32,
}

impl BookshelfService {
    pub fn new(repository: Repository, page_size: u32) -> Self {
        Self {
            repository,
            page_size,
        }
    }

    /// The user's shelf, mirroring the account and creating the shelf on first access
    pub async fn shelf(&self, claims: &UserClaims) -> AppResult<Bookshelf> {
        self.repository
            .account_upsert(claims.user_id, &claims.username)
            .await?;
        self.repository.bookshelf_get_or_create(claims.user_id).await
    }

    pub async fn page(
        &self,
        claims: &UserClaims,
        page: Option<&str>,
    ) -> AppResult<(Bookshelf, Page<Book>)> {
        let shelf = self.shelf(claims).await?;
        let total = self.repository.bookshelf_count_books(shelf.id).await?;
        let request = PageRequest::resolve(page, self.page_size, total);
        let books = self
            .repository
            .bookshelf_list_books(shelf.id, request.offset(), request.limit())
            .await?;
        Ok((shelf, request.into_page(books)))
    }

    /// Whether the book is on the user's shelf; never creates anything
    pub async fn contains(&self, claims: &UserClaims, book_id: i32) -> AppResult<bool> {
        match self.repository.bookshelf_get(claims.user_id).await? {
            Some(shelf) => self.repository.bookshelf_contains(shelf.id, book_id).await,
            None => Ok(false),
        }
    }

    pub async fn add(&self, claims: &UserClaims, slug: &str) -> AppResult<Book> {
        let book = self.repository.book_get_by_slug(slug).await?;
        let shelf = self.shelf(claims).await?;
        self.repository.bookshelf_add_book(shelf.id, book.id).await?;
        tracing::info!(user_id = claims.user_id, book = %book.slug, "Book added to bookshelf");
        Ok(book)
    }

    pub async fn remove(&self, claims: &UserClaims, slug: &str) -> AppResult<Book> {
        let book = self.repository.book_get_by_slug(slug).await?;
        let shelf = self.shelf(claims).await?;
        if self
            .repository
            .bookshelf_remove_book(shelf.id, book.id)
            .await?
        {
            tracing::info!(user_id = claims.user_id, book = %book.slug, "Book removed from bookshelf");
        }
        Ok(book)
    }
}

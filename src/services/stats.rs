//! Catalog statistics shown on the index page

use serde::Serialize;

use crate::{
    error::AppResult,
    repository::Repository,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub num_books: i64,
    pub num_authors: i64,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn counts(&self) -> AppResult<CatalogCounts> {
        let (num_books, num_authors) = tokio::try_join!(
            self.repository.book_count(),
            self.repository.author_count()
        )?;
        Ok(CatalogCounts {
            num_books,
            num_authors,
        })
    }
}

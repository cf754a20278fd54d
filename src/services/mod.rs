//! Business logic services

pub mod accounts;
pub mod authors;
pub mod books;
pub mod bookshelf;
pub mod genres;
pub mod stats;
pub mod uploads;

use std::sync::Arc;

use crate::{config::CatalogConfig, media::MediaStorage, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub accounts: accounts::AccountsService,
    pub authors: authors::AuthorsService,
    pub books: books::BooksService,
    pub bookshelf: bookshelf::BookshelfService,
    pub genres: genres::GenresService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services over one repository and media storage
    pub fn new(
        repository: Repository,
        media: Arc<dyn MediaStorage>,
        catalog: &CatalogConfig,
    ) -> Self {
        let files = uploads::MediaFiles::new(media);
        Self {
            accounts: accounts::AccountsService::new(repository.clone()),
            authors: authors::AuthorsService::new(
                repository.clone(),
                files.clone(),
                catalog.page_size,
            ),
            books: books::BooksService::new(repository.clone(), files, catalog.page_size),
            bookshelf: bookshelf::BookshelfService::new(repository.clone(), catalog.page_size),
            genres: genres::GenresService::new(repository.clone()),
            stats: stats::StatsService::new(repository.clone()),
            repository,
        }
    }
}

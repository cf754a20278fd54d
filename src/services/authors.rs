//! Author service

use crate::{
    error::{AppError, AppResult},
    media::MediaCategory,
    models::{
        author::AUTHOR_EXISTS, Author, AuthorForm, AuthorRecord, Book, FormData, Page,
        PageRequest,
    },
    repository::Repository,
};

use super::uploads::MediaFiles;

#[derive(Clone)]
pub struct AuthorsService {
    repository: Repository,
    media: MediaFiles,
    page_size: u32,
}

impl AuthorsService {
    pub fn new(repository: Repository, media: MediaFiles, page_size: u32) -> Self {
        Self {
            repository,
            media,
            page_size,
        }
    }

    pub async fn list(&self, page: Option<&str>) -> AppResult<Page<Author>> {
        let total = self.repository.author_count().await?;
        let request = PageRequest::resolve(page, self.page_size, total);
        let authors = self
            .repository
            .author_list(request.offset(), request.limit())
            .await?;
        Ok(request.into_page(authors))
    }

    pub async fn get_by_slug(&self, slug: &str) -> AppResult<Author> {
        self.repository.author_get_by_slug(slug).await
    }

    /// Author with one page of their books
    pub async fn detail(&self, slug: &str, page: Option<&str>) -> AppResult<(Author, Page<Book>)> {
        let author = self.repository.author_get_by_slug(slug).await?;
        let total = self.repository.book_count_by_author(author.id).await?;
        let request = PageRequest::resolve(page, self.page_size, total);
        let books = self
            .repository
            .book_list_by_author(author.id, request.offset(), request.limit())
            .await?;
        Ok((author, request.into_page(books)))
    }

    async fn validate(&self, data: &FormData, current: Option<i32>) -> AppResult<AuthorRecord> {
        let (form, mut errors) = AuthorForm::parse(data);
        if !form.first_name.is_empty()
            && !form.last_name.is_empty()
            && self
                .repository
                .author_name_taken(&form.first_name, &form.last_name, current)
                .await?
        {
            errors.add_non_field(AUTHOR_EXISTS);
        }
        form.clean(errors).map_err(AppError::Validation)
    }

    pub async fn create(&self, mut data: FormData) -> AppResult<Author> {
        let record = self.validate(&data, None).await?;
        let mut author = self
            .repository
            .author_create(&record)
            .await
            .map_err(AppError::into_save_failed)?;

        if let Some(upload) = data.take_file("image") {
            let path = match self
                .media
                .store(MediaCategory::Authors, author.id, &author.slug, &upload, None)
                .await
            {
                Ok(path) => path,
                Err(e) => {
                    if let Err(e) = self.repository.author_delete(author.id).await {
                        tracing::error!(id = author.id, "Failed to roll back author create: {}", e);
                    }
                    self.media.purge(MediaCategory::Authors, author.id).await;
                    return Err(e);
                }
            };
            self.repository.author_set_image(author.id, Some(&path)).await?;
            author.image = Some(path);
        }

        tracing::info!(id = author.id, slug = %author.slug, "Author created");
        Ok(author)
    }

    pub async fn update(&self, slug: &str, mut data: FormData) -> AppResult<Author> {
        let current = self.repository.author_get_by_slug(slug).await?;
        let record = self.validate(&data, Some(current.id)).await?;
        let mut author = self
            .repository
            .author_update(current.id, &record)
            .await
            .map_err(AppError::into_save_failed)?;

        let image = match data.take_file("image") {
            // The row is saved by now; a failed upload keeps the old portrait
            Some(upload) => match self
                .media
                .store(
                    MediaCategory::Authors,
                    author.id,
                    &author.slug,
                    &upload,
                    current.image.as_deref(),
                )
                .await
            {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!(id = author.id, "Failed to store author portrait: {}", e);
                    None
                }
            },
            None if author.slug != current.slug => {
                self.media
                    .follow_slug(current.image.as_deref(), &author.slug)
                    .await
            }
            None => None,
        };
        if let Some(path) = image {
            self.repository.author_set_image(author.id, Some(&path)).await?;
            author.image = Some(path);
        }

        tracing::info!(id = author.id, slug = %author.slug, "Author updated");
        Ok(author)
    }

    pub async fn delete(&self, slug: &str) -> AppResult<()> {
        let author = self.repository.author_get_by_slug(slug).await?;
        self.repository.author_delete(author.id).await?;
        self.media.purge(MediaCategory::Authors, author.id).await;
        tracing::info!(id = author.id, slug = %author.slug, "Author deleted");
        Ok(())
    }
}

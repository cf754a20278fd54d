//! Book service

use std::collections::BTreeSet;

use crate::{
    error::{AppError, AppResult, FormErrors},
    media::MediaCategory,
    models::{
        book::BOOK_EXISTS, form::INVALID_CHOICE, AuthorRef, Book, BookForm, BookMediaField,
        BookPayload, BookRecord, FormData, Genre, Page, PageRequest, Upload,
    },
    repository::Repository,
};

use super::uploads::MediaFiles;

/// Form field each book media column is uploaded through
const MEDIA_FIELDS: [(BookMediaField, &str); 2] = [
    (BookMediaField::Image, "image"),
    (BookMediaField::File, "link_to_file"),
];

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
    media: MediaFiles,
    page_size: u32,
}

impl BooksService {
    pub fn new(repository: Repository, media: MediaFiles, page_size: u32) -> Self {
        Self {
            repository,
            media,
            page_size,
        }
    }

    pub async fn list(&self, page: Option<&str>) -> AppResult<Page<Book>> {
        let total = self.repository.book_count().await?;
        let request = PageRequest::resolve(page, self.page_size, total);
        let books = self
            .repository
            .book_list(request.offset(), request.limit())
            .await?;
        Ok(request.into_page(books))
    }

    /// Every book, for the REST listing
    pub async fn list_all(&self) -> AppResult<Vec<Book>> {
        let total = self.repository.book_count().await?;
        self.repository.book_list(0, total).await
    }

    pub async fn count(&self) -> AppResult<i64> {
        self.repository.book_count().await
    }

    pub async fn get_by_slug(&self, slug: &str) -> AppResult<Book> {
        self.repository.book_get_by_slug(slug).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        self.repository.book_get_by_id(id).await
    }

    /// Author and genre choices for the add/edit forms
    pub async fn choices(&self) -> AppResult<(Vec<AuthorRef>, Vec<Genre>)> {
        let authors = self.repository.author_choices().await?;
        let genres = self.repository.genre_list().await?;
        Ok((authors, genres))
    }

    /// Choice, uniqueness and field checks; everything is reported together
    async fn validate(
        &self,
        form: BookForm,
        mut errors: FormErrors,
        current: Option<i32>,
    ) -> AppResult<BookRecord> {
        if let Some(author_id) = form.author_id {
            match self.repository.author_get_by_id(author_id).await {
                Ok(_) => {}
                Err(AppError::NotFound(_)) => errors.add("author", INVALID_CHOICE),
                Err(e) => return Err(e),
            }
        }
        if !form.genre_ids.is_empty() {
            let requested: BTreeSet<i32> = form.genre_ids.iter().copied().collect();
            let found = self.repository.genre_get_many(&form.genre_ids).await?;
            if found.len() != requested.len() {
                errors.add("genres", INVALID_CHOICE);
            }
        }
        if !form.title.is_empty()
            && self
                .repository
                .book_title_taken(&form.title, current)
                .await?
        {
            errors.add("title", BOOK_EXISTS);
        }
        form.clean(errors).map_err(AppError::Validation)
    }

    async fn insert(&self, record: BookRecord, uploads: Vec<(BookMediaField, Upload)>) -> AppResult<Book> {
        let mut book = self
            .repository
            .book_create(&record)
            .await
            .map_err(AppError::into_save_failed)?;

        for (field, upload) in uploads {
            let path = match self
                .media
                .store(MediaCategory::Books, book.id, &book.slug, &upload, None)
                .await
            {
                Ok(path) => path,
                Err(e) => {
                    self.discard(&book).await;
                    return Err(e);
                }
            };
            self.repository
                .book_set_media(book.id, field, Some(&path))
                .await?;
            set_media(&mut book, field, path);
        }

        tracing::info!(id = book.id, slug = %book.slug, "Book created");
        Ok(book)
    }

    /// Undo a create whose media could not be written
    async fn discard(&self, book: &Book) {
        if let Err(e) = self.repository.book_delete(book.id).await {
            tracing::error!(id = book.id, "Failed to roll back book create: {}", e);
        }
        self.media.purge(MediaCategory::Books, book.id).await;
    }

    /// Save new values over `current`, then bring its media files in line.
    /// The row is already saved when an upload fails, so the old path is kept.
    async fn replace(
        &self,
        current: Book,
        record: BookRecord,
        mut uploads: Vec<(BookMediaField, Upload)>,
    ) -> AppResult<Book> {
        let mut book = self
            .repository
            .book_update(current.id, &record)
            .await
            .map_err(AppError::into_save_failed)?;
        // Columns are not part of the record; keep the stored paths
        book.image = current.image.clone();
        book.link_to_file = current.link_to_file.clone();

        for field in [BookMediaField::Image, BookMediaField::File] {
            let previous = field.current(&current);
            let path = match uploads.iter().position(|(f, _)| *f == field) {
                Some(index) => {
                    let (_, upload) = uploads.swap_remove(index);
                    match self
                        .media
                        .store(MediaCategory::Books, book.id, &book.slug, &upload, previous)
                        .await
                    {
                        Ok(path) => Some(path),
                        Err(e) => {
                            tracing::warn!(id = book.id, "Failed to store uploaded media: {}", e);
                            None
                        }
                    }
                }
                None if book.slug != current.slug => {
                    self.media.follow_slug(previous, &book.slug).await
                }
                None => None,
            };
            if let Some(path) = path {
                self.repository
                    .book_set_media(book.id, field, Some(&path))
                    .await?;
                set_media(&mut book, field, path);
            }
        }

        tracing::info!(id = book.id, slug = %book.slug, "Book updated");
        Ok(book)
    }

    pub async fn create(&self, mut data: FormData) -> AppResult<Book> {
        let (form, errors) = BookForm::parse(&data);
        let record = self.validate(form, errors, None).await?;
        self.insert(record, take_uploads(&mut data)).await
    }

    pub async fn update(&self, slug: &str, mut data: FormData) -> AppResult<Book> {
        let current = self.repository.book_get_by_slug(slug).await?;
        let (mut form, errors) = BookForm::parse(&data);
        form.rating = form.rating.or(Some(current.rating.into()));
        let record = self.validate(form, errors, Some(current.id)).await?;
        self.replace(current, record, take_uploads(&mut data)).await
    }

    /// Create from a REST payload; the rating starts at 0
    pub async fn create_from_payload(&self, payload: BookPayload) -> AppResult<Book> {
        let record = self
            .validate(payload.into_form(0), FormErrors::new(), None)
            .await?;
        self.insert(record, Vec::new()).await
    }

    /// Update from a REST payload; the stored rating is kept
    pub async fn update_from_payload(&self, id: i32, payload: BookPayload) -> AppResult<Book> {
        let current = self.repository.book_get_by_id(id).await?;
        let form = payload.into_form(current.rating);
        let record = self.validate(form, FormErrors::new(), Some(id)).await?;
        self.replace(current, record, Vec::new()).await
    }

    async fn remove(&self, book: Book) -> AppResult<()> {
        self.repository.book_delete(book.id).await?;
        self.media.purge(MediaCategory::Books, book.id).await;
        tracing::info!(id = book.id, slug = %book.slug, "Book deleted");
        Ok(())
    }

    pub async fn delete(&self, slug: &str) -> AppResult<()> {
        let book = self.repository.book_get_by_slug(slug).await?;
        self.remove(book).await
    }

    pub async fn delete_by_id(&self, id: i32) -> AppResult<()> {
        let book = self.repository.book_get_by_id(id).await?;
        self.remove(book).await
    }
}

fn take_uploads(data: &mut FormData) -> Vec<(BookMediaField, Upload)> {
    MEDIA_FIELDS
        .iter()
        .filter_map(|(field, name)| data.take_file(name).map(|upload| (*field, upload)))
        .collect()
}

fn set_media(book: &mut Book, field: BookMediaField, path: String) {
    match field {
        BookMediaField::Image => book.image = Some(path),
        BookMediaField::File => book.link_to_file = Some(path),
    }
}

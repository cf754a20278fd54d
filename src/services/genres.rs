//! Genre service

use crate::{
    error::{AppError, AppResult, FormErrors},
    models::{genre::GENRE_EXISTS, FormData, Genre, GenreForm, GenreRecord},
    repository::Repository,
};

#[derive(Clone)]
pub struct GenresService {
    repository: Repository,
}

impl GenresService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// All genres ordered by name
    pub async fn list(&self) -> AppResult<Vec<Genre>> {
        self.repository.genre_list().await
    }

    pub async fn count(&self) -> AppResult<i64> {
        self.repository.genre_count().await
    }

    pub async fn get_by_slug(&self, slug: &str) -> AppResult<Genre> {
        self.repository.genre_get_by_slug(slug).await
    }

    async fn validate(&self, data: &FormData, current: Option<i32>) -> AppResult<GenreRecord> {
        let form = GenreForm::parse(data);
        let mut errors = FormErrors::new();
        if !form.name.is_empty()
            && self
                .repository
                .genre_name_taken(&form.name, current)
                .await?
        {
            errors.add("name", GENRE_EXISTS);
        }
        form.clean(errors).map_err(AppError::Validation)
    }

    pub async fn create(&self, data: FormData) -> AppResult<Genre> {
        let record = self.validate(&data, None).await?;
        let genre = self
            .repository
            .genre_create(&record)
            .await
            .map_err(AppError::into_save_failed)?;
        tracing::info!(id = genre.id, slug = %genre.slug, "Genre created");
        Ok(genre)
    }

    pub async fn update(&self, slug: &str, data: FormData) -> AppResult<Genre> {
        let current = self.repository.genre_get_by_slug(slug).await?;
        let record = self.validate(&data, Some(current.id)).await?;
        let genre = self
            .repository
            .genre_update(current.id, &record)
            .await
            .map_err(AppError::into_save_failed)?;
        tracing::info!(id = genre.id, slug = %genre.slug, "Genre updated");
        Ok(genre)
    }

    /// Delete a genre; books keep existing without it
    pub async fn delete(&self, slug: &str) -> AppResult<()> {
        let genre = self.repository.genre_get_by_slug(slug).await?;
        self.repository.genre_delete(genre.id).await?;
        tracing::info!(id = genre.id, slug = %genre.slug, "Genre deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_identical_genre_is_rejected() {
        let genres = GenresService::new(Repository::memory());
        let data = FormData::new().with_field("name", "test_genre");

        genres.create(data.clone()).await.unwrap();
        let err = genres.create(data).await.unwrap_err();

        match err {
            AppError::Validation(errors) => {
                assert_eq!(errors.fields["name"], vec![GENRE_EXISTS]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(genres.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rename_recomputes_slug() {
        let genres = GenresService::new(Repository::memory());
        genres
            .create(FormData::new().with_field("name", "Фантастика"))
            .await
            .unwrap();

        let genre = genres
            .update("fantastika", FormData::new().with_field("name", "Научная фантастика"))
            .await
            .unwrap();
        assert_eq!(genre.slug, "nauchnaia-fantastika");
    }

    #[tokio::test]
    async fn keeping_own_name_is_not_a_duplicate() {
        let genres = GenresService::new(Repository::memory());
        genres
            .create(FormData::new().with_field("name", "Драма"))
            .await
            .unwrap();
        genres
            .update("drama", FormData::new().with_field("name", "Драма"))
            .await
            .unwrap();
    }
}

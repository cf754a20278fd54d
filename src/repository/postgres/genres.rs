//! Genre methods on the Postgres store

use async_trait::async_trait;

use super::{release, write_error, PgStore};
use crate::{
    error::{AppError, AppResult},
    models::{Genre, GenreRecord},
    repository::{relations::GENRE_REFERENCES, GenreStore},
};

#[async_trait]
impl GenreStore for PgStore {
    async fn genre_count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM genres")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn genre_list(&self) -> AppResult<Vec<Genre>> {
        let rows = sqlx::query_as::<_, Genre>("SELECT * FROM genres ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn genre_get_by_slug(&self, slug: &str) -> AppResult<Genre> {
        sqlx::query_as::<_, Genre>("SELECT * FROM genres WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", slug)))
    }

    async fn genre_get_many(&self, ids: &[i32]) -> AppResult<Vec<Genre>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, Genre>("SELECT * FROM genres WHERE id = ANY($1) ORDER BY name")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn genre_name_taken(&self, name: &str, exclude: Option<i32>) -> AppResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM genres WHERE name = $1 AND ($2::int IS NULL OR id <> $2))",
        )
        .bind(name)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn genre_create(&self, record: &GenreRecord) -> AppResult<Genre> {
        let row = sqlx::query_as::<_, Genre>(
            "INSERT INTO genres (name, slug) VALUES ($1, $2) RETURNING *",
        )
        .bind(&record.name)
        .bind(&record.slug)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(row)
    }

    async fn genre_update(&self, id: i32, record: &GenreRecord) -> AppResult<Genre> {
        sqlx::query_as::<_, Genre>(
            "UPDATE genres SET name = $2, slug = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&record.name)
        .bind(&record.slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(write_error)?
        .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))
    }

    async fn genre_delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        release(&mut tx, GENRE_REFERENCES, id).await?;

        let result = sqlx::query("DELETE FROM genres WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(write_error)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Genre {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }
}

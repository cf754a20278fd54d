//! Author methods on the Postgres store

use async_trait::async_trait;

use super::{release, write_error, PgStore};
use crate::{
    error::{AppError, AppResult},
    models::{Author, AuthorRecord, AuthorRef},
    repository::{relations::AUTHOR_REFERENCES, AuthorStore},
};

#[async_trait]
impl AuthorStore for PgStore {
    async fn author_count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn author_list(&self, offset: i64, limit: i64) -> AppResult<Vec<Author>> {
        let rows = sqlx::query_as::<_, Author>(
            "SELECT * FROM authors ORDER BY first_name, last_name, id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn author_choices(&self) -> AppResult<Vec<AuthorRef>> {
        let rows = sqlx::query_as::<_, AuthorRef>(
            "SELECT id, first_name, last_name, slug FROM authors ORDER BY first_name, last_name, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn author_get_by_id(&self, id: i32) -> AppResult<Author> {
        sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))
    }

    async fn author_get_by_slug(&self, slug: &str) -> AppResult<Author> {
        sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", slug)))
    }

    async fn author_name_taken(
        &self,
        first_name: &str,
        last_name: &str,
        exclude: Option<i32>,
    ) -> AppResult<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM authors
                WHERE first_name = $1 AND last_name = $2
                  AND ($3::int IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(first_name)
        .bind(last_name)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn author_create(&self, record: &AuthorRecord) -> AppResult<Author> {
        let row = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (first_name, last_name, slug, date_of_birth, date_of_death, about)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(&record.slug)
        .bind(record.date_of_birth)
        .bind(record.date_of_death)
        .bind(&record.about)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(row)
    }

    async fn author_update(&self, id: i32, record: &AuthorRecord) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors
            SET first_name = $2, last_name = $3, slug = $4, date_of_birth = $5,
                date_of_death = $6, about = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(&record.slug)
        .bind(record.date_of_birth)
        .bind(record.date_of_death)
        .bind(&record.about)
        .fetch_optional(&self.pool)
        .await
        .map_err(write_error)?
        .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))
    }

    async fn author_set_image(&self, id: i32, image: Option<&str>) -> AppResult<()> {
        let result = sqlx::query("UPDATE authors SET image = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(image)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Author {} not found", id)));
        }
        Ok(())
    }

    async fn author_delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        release(&mut tx, AUTHOR_REFERENCES, id).await?;

        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(write_error)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Author {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }
}

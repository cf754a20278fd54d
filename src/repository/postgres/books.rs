//! Book methods on the Postgres store

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgConnection;

use super::{release, write_error, PgStore};
use crate::{
    error::{AppError, AppResult},
    models::{AuthorRef, Book, BookMediaField, BookRecord, Genre},
    repository::{relations::BOOK_REFERENCES, BookStore},
};

impl PgStore {
    /// Fill in author references and genres for a batch of books
    pub(super) async fn load_relations(&self, books: &mut [Book]) -> AppResult<()> {
        if books.is_empty() {
            return Ok(());
        }
        let book_ids: Vec<i32> = books.iter().map(|b| b.id).collect();
        let author_ids: Vec<i32> = books.iter().filter_map(|b| b.author_id).collect();

        let authors: HashMap<i32, AuthorRef> = if author_ids.is_empty() {
            HashMap::new()
        } else {
            sqlx::query_as::<_, AuthorRef>(
                "SELECT id, first_name, last_name, slug FROM authors WHERE id = ANY($1)",
            )
            .bind(&author_ids)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect()
        };

        let links = sqlx::query_as::<_, (i32, i32, String, String)>(
            r#"
            SELECT bg.book_id, g.id, g.name, g.slug
            FROM book_genres bg
            JOIN genres g ON g.id = bg.genre_id
            WHERE bg.book_id = ANY($1)
            ORDER BY g.name
            "#,
        )
        .bind(&book_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut genres: HashMap<i32, Vec<Genre>> = HashMap::new();
        for (book_id, id, name, slug) in links {
            genres.entry(book_id).or_default().push(Genre { id, name, slug });
        }

        for book in books.iter_mut() {
            book.author = book.author_id.and_then(|id| authors.get(&id).cloned());
            book.genres = genres.remove(&book.id).unwrap_or_default();
        }
        Ok(())
    }

    async fn with_relations(&self, mut book: Book) -> AppResult<Book> {
        self.load_relations(std::slice::from_mut(&mut book)).await?;
        Ok(book)
    }
}

async fn replace_genres(conn: &mut PgConnection, book_id: i32, genre_ids: &[i32]) -> AppResult<()> {
    sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
        .bind(book_id)
        .execute(&mut *conn)
        .await?;
    if !genre_ids.is_empty() {
        sqlx::query("INSERT INTO book_genres (book_id, genre_id) SELECT $1, UNNEST($2::int[])")
            .bind(book_id)
            .bind(genre_ids)
            .execute(&mut *conn)
            .await
            .map_err(write_error)?;
    }
    Ok(())
}

#[async_trait]
impl BookStore for PgStore {
    async fn book_count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn book_list(&self, offset: i64, limit: i64) -> AppResult<Vec<Book>> {
        let mut rows = sqlx::query_as::<_, Book>(
            "SELECT * FROM books ORDER BY title, author_id NULLS FIRST, id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        self.load_relations(&mut rows).await?;
        Ok(rows)
    }

    async fn book_count_by_author(&self, author_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn book_list_by_author(
        &self,
        author_id: i32,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<Book>> {
        let mut rows = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE author_id = $1 ORDER BY title, id LIMIT $2 OFFSET $3",
        )
        .bind(author_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        self.load_relations(&mut rows).await?;
        Ok(rows)
    }

    async fn book_get_by_id(&self, id: i32) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;
        self.with_relations(book).await
    }

    async fn book_get_by_slug(&self, slug: &str) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", slug)))?;
        self.with_relations(book).await
    }

    async fn book_title_taken(&self, title: &str, exclude: Option<i32>) -> AppResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE title = $1 AND ($2::int IS NULL OR id <> $2))",
        )
        .bind(title)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn book_create(&self, record: &BookRecord) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, slug, author_id, about, rating)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&record.title)
        .bind(&record.slug)
        .bind(record.author_id)
        .bind(&record.about)
        .bind(record.rating)
        .fetch_one(&mut *tx)
        .await
        .map_err(write_error)?;

        replace_genres(&mut tx, book.id, &record.genre_ids).await?;
        tx.commit().await?;

        self.with_relations(book).await
    }

    async fn book_update(&self, id: i32, record: &BookRecord) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $2, slug = $3, author_id = $4, about = $5, rating = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&record.title)
        .bind(&record.slug)
        .bind(record.author_id)
        .bind(&record.about)
        .bind(record.rating)
        .fetch_optional(&mut *tx)
        .await
        .map_err(write_error)?
        .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;

        replace_genres(&mut tx, id, &record.genre_ids).await?;
        tx.commit().await?;

        self.with_relations(book).await
    }

    async fn book_set_media(
        &self,
        id: i32,
        field: BookMediaField,
        path: Option<&str>,
    ) -> AppResult<()> {
        let query = format!(
            "UPDATE books SET {} = $2, updated_at = NOW() WHERE id = $1",
            field.column()
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(path)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        Ok(())
    }

    async fn book_delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        release(&mut tx, BOOK_REFERENCES, id).await?;

        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(write_error)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }
}

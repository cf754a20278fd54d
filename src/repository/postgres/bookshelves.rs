//! Bookshelf methods on the Postgres store

use async_trait::async_trait;

use super::{write_error, PgStore};
use crate::{
    error::AppResult,
    models::{Book, Bookshelf},
    repository::BookshelfStore,
};

#[async_trait]
impl BookshelfStore for PgStore {
    async fn bookshelf_get(&self, account_id: i32) -> AppResult<Option<Bookshelf>> {
        let shelf = sqlx::query_as::<_, Bookshelf>("SELECT * FROM bookshelves WHERE account_id = $1")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(shelf)
    }

    async fn bookshelf_get_or_create(&self, account_id: i32) -> AppResult<Bookshelf> {
        // The no-op update makes RETURNING yield the existing row on conflict
        let shelf = sqlx::query_as::<_, Bookshelf>(
            r#"
            INSERT INTO bookshelves (account_id)
            VALUES ($1)
            ON CONFLICT (account_id) DO UPDATE SET account_id = EXCLUDED.account_id
            RETURNING *
            "#,
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(shelf)
    }

    async fn bookshelf_count_books(&self, shelf_id: i32) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM bookshelf_books WHERE bookshelf_id = $1")
                .bind(shelf_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn bookshelf_list_books(
        &self,
        shelf_id: i32,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<Book>> {
        let mut rows = sqlx::query_as::<_, Book>(
            r#"
            SELECT b.* FROM books b
            JOIN bookshelf_books sb ON sb.book_id = b.id
            WHERE sb.bookshelf_id = $1
            ORDER BY b.title, b.id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(shelf_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        self.load_relations(&mut rows).await?;
        Ok(rows)
    }

    async fn bookshelf_contains(&self, shelf_id: i32, book_id: i32) -> AppResult<bool> {
        let found: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM bookshelf_books WHERE bookshelf_id = $1 AND book_id = $2)",
        )
        .bind(shelf_id)
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(found)
    }

    async fn bookshelf_add_book(&self, shelf_id: i32, book_id: i32) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO bookshelf_books (bookshelf_id, book_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(shelf_id)
        .bind(book_id)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(())
    }

    async fn bookshelf_remove_book(&self, shelf_id: i32, book_id: i32) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM bookshelf_books WHERE bookshelf_id = $1 AND book_id = $2")
                .bind(shelf_id)
                .bind(book_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}

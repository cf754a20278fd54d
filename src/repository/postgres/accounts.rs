//! Account methods on the Postgres store

use async_trait::async_trait;

use super::{release, write_error, PgStore};
use crate::{
    error::AppResult,
    models::Account,
    repository::{
        relations::{ACCOUNT_REFERENCES, SHELF_REFERENCES},
        AccountStore,
    },
};

#[async_trait]
impl AccountStore for PgStore {
    async fn account_get(&self, id: i32) -> AppResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn account_upsert(&self, id: i32, username: &str) -> AppResult<Account> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, username)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET username = EXCLUDED.username
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(account)
    }

    async fn account_delete(&self, id: i32) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let shelf_ids: Vec<i32> =
            sqlx::query_scalar("SELECT id FROM bookshelves WHERE account_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;
        for shelf_id in shelf_ids {
            release(&mut tx, SHELF_REFERENCES, shelf_id).await?;
        }
        release(&mut tx, ACCOUNT_REFERENCES, id).await?;

        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(write_error)?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

//! Postgres entity store

mod accounts;
mod authors;
mod books;
mod bookshelves;
mod genres;

use async_trait::async_trait;
use sqlx::{PgConnection, Pool, Postgres};

use super::{
    relations::{DeletePolicy, Relation},
    CatalogStore,
};
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Constraint violations on write become `Integrity` with the constraint name
pub(crate) fn write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() || db.is_foreign_key_violation() || db.is_check_violation() {
            return AppError::Integrity(db.constraint().unwrap_or("unknown").to_string());
        }
    }
    AppError::Database(e)
}

/// Apply each relation's delete policy to the rows referencing `id`
pub(crate) async fn release(
    conn: &mut PgConnection,
    relations: &[Relation],
    id: i32,
) -> AppResult<()> {
    for relation in relations {
        match relation.policy {
            DeletePolicy::Restrict => {
                let query = format!(
                    "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = $1)",
                    relation.table, relation.column
                );
                let referenced: bool = sqlx::query_scalar(&query)
                    .bind(id)
                    .fetch_one(&mut *conn)
                    .await?;
                if referenced {
                    return Err(AppError::Conflict(format!(
                        "Still referenced through {}",
                        relation.name
                    )));
                }
            }
            DeletePolicy::Nullify => {
                let query = format!(
                    "UPDATE {} SET {} = NULL WHERE {} = $1",
                    relation.table, relation.column, relation.column
                );
                sqlx::query(&query)
                    .bind(id)
                    .execute(&mut *conn)
                    .await
                    .map_err(write_error)?;
            }
            DeletePolicy::Cascade => {
                let query = format!(
                    "DELETE FROM {} WHERE {} = $1",
                    relation.table, relation.column
                );
                sqlx::query(&query)
                    .bind(id)
                    .execute(&mut *conn)
                    .await
                    .map_err(write_error)?;
            }
        }
        tracing::debug!(relation = relation.name, id, "Released references");
    }
    Ok(())
}

//! Bookshelf model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Personal shelf, one per account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Bookshelf {
    pub id: i32,
    pub account_id: i32,
    pub created_at: DateTime<Utc>,
}

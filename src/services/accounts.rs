//! Local account mirror of external identities

use crate::{
    error::AppResult,
    models::UserClaims,
    repository::Repository,
};

#[derive(Clone)]
pub struct AccountsService {
    repository: Repository,
}

impl AccountsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Delete the caller's account together with their bookshelf
    pub async fn delete(&self, claims: &UserClaims) -> AppResult<bool> {
        let deleted = self.repository.account_delete(claims.user_id).await?;
        if deleted {
            tracing::info!(user_id = claims.user_id, "Account deleted");
        }
        Ok(deleted)
    }
}

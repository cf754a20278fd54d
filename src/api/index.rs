//! Index page

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{error::AppResult, services::stats::CatalogCounts, AppState};

#[derive(Serialize)]
pub struct IndexContext {
    pub title_name: &'static str,
    #[serde(flatten)]
    pub counts: CatalogCounts,
}

pub async fn index(State(state): State<AppState>) -> AppResult<Json<IndexContext>> {
    let counts = state.services.stats.counts().await?;
    Ok(Json(IndexContext {
        title_name: "Главная страница",
        counts,
    }))
}

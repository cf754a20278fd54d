//! Personal bookshelf and profile actions

use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use serde::Serialize;

use crate::{
    error::AppResult,
    models::{BookSummary, Page, PageQuery},
    AppState,
};

use super::{found, RequireLogin};

#[derive(Serialize)]
pub struct BookshelfContext {
    pub title_name: &'static str,
    pub bookshelf_id: i32,
    pub page: Page<BookSummary>,
}

pub async fn show_bookshelf(
    State(state): State<AppState>,
    RequireLogin(claims): RequireLogin,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<BookshelfContext>> {
    let (shelf, page) = state
        .services
        .bookshelf
        .page(&claims, query.page.as_deref())
        .await?;
    Ok(Json(BookshelfContext {
        title_name: "Книжная полка",
        bookshelf_id: shelf.id,
        page: page.map(|b| b.summary()),
    }))
}

/// POST on a book page puts the book on the caller's shelf
pub async fn add_to_bookshelf(
    State(state): State<AppState>,
    RequireLogin(claims): RequireLogin,
    Path(slug): Path<String>,
) -> AppResult<Response> {
    let book = state.services.bookshelf.add(&claims, &slug).await?;
    Ok(found(book.absolute_url()))
}

pub async fn remove_from_bookshelf(
    State(state): State<AppState>,
    RequireLogin(claims): RequireLogin,
    Path(slug): Path<String>,
) -> AppResult<Response> {
    state.services.bookshelf.remove(&claims, &slug).await?;
    Ok(found("/bookshelf/"))
}

pub async fn delete_profile(
    State(state): State<AppState>,
    RequireLogin(claims): RequireLogin,
) -> AppResult<Response> {
    state.services.accounts.delete(&claims).await?;
    Ok(found("/"))
}

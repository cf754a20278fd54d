//! Author pages and forms

use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use serde::Serialize;

use crate::{
    error::AppResult,
    models::{Action, Author, AuthorForm, BookSummary, Capability, Entity, Page, PageQuery},
    AppState,
};

use super::{form::Submission, found, DeleteContext, RequireLogin};

const ADD: Capability = Capability::new(Entity::Author, Action::Add);
const CHANGE: Capability = Capability::new(Entity::Author, Action::Change);
const DELETE: Capability = Capability::new(Entity::Author, Action::Delete);

/// Author with its canonical URL
#[derive(Serialize)]
pub struct AuthorView {
    #[serde(flatten)]
    pub author: Author,
    pub url: String,
    pub display: String,
}

impl From<Author> for AuthorView {
    fn from(author: Author) -> Self {
        Self {
            url: author.absolute_url(),
            display: author.to_string(),
            author,
        }
    }
}

#[derive(Serialize)]
pub struct AuthorListContext {
    pub title_name: &'static str,
    pub page: Page<AuthorView>,
}

#[derive(Serialize)]
pub struct AuthorDetailContext {
    pub title_name: String,
    pub author: AuthorView,
    pub books: Page<BookSummary>,
}

#[derive(Serialize)]
pub struct AuthorFormContext {
    pub title_name: &'static str,
    pub form: AuthorForm,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorView>,
}

pub async fn list_authors(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<AuthorListContext>> {
    let page = state.services.authors.list(query.page.as_deref()).await?;
    Ok(Json(AuthorListContext {
        title_name: "Все авторы",
        page: page.map(AuthorView::from),
    }))
}

pub async fn author_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<AuthorDetailContext>> {
    let (author, books) = state
        .services
        .authors
        .detail(&slug, query.page.as_deref())
        .await?;
    Ok(Json(AuthorDetailContext {
        title_name: author.full_name(),
        author: author.into(),
        books: books.map(|b| b.summary()),
    }))
}

pub async fn add_author_form(RequireLogin(claims): RequireLogin) -> AppResult<Json<AuthorFormContext>> {
    claims.require(ADD)?;
    Ok(Json(AuthorFormContext {
        title_name: "Добавить автора",
        form: AuthorForm::default(),
        author: None,
    }))
}

pub async fn add_author(
    State(state): State<AppState>,
    RequireLogin(claims): RequireLogin,
    submission: Submission,
) -> AppResult<Response> {
    claims.require(ADD)?;
    let author = state.services.authors.create(submission.into_form()?).await?;
    Ok(found(author.absolute_url()))
}

pub async fn edit_author_form(
    State(state): State<AppState>,
    RequireLogin(claims): RequireLogin,
    Path(slug): Path<String>,
) -> AppResult<Json<AuthorFormContext>> {
    claims.require(CHANGE)?;
    let author = state.services.authors.get_by_slug(&slug).await?;
    Ok(Json(AuthorFormContext {
        title_name: "Редактировать автора",
        form: AuthorForm::from_author(&author),
        author: Some(author.into()),
    }))
}

pub async fn edit_author(
    State(state): State<AppState>,
    RequireLogin(claims): RequireLogin,
    Path(slug): Path<String>,
    submission: Submission,
) -> AppResult<Response> {
    claims.require(CHANGE)?;
    let author = state
        .services
        .authors
        .update(&slug, submission.into_form()?)
        .await?;
    Ok(found(author.absolute_url()))
}

pub async fn delete_author_confirm(
    State(state): State<AppState>,
    RequireLogin(claims): RequireLogin,
    Path(slug): Path<String>,
) -> AppResult<Json<DeleteContext<AuthorView>>> {
    claims.require(DELETE)?;
    let author = state.services.authors.get_by_slug(&slug).await?;
    Ok(Json(DeleteContext {
        title_name: format!("Удалить автора {}", author.full_name()),
        object: author.into(),
    }))
}

pub async fn delete_author(
    State(state): State<AppState>,
    RequireLogin(claims): RequireLogin,
    Path(slug): Path<String>,
) -> AppResult<Response> {
    claims.require(DELETE)?;
    state.services.authors.delete(&slug).await?;
    Ok(found("/authors/"))
}

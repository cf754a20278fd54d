//! Book pages and forms

use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use serde::Serialize;

use crate::{
    error::AppResult,
    models::{
        Action, AuthorRef, Book, BookForm, BookSummary, Capability, Entity, Genre, Page, PageQuery,
    },
    AppState,
};

use super::{form::Submission, found, DeleteContext, MaybeUser, RequireLogin};

const ADD: Capability = Capability::new(Entity::Book, Action::Add);
const CHANGE: Capability = Capability::new(Entity::Book, Action::Change);
const DELETE: Capability = Capability::new(Entity::Book, Action::Delete);

#[derive(Serialize)]
pub struct BookListContext {
    pub title_name: &'static str,
    pub page: Page<BookSummary>,
}

#[derive(Serialize)]
pub struct BookDetailContext {
    pub title_name: String,
    pub book: Book,
    pub url: String,
    pub display_genre: String,
    /// Whether the book is on the caller's shelf; always false for anonymous callers
    pub on_bookshelf: bool,
}

/// Add/edit form with the available choices
#[derive(Serialize)]
pub struct BookFormContext {
    pub title_name: &'static str,
    pub form: BookForm,
    pub authors: Vec<AuthorRef>,
    pub genres: Vec<Genre>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book: Option<BookSummary>,
}

pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<BookListContext>> {
    let page = state.services.books.list(query.page.as_deref()).await?;
    Ok(Json(BookListContext {
        title_name: "Все книги",
        page: page.map(|b| b.summary()),
    }))
}

pub async fn book_detail(
    State(state): State<AppState>,
    MaybeUser(claims): MaybeUser,
    Path(slug): Path<String>,
) -> AppResult<Json<BookDetailContext>> {
    let book = state.services.books.get_by_slug(&slug).await?;
    let on_bookshelf = match &claims {
        Some(claims) => state.services.bookshelf.contains(claims, book.id).await?,
        None => false,
    };
    Ok(Json(BookDetailContext {
        title_name: book.title.clone(),
        url: book.absolute_url(),
        display_genre: book.display_genre(),
        on_bookshelf,
        book,
    }))
}

pub async fn add_book_form(
    State(state): State<AppState>,
    RequireLogin(claims): RequireLogin,
) -> AppResult<Json<BookFormContext>> {
    claims.require(ADD)?;
    let (authors, genres) = state.services.books.choices().await?;
    Ok(Json(BookFormContext {
        title_name: "Добавить книгу",
        form: BookForm::default(),
        authors,
        genres,
        book: None,
    }))
}

pub async fn add_book(
    State(state): State<AppState>,
    RequireLogin(claims): RequireLogin,
    submission: Submission,
) -> AppResult<Response> {
    claims.require(ADD)?;
    let book = state.services.books.create(submission.into_form()?).await?;
    Ok(found(book.absolute_url()))
}

pub async fn edit_book_form(
    State(state): State<AppState>,
    RequireLogin(claims): RequireLogin,
    Path(slug): Path<String>,
) -> AppResult<Json<BookFormContext>> {
    claims.require(CHANGE)?;
    let book = state.services.books.get_by_slug(&slug).await?;
    let (authors, genres) = state.services.books.choices().await?;
    Ok(Json(BookFormContext {
        title_name: "Редактировать книгу",
        form: BookForm::from_book(&book),
        authors,
        genres,
        book: Some(book.summary()),
    }))
}

pub async fn edit_book(
    State(state): State<AppState>,
    RequireLogin(claims): RequireLogin,
    Path(slug): Path<String>,
    submission: Submission,
) -> AppResult<Response> {
    claims.require(CHANGE)?;
    let book = state
        .services
        .books
        .update(&slug, submission.into_form()?)
        .await?;
    Ok(found(book.absolute_url()))
}

pub async fn delete_book_confirm(
    State(state): State<AppState>,
    RequireLogin(claims): RequireLogin,
    Path(slug): Path<String>,
) -> AppResult<Json<DeleteContext<BookSummary>>> {
    claims.require(DELETE)?;
    let book = state.services.books.get_by_slug(&slug).await?;
    Ok(Json(DeleteContext {
        title_name: format!("Удалить книгу {}", book.title),
        object: book.summary(),
    }))
}

pub async fn delete_book(
    State(state): State<AppState>,
    RequireLogin(claims): RequireLogin,
    Path(slug): Path<String>,
) -> AppResult<Response> {
    claims.require(DELETE)?;
    state.services.books.delete(&slug).await?;
    Ok(found("/books/"))
}

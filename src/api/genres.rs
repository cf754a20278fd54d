//! Genre pages and forms

use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde::Serialize;

use crate::{
    error::AppResult,
    models::{Action, Capability, Entity, Genre, GenreForm},
    AppState,
};

use super::{form::Submission, found, DeleteContext, RequireLogin};

const ADD: Capability = Capability::new(Entity::Genre, Action::Add);
const CHANGE: Capability = Capability::new(Entity::Genre, Action::Change);
const DELETE: Capability = Capability::new(Entity::Genre, Action::Delete);

const ADD_GENRE_URL: &str = "/books/add_genre";
const GENRES_URL: &str = "/genres/";

#[derive(Serialize)]
pub struct GenreListContext {
    pub title_name: &'static str,
    pub genres: Vec<Genre>,
}

#[derive(Serialize)]
pub struct GenreFormContext {
    pub title_name: &'static str,
    pub form: GenreForm,
    /// Existing genres, shown next to the add form
    pub genres: Vec<Genre>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<Genre>,
}

pub async fn list_genres(State(state): State<AppState>) -> AppResult<Json<GenreListContext>> {
    let genres = state.services.genres.list().await?;
    Ok(Json(GenreListContext {
        title_name: "Все жанры",
        genres,
    }))
}

pub async fn add_genre_form(
    State(state): State<AppState>,
    RequireLogin(claims): RequireLogin,
) -> AppResult<Json<GenreFormContext>> {
    claims.require(ADD)?;
    let genres = state.services.genres.list().await?;
    Ok(Json(GenreFormContext {
        title_name: "Добавить жанр",
        form: GenreForm::default(),
        genres,
        genre: None,
    }))
}

pub async fn add_genre(
    State(state): State<AppState>,
    RequireLogin(claims): RequireLogin,
    submission: Submission,
) -> AppResult<Response> {
    claims.require(ADD)?;
    state.services.genres.create(submission.into_form()?).await?;
    Ok(found(ADD_GENRE_URL))
}

pub async fn edit_genre_form(
    State(state): State<AppState>,
    RequireLogin(claims): RequireLogin,
    Path(slug): Path<String>,
) -> AppResult<Json<GenreFormContext>> {
    claims.require(CHANGE)?;
    let genre = state.services.genres.get_by_slug(&slug).await?;
    Ok(Json(GenreFormContext {
        title_name: "Редактировать жанр",
        form: GenreForm {
            name: genre.name.clone(),
        },
        genres: Vec::new(),
        genre: Some(genre),
    }))
}

pub async fn edit_genre(
    State(state): State<AppState>,
    RequireLogin(claims): RequireLogin,
    Path(slug): Path<String>,
    submission: Submission,
) -> AppResult<Response> {
    claims.require(CHANGE)?;
    state
        .services
        .genres
        .update(&slug, submission.into_form()?)
        .await?;
    Ok(found(GENRES_URL))
}

pub async fn delete_genre_confirm(
    State(state): State<AppState>,
    RequireLogin(claims): RequireLogin,
    Path(slug): Path<String>,
) -> AppResult<Json<DeleteContext<Genre>>> {
    claims.require(DELETE)?;
    let genre = state.services.genres.get_by_slug(&slug).await?;
    Ok(Json(DeleteContext {
        title_name: format!("Удалить жанр {}", genre.name),
        object: genre,
    }))
}

pub async fn delete_genre(
    State(state): State<AppState>,
    RequireLogin(claims): RequireLogin,
    Path(slug): Path<String>,
) -> AppResult<Response> {
    claims.require(DELETE)?;
    state.services.genres.delete(&slug).await?;
    Ok(found(GENRES_URL))
}

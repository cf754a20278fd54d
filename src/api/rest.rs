//! Book REST endpoints
//!
//! Reads are public; writes need a token from a member of the staff group.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{book::BookPatch, BookPayload},
};

use super::AuthenticatedUser;

/// List every book
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "All books", body = Vec<BookPayload>)
    )
)]
pub async fn list_books(State(state): State<crate::AppState>) -> AppResult<Json<Vec<BookPayload>>> {
    let books = state.services.books.list_all().await?;
    Ok(Json(books.iter().map(BookPayload::from_book).collect()))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookPayload,
    responses(
        (status = 201, description = "Book created", body = BookPayload),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not a staff member"),
        (status = 422, description = "Invalid book", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<BookPayload>,
) -> AppResult<(StatusCode, Json<BookPayload>)> {
    claims.require_group(&state.config.auth.staff_group)?;

    let book = state.services.books.create_from_payload(payload).await?;
    Ok((StatusCode::CREATED, Json(BookPayload::from_book(&book))))
}

/// Get a book by ID
#[utoipa::path(
    get,
    path = "/book/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book", body = BookPayload),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookPayload>> {
    let book = state.services.books.get_by_id(id).await?;
    Ok(Json(BookPayload::from_book(&book)))
}

/// Replace a book
#[utoipa::path(
    put,
    path = "/book/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = BookPayload,
    responses(
        (status = 200, description = "Book updated", body = BookPayload),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not a staff member"),
        (status = 404, description = "Book not found"),
        (status = 422, description = "Invalid book", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<BookPayload>,
) -> AppResult<Json<BookPayload>> {
    claims.require_group(&state.config.auth.staff_group)?;

    let book = state.services.books.update_from_payload(id, payload).await?;
    Ok(Json(BookPayload::from_book(&book)))
}

/// Update some fields of a book
#[utoipa::path(
    patch,
    path = "/book/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = BookPayload,
    responses(
        (status = 200, description = "Book updated", body = BookPayload),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not a staff member"),
        (status = 404, description = "Book not found"),
        (status = 422, description = "Invalid book", body = crate::error::ErrorResponse)
    )
)]
pub async fn patch_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(patch): Json<BookPatch>,
) -> AppResult<Json<BookPayload>> {
    claims.require_group(&state.config.auth.staff_group)?;

    let current = state.services.books.get_by_id(id).await?;
    let payload = patch.apply(&current);
    let book = state.services.books.update_from_payload(id, payload).await?;
    Ok(Json(BookPayload::from_book(&book)))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/book/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not a staff member"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_group(&state.config.auth.staff_group)?;

    state.services.books.delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

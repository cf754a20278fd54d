//! HTTP layer: catalog flow routes, REST API and documentation

pub mod authors;
pub mod books;
pub mod bookshelf;
pub mod form;
pub mod genres;
pub mod health;
pub mod index;
pub mod openapi;
pub mod rest;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::LOCATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{error::AppError, models::UserClaims, AppState};

/// Decode the bearer token, if the request carries one
async fn bearer_claims(
    parts: &mut Parts,
    state: &AppState,
) -> Option<Result<UserClaims, AppError>> {
    let TypedHeader(Authorization(bearer)) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .ok()?;
    Some(
        UserClaims::from_token(bearer.token(), &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string())),
    )
}

/// Extractor for authenticated user from JWT token; rejects with 401
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state).await.ok_or_else(|| {
            AppError::Authentication("Missing authorization header".to_string())
        })??;
        Ok(AuthenticatedUser(claims))
    }
}

/// Identity of the caller on flow routes; a missing or invalid token means anonymous
pub struct MaybeUser(pub Option<UserClaims>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = match bearer_claims(parts, state).await {
            Some(Ok(claims)) => Some(claims),
            Some(Err(e)) => {
                tracing::debug!("Ignoring invalid token: {}", e);
                None
            }
            None => None,
        };
        Ok(MaybeUser(claims))
    }
}

/// Logged-in user on flow routes; anonymous callers are sent to the login page
pub struct RequireLogin(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for RequireLogin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let MaybeUser(claims) = MaybeUser::from_request_parts(parts, state).await?;
        match claims {
            Some(claims) => Ok(RequireLogin(claims)),
            None => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                Err(AppError::LoginRequired(format!(
                    "{}?next={}",
                    state.config.auth.login_url, next
                )))
            }
        }
    }
}

/// 302 to another page after a successful form post
pub fn found(location: impl Into<String>) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.into())]).into_response()
}

/// Render context of a delete confirmation page
#[derive(Serialize)]
pub struct DeleteContext<T: Serialize> {
    pub title_name: String,
    pub object: T,
}

/// Build the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let flows = Router::new()
        .route("/", get(index::index))
        // Authors
        .route("/authors/", get(authors::list_authors))
        .route(
            "/authors/add_author",
            get(authors::add_author_form).post(authors::add_author),
        )
        .route("/author/:slug", get(authors::author_detail))
        .route(
            "/author/:slug/edit",
            get(authors::edit_author_form).post(authors::edit_author),
        )
        .route(
            "/author/:slug/delete",
            get(authors::delete_author_confirm).post(authors::delete_author),
        )
        // Books
        .route("/books/", get(books::list_books))
        .route(
            "/books/add_book",
            get(books::add_book_form).post(books::add_book),
        )
        .route(
            "/book/:slug",
            get(books::book_detail).post(bookshelf::add_to_bookshelf),
        )
        .route(
            "/book/:slug/edit",
            get(books::edit_book_form).post(books::edit_book),
        )
        .route(
            "/book/:slug/delete",
            get(books::delete_book_confirm).post(books::delete_book),
        )
        // Genres
        .route(
            "/books/add_genre",
            get(genres::add_genre_form).post(genres::add_genre),
        )
        .route("/genres/", get(genres::list_genres))
        .route(
            "/genre/:slug/edit",
            get(genres::edit_genre_form).post(genres::edit_genre),
        )
        .route(
            "/genre/:slug/delete",
            get(genres::delete_genre_confirm).post(genres::delete_genre),
        )
        // Bookshelf and account
        .route("/bookshelf/", get(bookshelf::show_bookshelf))
        .route(
            "/bookshelf/:slug/remove",
            post(bookshelf::remove_from_bookshelf),
        )
        .route("/users/profile/delete/", post(bookshelf::delete_profile));

    let api_v1 = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/books", get(rest::list_books).post(rest::create_book))
        .route(
            "/book/:id",
            get(rest::get_book)
                .put(rest::update_book)
                .patch(rest::patch_book)
                .delete(rest::delete_book),
        );

    let media = ServeDir::new(state.config.media.root.clone());
    let media_prefix = state.config.media.url_prefix.clone();

    Router::new()
        .merge(flows)
        .nest("/api/v1", api_v1)
        .with_state(state)
        .nest_service(&media_prefix, media)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

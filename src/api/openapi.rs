//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{health, rest};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ReadMe API",
        version = "1.0.0",
        description = "Library catalog REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        rest::list_books,
        rest::create_book,
        rest::get_book,
        rest::update_book,
        rest::patch_book,
        rest::delete_book,
    ),
    components(
        schemas(
            crate::models::BookPayload,
            crate::models::Book,
            crate::models::AuthorRef,
            crate::models::Genre,
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
            crate::error::FormErrors,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

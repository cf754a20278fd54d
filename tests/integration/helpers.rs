//! Test application and request helpers

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use readme_catalog::{
    api,
    config::{AppConfig, StoreBackend},
    media::FsMediaStorage,
    models::{Action, Capability, Entity, UserClaims},
    repository::Repository,
    services::Services,
    AppState,
};

const BOUNDARY: &str = "catalog-test-boundary";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn location(&self) -> &str {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

/// A value of a multipart body
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

pub struct TestApp {
    pub state: AppState,
    pub media: TempDir,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let media = TempDir::new().expect("temp media root");
        let mut config = AppConfig::default();
        config.database.backend = StoreBackend::Memory;
        config.media.root = media.path().to_path_buf();

        let storage = Arc::new(FsMediaStorage::new(media.path()));
        let services = Services::new(Repository::memory(), storage, &config.catalog);
        let state = AppState {
            config: Arc::new(config),
            services: Arc::new(services),
        };
        let router = api::router(state.clone());

        Self {
            state,
            media,
            router,
        }
    }

    fn token(&self, user_id: i32, groups: Vec<String>, permissions: Vec<Capability>) -> String {
        UserClaims::new(user_id, &format!("user{}", user_id), groups, permissions, 1)
            .create_token(&self.state.config.auth.jwt_secret)
            .expect("token")
    }

    /// Token of a user holding every catalog capability
    pub fn admin_token(&self) -> String {
        let mut permissions = Vec::new();
        for entity in [Entity::Author, Entity::Genre, Entity::Book] {
            for action in [Action::Add, Action::Change, Action::Delete, Action::View] {
                permissions.push(Capability::new(entity, action));
            }
        }
        self.token(1, Vec::new(), permissions)
    }

    pub fn user_token(&self, user_id: i32) -> String {
        self.token(user_id, Vec::new(), Vec::new())
    }

    pub fn token_with(&self, permissions: Vec<Capability>) -> String {
        self.token(2, Vec::new(), permissions)
    }

    pub fn staff_token(&self) -> String {
        let group = self.state.config.auth.staff_group.clone();
        self.token(3, vec![group], Vec::new())
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        let request = authorized(Request::get(uri), token)
            .body(Body::empty())
            .expect("request");
        self.send(request).await
    }

    pub async fn post_form(&self, uri: &str, token: Option<&str>, fields: &[(&str, &str)]) -> TestResponse {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let request = authorized(Request::post(uri), token)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("request");
        self.send(request).await
    }

    pub async fn post_multipart(&self, uri: &str, token: Option<&str>, parts: &[Part<'_>]) -> TestResponse {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File(name, file_name, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n",
                            name, file_name
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let request = authorized(Request::post(uri), token)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .expect("request");
        self.send(request).await
    }

    pub async fn send_json(&self, method: Method, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        let request = authorized(Request::builder().method(method).uri(uri), token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        self.send(request).await
    }

    pub async fn book_count(&self) -> i64 {
        self.state.services.books.count().await.expect("count")
    }

    pub async fn genre_count(&self) -> i64 {
        self.state.services.genres.count().await.expect("count")
    }

    pub async fn author_count(&self) -> i64 {
        self.state
            .services
            .stats
            .counts()
            .await
            .expect("counts")
            .num_authors
    }

    /// Create an author through the add flow and return its id and slug
    pub async fn create_author(&self, first_name: &str, last_name: &str) -> (i64, String) {
        let token = self.admin_token();
        let response = self
            .post_form(
                "/authors/add_author",
                Some(&token),
                &[
                    ("first_name", first_name),
                    ("last_name", last_name),
                    ("date_of_birth", "1998-03-03"),
                    ("about", "Об авторе"),
                ],
            )
            .await;
        assert_eq!(response.status, StatusCode::FOUND, "{:?}", response.body);
        let slug = response
            .location()
            .trim_start_matches("/author/")
            .to_string();
        let detail = self.get(&format!("/author/{}", slug), None).await;
        let id = detail.body["author"]["id"].as_i64().expect("author id");
        (id, slug)
    }

    /// Create a genre through the add flow and return its id
    pub async fn create_genre(&self, name: &str) -> i64 {
        let token = self.admin_token();
        let response = self
            .post_form("/books/add_genre", Some(&token), &[("name", name)])
            .await;
        assert_eq!(response.status, StatusCode::FOUND, "{:?}", response.body);
        let list = self.get("/genres/", None).await;
        list.body["genres"]
            .as_array()
            .and_then(|genres| genres.iter().find(|g| g["name"] == name))
            .and_then(|g| g["id"].as_i64())
            .expect("genre id")
    }

    /// Create a book through the add flow and return its slug
    pub async fn create_book(&self, fields: &[(&str, &str)]) -> String {
        let token = self.admin_token();
        let response = self.post_form("/books/add_book", Some(&token), fields).await;
        assert_eq!(response.status, StatusCode::FOUND, "{:?}", response.body);
        response.location().trim_start_matches("/book/").to_string()
    }
}

fn authorized(builder: axum::http::request::Builder, token: Option<&str>) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => builder,
    }
}

/// Percent-encode a form value
fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

//! HTTP surface for the movie store.
//!
//! Requires the `http` feature. Uses axum for routing.
//!
//! ## Routes
//!
//! - `GET /movies?page=N`: `{ "page": N, "movies": [...] }`, 15 per page.
//! - `POST /movies`: create from a full body, `201` with the new movie.
//! - `PUT /movies/:id`: merge the supplied fields, `200` with the movie.
//! - `DELETE /movies/:id`: `204` on success.
//! - `GET /health`: `{ "ok": true, "movies": <count> }`.
//! - `GET /api-docs`: OpenAPI document for the routes above.
//!
//! Unknown ids answer `404 { "message": "Movie not found" }`. Bodies that do
//! not parse or fail validation answer `400 { "message": ... }`.
//!
//! ## Example
//!
//! ```ignore
//! let (store, worker) = MovieStore::open("data/movies_db.csv")?;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! movie_catalog::http::serve(listener, store, shutdown_signal()).await?;
//! worker.stop();
//! ```

use std::future::Future;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::error::CatalogError;
use crate::movie::{MovieInput, MoviePatch, YEAR_RANGE};
use crate::page::{Page, PAGE_SIZE};
use crate::store::MovieStore;

/// Build an axum `Router` serving the movie routes from `store`.
pub fn router(store: MovieStore) -> Router {
    Router::new()
        .route("/movies", get(list_movies).post(create_movie))
        .route("/movies/:id", put(update_movie).delete(delete_movie))
        .route("/health", get(health))
        .route("/api-docs", get(api_docs))
        .layer(middleware::from_fn(cors))
        .with_state(store)
}

/// Serve the store on `listener` until `shutdown` resolves. In-flight
/// requests finish before this returns.
pub async fn serve<F>(
    listener: tokio::net::TcpListener,
    store: MovieStore,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown)
        .await
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    page: Option<String>,
}

/// `GET /movies?page=N`
///
/// A query string that does not deserialize (a repeated `page`, say) lists
/// the first page.
async fn list_movies(
    State(store): State<MovieStore>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Response {
    let raw = match &query {
        Ok(Query(query)) => query.page.as_deref(),
        Err(_) => None,
    };
    let page = Page::parse(raw);
    match store.list(page) {
        Ok(movies) => Json(json!({ "page": page.number, "movies": movies })).into_response(),
        Err(e) => error_response(e),
    }
}

/// `POST /movies`
async fn create_movie(
    State(store): State<MovieStore>,
    body: Result<Json<MovieInput>, JsonRejection>,
) -> Response {
    let input = match body {
        Ok(Json(input)) => input,
        Err(rejection) => return rejection_response(rejection),
    };
    if let Err(e) = input.validate() {
        return error_response(e);
    }
    match store.create(input) {
        Ok(movie) => (StatusCode::CREATED, Json(movie)).into_response(),
        Err(e) => error_response(e),
    }
}

/// `PUT /movies/:id`
async fn update_movie(
    State(store): State<MovieStore>,
    Path(id): Path<String>,
    body: Result<Json<MoviePatch>, JsonRejection>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => return error_response(e),
    };
    let patch = match body {
        Ok(Json(patch)) => patch,
        Err(rejection) => return rejection_response(rejection),
    };
    if let Err(e) = patch.validate() {
        return error_response(e);
    }
    match store.update(id, patch) {
        Ok(movie) => Json(movie).into_response(),
        Err(e) => error_response(e),
    }
}

/// `DELETE /movies/:id`
async fn delete_movie(State(store): State<MovieStore>, Path(id): Path<String>) -> Response {
    let result = parse_id(&id).and_then(|id| store.delete(id));
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// `GET /health`
async fn health(State(store): State<MovieStore>) -> Response {
    match store.len() {
        Ok(count) => Json(json!({ "ok": true, "movies": count })).into_response(),
        Err(e) => error_response(e),
    }
}

/// `GET /api-docs`
async fn api_docs() -> Json<Value> {
    Json(openapi())
}

/// A path id that is not a number cannot name a movie.
fn parse_id(raw: &str) -> Result<u64, CatalogError> {
    // Ids start at 1, so 0 never matches a movie.
    raw.trim().parse().map_err(|_| CatalogError::NotFound(0))
}

fn error_response(err: CatalogError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(error = %err, "request failed");
    }
    (status, Json(json!({ "message": err.to_string() }))).into_response()
}

fn rejection_response(rejection: JsonRejection) -> Response {
    error_response(CatalogError::Invalid(rejection.body_text()))
}

/// Allow any origin, and answer preflight requests directly.
async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };
    allow_any_origin(response.headers_mut());
    response
}

fn allow_any_origin(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
}

/// OpenAPI 3.0 description of the movie routes.
pub fn openapi() -> Value {
    let movie_ref = json!({ "$ref": "#/components/schemas/Movie" });
    let input_body = json!({
        "required": true,
        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/MovieInput" } } }
    });
    let movie_response = |description: &str| {
        json!({
            "description": description,
            "content": { "application/json": { "schema": movie_ref } }
        })
    };
    let not_found = json!({
        "description": "Movie not found",
        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Message" } } }
    });
    let id_param = json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer" }
    });

    let list = json!({
        "summary": "Retrieve a page of movies",
        "parameters": [{
            "name": "page",
            "in": "query",
            "required": false,
            "description": format!("Page number, {} movies per page", PAGE_SIZE),
            "schema": { "type": "integer", "minimum": 1 }
        }],
        "responses": {
            "200": {
                "description": "A page of movies",
                "content": { "application/json": { "schema": {
                    "type": "object",
                    "properties": {
                        "page": { "type": "integer" },
                        "movies": { "type": "array", "items": movie_ref }
                    }
                } } }
            }
        }
    });
    let create = json!({
        "summary": "Add a new movie",
        "requestBody": input_body,
        "responses": {
            "201": movie_response("Movie created"),
            "400": { "description": "Invalid movie" }
        }
    });
    let update = json!({
        "summary": "Edit a movie; omitted fields keep their values",
        "parameters": [id_param],
        "requestBody": input_body,
        "responses": {
            "200": movie_response("Movie updated"),
            "400": { "description": "Invalid movie" },
            "404": not_found
        }
    });
    let delete = json!({
        "summary": "Delete a movie",
        "parameters": [id_param],
        "responses": {
            "204": { "description": "Movie deleted" },
            "404": not_found
        }
    });

    let movie_schema = json!({
        "type": "object",
        "properties": {
            "id": { "type": "integer" },
            "name": { "type": "string" },
            "genre": { "type": "string" },
            "year": { "type": "integer" },
            "imageUrl": { "type": "string" }
        }
    });
    let input_schema = json!({
        "type": "object",
        "required": ["name", "genre", "year", "imageUrl"],
        "properties": {
            "name": { "type": "string", "minLength": 1 },
            "genre": { "type": "string" },
            "year": { "type": "integer", "minimum": YEAR_RANGE.start(), "maximum": YEAR_RANGE.end() },
            "imageUrl": { "type": "string" }
        }
    });

    json!({
        "openapi": "3.0.0",
        "info": {
            "title": "Movies API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "API documentation for Movies CRUD operations"
        },
        "paths": {
            "/movies": { "get": list, "post": create },
            "/movies/{id}": { "put": update, "delete": delete }
        },
        "components": {
            "schemas": {
                "Movie": movie_schema,
                "MovieInput": input_schema,
                "Message": { "type": "object", "properties": { "message": { "type": "string" } } }
            }
        }
    })
}

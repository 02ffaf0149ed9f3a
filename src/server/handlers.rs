//! Route handlers for the book service.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use super::ServerState;
use crate::book::BookRecord;
use crate::catalog::LookupOutcome;

const SAVE_FAILED: &str = "Failed to save book data";
const LOOKUP_FAILED: &str = "Failed to look up book data";
const LIST_FAILED: &str = "Failed to list book data";
const NOT_FOUND: &str = "No book found for this ISBN";

/// Body of `POST /api/books`.
///
/// `title`, `pageCount` and `isbn` are required; a payload without one of
/// them is rejected before it reaches the database.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookPayload {
    pub title: String,
    pub page_count: u32,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    pub isbn: String,
}

impl From<CreateBookPayload> for BookRecord {
    fn from(payload: CreateBookPayload) -> Self {
        Self {
            page_count: payload.page_count,
            published_date: payload.published_date,
            language: payload.language,
            authors: payload.authors,
            publisher: payload.publisher,
            ..Self::new(payload.title, payload.isbn)
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

fn error_response(status: StatusCode, message: &'static str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// `POST /api/books`
pub async fn create_book(
    State(state): State<ServerState>,
    payload: Result<Json<CreateBookPayload>, JsonRejection>,
) -> Response {
    let book = match payload {
        Ok(Json(payload)) => BookRecord::from(payload),
        Err(rejection) => {
            error!(error = %rejection.body_text(), "Error saving book data");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, SAVE_FAILED);
        }
    };

    match state.repository.create(&book).await {
        Ok(stored) => {
            info!(id = stored.id, isbn = %stored.isbn, "Book saved");
            Json(stored).into_response()
        }
        Err(e) => {
            error!(error = %e, "Error saving book data");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, SAVE_FAILED)
        }
    }
}

/// `GET /api/books/:isbn`
///
/// Every successful lookup inserts a new row.
pub async fn lookup_and_store(
    State(state): State<ServerState>,
    Path(isbn): Path<String>,
) -> Response {
    let book = match state.catalog.lookup(&isbn).await {
        Ok(LookupOutcome::Found(book)) => book,
        Ok(LookupOutcome::NotFound) => {
            info!(%isbn, "No book found");
            return error_response(StatusCode::NOT_FOUND, NOT_FOUND);
        }
        Err(e) => {
            error!(%isbn, error = %e, "Error fetching book info");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, LOOKUP_FAILED);
        }
    };

    match state.repository.create(&book).await {
        Ok(stored) => Json(stored).into_response(),
        Err(e) => {
            error!(%isbn, error = %e, "Error storing looked-up book");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, LOOKUP_FAILED)
        }
    }
}

/// `GET /api/books`
pub async fn list_books(State(state): State<ServerState>) -> Response {
    match state.repository.list().await {
        Ok(books) => Json(books).into_response(),
        Err(e) => {
            error!(error = %e, "Error listing books");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, LIST_FAILED)
        }
    }
}

//! HTTP persistence service.
//!
//! Routes:
//! - `POST /api/books` stores a book payload
//! - `GET /api/books/:isbn` looks the isbn up in the catalog and stores the result
//! - `GET /api/books` lists stored rows
//! - `GET /api/health` liveness probe

mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use crate::catalog::CatalogSource;
use crate::repository::BookRepository;

/// Default listen address of the service.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5000";

/// Shared state for handlers.
#[derive(Clone)]
pub struct ServerState {
    pub repository: Arc<dyn BookRepository>,
    pub catalog: Arc<dyn CatalogSource>,
}

impl ServerState {
    #[must_use]
    pub fn new(repository: Arc<dyn BookRepository>, catalog: Arc<dyn CatalogSource>) -> Self {
        Self {
            repository,
            catalog,
        }
    }
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("catalog", &self.catalog.name())
            .finish_non_exhaustive()
    }
}

/// Builds the router with all routes and middleware.
pub fn router(state: ServerState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handlers::health))
        .route(
            "/api/books",
            get(handlers::list_books).post(handlers::create_book),
        )
        .route("/api/books/:isbn", get(handlers::lookup_and_store))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the router on an already bound listener until the task is dropped.
///
/// # Errors
///
/// Returns an error if the server stops with an IO failure.
#[instrument(skip(listener, state))]
pub async fn serve(listener: TcpListener, state: ServerState) -> std::io::Result<()> {
    let addr: Option<SocketAddr> = listener.local_addr().ok();
    info!(?addr, "Book service listening");
    axum::serve(listener, router(state)).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::{Value, json};

    use crate::book::BookRecord;
    use crate::catalog::{LookupError, LookupOutcome};
    use crate::db::Database;
    use crate::repository::SqliteBookRepository;
    use crate::test_support::socket_guard::bind_local_listener_or_skip;

    struct FixedCatalog(Result<LookupOutcome, LookupError>);

    #[async_trait::async_trait]
    impl CatalogSource for FixedCatalog {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn lookup(&self, _identifier: &str) -> Result<LookupOutcome, LookupError> {
            self.0.clone()
        }
    }

    /// Starts the service on an ephemeral port and returns its base URL.
    async fn spawn_app(outcome: Result<LookupOutcome, LookupError>) -> Option<String> {
        let db = Database::new_in_memory().await.unwrap();
        spawn_app_on(db, outcome).await
    }

    async fn spawn_app_on(
        db: Database,
        outcome: Result<LookupOutcome, LookupError>,
    ) -> Option<String> {
        let listener = bind_local_listener_or_skip().await?;
        let base = format!("http://{}", listener.local_addr().unwrap());
        let state = ServerState::new(
            Arc::new(SqliteBookRepository::new(db)),
            Arc::new(FixedCatalog(outcome)),
        );
        tokio::spawn(serve(listener, state));
        Some(base)
    }

    async fn get_json(url: &str) -> (StatusCode, Value) {
        let response = reqwest::get(url).await.unwrap();
        (response.status(), response.json().await.unwrap())
    }

    async fn post_raw(base: &str, body: &str) -> (StatusCode, Value) {
        let response = reqwest::Client::new()
            .post(format!("{base}/api/books"))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .unwrap();
        (response.status(), response.json().await.unwrap())
    }

    fn sapiens() -> BookRecord {
        let mut book = BookRecord::new("Sapiens", "9780143127741");
        book.page_count = 443;
        book
    }

    #[tokio::test]
    async fn test_health() {
        let Some(base) = spawn_app(Ok(LookupOutcome::NotFound)).await else {
            return;
        };
        let (status, body) = get_json(&format!("{base}/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_post_creates_row_with_id() {
        let Some(base) = spawn_app(Ok(LookupOutcome::NotFound)).await else {
            return;
        };
        let (status, body) = post_raw(
            &base,
            r#"{"title":"Sapiens","pageCount":443,"isbn":"9780143127741","authors":["Yuval Noah Harari"]}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["id"].as_i64().unwrap() > 0);
        assert_eq!(body["authors"][0], "Yuval Noah Harari");
        assert!(body["createdAt"].is_string());
    }

    #[tokio::test]
    async fn test_post_missing_title_is_500_with_fixed_body() {
        let Some(base) = spawn_app(Ok(LookupOutcome::NotFound)).await else {
            return;
        };
        let (status, body) = post_raw(&base, r#"{"isbn":"9780143127741"}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Failed to save book data"}));
    }

    #[tokio::test]
    async fn test_post_missing_page_count_is_500_and_stores_nothing() {
        let Some(base) = spawn_app(Ok(LookupOutcome::NotFound)).await else {
            return;
        };
        let (status, body) = post_raw(&base, r#"{"title":"T","isbn":"9780000000002"}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Failed to save book data"}));

        let (_, list) = get_json(&format!("{base}/api/books")).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_post_unreadable_payload_is_500() {
        let Some(base) = spawn_app(Ok(LookupOutcome::NotFound)).await else {
            return;
        };
        let (status, body) = post_raw(&base, "not json").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to save book data");
    }

    #[tokio::test]
    async fn test_get_isbn_persists_every_time() {
        let Some(base) = spawn_app(Ok(LookupOutcome::Found(sapiens()))).await else {
            return;
        };

        let (status, first) = get_json(&format!("{base}/api/books/9780143127741")).await;
        assert_eq!(status, StatusCode::OK);
        let (_, second) = get_json(&format!("{base}/api/books/9780143127741")).await;
        assert_ne!(first["id"], second["id"]);

        let (_, list) = get_json(&format!("{base}/api/books")).await;
        assert_eq!(list.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_isbn_not_found_is_404() {
        let Some(base) = spawn_app(Ok(LookupOutcome::NotFound)).await else {
            return;
        };
        let (status, body) = get_json(&format!("{base}/api/books/9780000000002")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "No book found for this ISBN"}));
    }

    #[tokio::test]
    async fn test_get_isbn_lookup_failure_is_500_and_stores_nothing() {
        let failure = Err(LookupError::failed("9780143127741", "offline"));
        let Some(base) = spawn_app(failure).await else {
            return;
        };
        let (status, body) = get_json(&format!("{base}/api/books/9780143127741")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Failed to look up book data"}));

        let (_, list) = get_json(&format!("{base}/api/books")).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_failure_names_list_operation() {
        let db = Database::new_in_memory().await.unwrap();
        db.clone().close().await;
        let Some(base) = spawn_app_on(db, Ok(LookupOutcome::NotFound)).await else {
            return;
        };
        let (status, body) = get_json(&format!("{base}/api/books")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Failed to list book data"}));
    }
}

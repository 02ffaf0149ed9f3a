//! Database-backed book persistence for the HTTP service.
//!
//! Rows are independent of the saved-books store: every create inserts a
//! new row, and the same isbn may appear many times.

mod error;

pub use error::{DbErrorKind, RepositoryError};

use async_trait::async_trait;
use serde::Serialize;
use sqlx::FromRow;
use tracing::{debug, instrument};

use crate::book::BookRecord;
use crate::db::Database;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

/// A persisted book row as returned by the HTTP service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBook {
    /// Server-assigned id, distinct from the isbn.
    pub id: i64,
    pub title: String,
    pub page_count: u32,
    pub published_date: Option<String>,
    pub language: Option<String>,
    pub authors: Vec<String>,
    pub publisher: Option<String>,
    pub isbn: String,
    /// UTC timestamp, `YYYY-MM-DDTHH:MM:SSZ`.
    pub created_at: String,
}

#[derive(Debug, FromRow)]
struct BookRow {
    id: i64,
    title: String,
    page_count: i64,
    published_date: Option<String>,
    language: Option<String>,
    authors: String,
    publisher: Option<String>,
    isbn: String,
    created_at: String,
}

impl TryFrom<BookRow> for StoredBook {
    type Error = RepositoryError;

    fn try_from(row: BookRow) -> Result<Self> {
        let authors: Vec<String> =
            serde_json::from_str(&row.authors).map_err(|e| RepositoryError::CorruptRow {
                id: row.id,
                reason: format!("authors is not a JSON array: {e}"),
            })?;
        let page_count = u32::try_from(row.page_count).map_err(|_| RepositoryError::CorruptRow {
            id: row.id,
            reason: format!("page_count {} out of range", row.page_count),
        })?;

        Ok(Self {
            id: row.id,
            title: row.title,
            page_count,
            published_date: row.published_date,
            language: row.language,
            authors,
            publisher: row.publisher,
            isbn: row.isbn,
            created_at: row.created_at,
        })
    }
}

/// Data-access contract for persisted books.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Inserts `book` as a new row and returns it.
    async fn create(&self, book: &BookRecord) -> Result<StoredBook>;

    /// Returns every row in insertion order.
    async fn list(&self) -> Result<Vec<StoredBook>>;
}

/// `SQLite` implementation of [`BookRepository`].
#[derive(Debug, Clone)]
pub struct SqliteBookRepository {
    db: Database,
}

impl SqliteBookRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn validate(book: &BookRecord) -> Result<()> {
    if book.title.trim().is_empty() {
        return Err(RepositoryError::invalid_book("title", "must not be empty"));
    }
    if book.isbn.trim().is_empty() {
        return Err(RepositoryError::invalid_book("isbn", "must not be empty"));
    }
    Ok(())
}

#[async_trait]
impl BookRepository for SqliteBookRepository {
    #[instrument(skip(self, book), fields(isbn = %book.isbn))]
    async fn create(&self, book: &BookRecord) -> Result<StoredBook> {
        validate(book)?;
        let authors_json = serde_json::to_string(&book.authors)
            .map_err(|e| RepositoryError::invalid_book("authors", &e.to_string()))?;

        let row = sqlx::query_as::<_, BookRow>(
            r"INSERT INTO books (
                title, page_count, published_date, language, authors, publisher, isbn
              )
              VALUES (?, ?, ?, ?, ?, ?, ?)
              RETURNING *",
        )
        .bind(&book.title)
        .bind(i64::from(book.page_count))
        .bind(book.published_date.as_deref())
        .bind(book.language.as_deref())
        .bind(authors_json)
        .bind(book.publisher.as_deref())
        .bind(&book.isbn)
        .fetch_one(self.db.pool())
        .await?;

        debug!(id = row.id, "Book row inserted");
        row.try_into()
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<StoredBook>> {
        let rows = sqlx::query_as::<_, BookRow>(r"SELECT * FROM books ORDER BY id ASC")
            .fetch_all(self.db.pool())
            .await?;

        rows.into_iter().map(StoredBook::try_from).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn repo() -> SqliteBookRepository {
        SqliteBookRepository::new(Database::new_in_memory().await.unwrap())
    }

    fn sapiens() -> BookRecord {
        let mut book = BookRecord::new("Sapiens", "9780143127741");
        book.page_count = 443;
        book.published_date = Some("2015".to_string());
        book.authors = vec!["Yuval Noah Harari".to_string(), "Second Author".to_string()];
        book
    }

    #[tokio::test]
    async fn test_create_returns_row_with_id_and_timestamp() {
        let repo = repo().await;
        let stored = repo.create(&sapiens()).await.unwrap();

        assert!(stored.id > 0);
        assert_eq!(stored.title, "Sapiens");
        assert_eq!(stored.page_count, 443);
        assert_eq!(stored.authors, vec!["Yuval Noah Harari", "Second Author"]);
        assert!(stored.created_at.ends_with('Z'));
    }

    #[tokio::test]
    async fn test_create_same_isbn_twice_makes_two_rows() {
        let repo = repo().await;
        let first = repo.create(&sapiens()).await.unwrap();
        let second = repo.create(&sapiens()).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_title() {
        let repo = repo().await;
        let err = repo
            .create(&BookRecord::new("  ", "9780143127741"))
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::InvalidBook { field: "title", .. }));
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let repo = repo().await;
        repo.create(&BookRecord::new("First", "9780000000001")).await.unwrap();
        repo.create(&BookRecord::new("Second", "9780000000002")).await.unwrap();

        let titles: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn test_stored_book_serializes_camel_case() {
        let repo = repo().await;
        let stored = repo.create(&sapiens()).await.unwrap();
        let value = serde_json::to_value(&stored).unwrap();

        assert_eq!(value["pageCount"], 443);
        assert_eq!(value["isbn"], "9780143127741");
        assert!(value["createdAt"].is_string());
        assert!(value["language"].is_null());
    }

    #[tokio::test]
    async fn test_corrupt_authors_column_is_reported() {
        let repo = repo().await;
        sqlx::query("INSERT INTO books (title, isbn, authors) VALUES ('Bad', '1', 'not json')")
            .execute(repo.db.pool())
            .await
            .unwrap();

        let err = repo.list().await.unwrap_err();
        assert!(matches!(err, RepositoryError::CorruptRow { .. }));
    }

    #[tokio::test]
    async fn test_closed_pool_is_database_error() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SqliteBookRepository::new(db.clone());
        db.close().await;

        let err = repo.create(&sapiens()).await.unwrap_err();
        assert_eq!(err.database_kind(), Some(DbErrorKind::PoolClosed));
    }
}

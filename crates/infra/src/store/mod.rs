//! Catalog storage.
//!
//! A store serves reads as rehydrated aggregates and applies a [`ChangeSet`]
//! atomically: either every write lands or none does. Uniqueness of author
//! emails and of ISBNs within an author is enforced here, at write time, and
//! reported as [`PersistenceError::UniqueViolation`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use library_application::{AddedEntity, PersistenceError};
use library_catalog::{Author, Book};
use library_core::{AuditStamps, Entity, EntityId, PaginatedResult};

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryCatalogStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresCatalogStore;

/// Book columns as written by a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRow {
    pub title: String,
    /// ISBN as entered.
    pub isbn: String,
    /// ISBN without separators; the uniqueness key.
    pub isbn_canonical: String,
    pub published_date: NaiveDate,
    pub audit: AuditStamps,
}

impl BookRow {
    pub fn from_book(book: &Book) -> Self {
        Self {
            title: book.title().to_string(),
            isbn: book.isbn().value().to_string(),
            isbn_canonical: book.isbn().canonical().to_string(),
            published_date: book.published_date().value(),
            audit: book.audit().clone(),
        }
    }
}

/// One staged write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    /// New author plus the books already in its collection.
    InsertAuthor {
        name: String,
        email: String,
        audit: AuditStamps,
        books: Vec<BookRow>,
    },
    /// Existing author; `new_books` are appended to its collection.
    UpdateAuthor {
        id: EntityId,
        name: String,
        email: String,
        audit: AuditStamps,
        new_books: Vec<BookRow>,
    },
    UpdateBook {
        id: EntityId,
        author_id: i64,
        row: BookRow,
    },
}

/// Ordered writes of one commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub writes: Vec<Write>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }
}

#[async_trait]
pub trait CatalogStore: Send + Sync + core::fmt::Debug {
    async fn author(&self, id: EntityId) -> Result<Option<Author>, PersistenceError>;

    /// Authors ordered by id, each with its books.
    async fn authors_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<PaginatedResult<Author>, PersistenceError>;

    async fn book(&self, id: EntityId) -> Result<Option<Book>, PersistenceError>;

    /// Books ordered by publication date (newest first), then id.
    async fn books_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<PaginatedResult<Book>, PersistenceError>;

    async fn email_exists(&self, email: &str) -> Result<bool, PersistenceError>;

    async fn author_names(
        &self,
        ids: &[EntityId],
    ) -> Result<HashMap<EntityId, String>, PersistenceError>;

    /// Apply every write or none. Returns inserted entities in write order,
    /// each author before its books.
    async fn commit(&self, changes: ChangeSet) -> Result<Vec<AddedEntity>, PersistenceError>;
}

/// Rebuild value objects from stored columns.
pub(crate) mod rehydrate {
    use chrono::NaiveDate;

    use library_application::PersistenceError;
    use library_catalog::{Author, Book, BookIdentifier, Email, PublishedDate};
    use library_core::{AuditStamps, EntityId};

    pub fn author(
        id: i64,
        audit: AuditStamps,
        name: String,
        email: &str,
        books: Vec<Book>,
    ) -> Result<Author, PersistenceError> {
        let email = Email::create(email)
            .map_err(|e| PersistenceError::backend(format!("stored author {id}: {e}")))?;
        Ok(Author::rehydrate(entity_id(id)?, audit, name, email, books))
    }

    pub fn book(
        id: i64,
        audit: AuditStamps,
        author_id: i64,
        title: String,
        isbn: &str,
        published_date: NaiveDate,
    ) -> Result<Book, PersistenceError> {
        let isbn = BookIdentifier::create(isbn)
            .map_err(|e| PersistenceError::backend(format!("stored book {id}: {e}")))?;
        Ok(Book::rehydrate(
            entity_id(id)?,
            audit,
            author_id,
            title,
            isbn,
            PublishedDate::from_stored(published_date),
        ))
    }

    pub fn entity_id(id: i64) -> Result<EntityId, PersistenceError> {
        EntityId::new(id).map_err(|e| PersistenceError::backend(format!("stored id: {e}")))
    }
}

//! Persistence ports.
//!
//! Repositories hand out owned aggregates and stage changes; nothing reaches
//! the store until [`UnitOfWork::commit`] runs. A [`Session`] groups the
//! repositories and unit of work of one request; sessions are never shared
//! between requests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use library_catalog::{Author, Book, Email};
use library_core::{CancellationSignal, EntityId, PaginatedResult};

/// Unique constraint on author email addresses.
pub const AUTHOR_EMAIL_UNIQUE: &str = "authors_email_key";
/// Unique constraint on ISBNs within one author's books.
pub const BOOK_ISBN_UNIQUE: &str = "books_author_id_isbn_key";

#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The request was cancelled before notifications were dispatched.
    #[error("operation cancelled")]
    Cancelled,

    /// A notification handler failed; nothing was written.
    #[error("notification dispatch failed for {event_type}: {source}")]
    Dispatch {
        event_type: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// A storage uniqueness constraint rejected the commit.
    #[error("unique constraint {constraint} violated: {detail}")]
    UniqueViolation {
        constraint: &'static str,
        detail: String,
    },

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl PersistenceError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    pub fn is_unique_violation(&self, name: &str) -> bool {
        matches!(self, PersistenceError::UniqueViolation { constraint, .. } if *constraint == name)
    }
}

/// An entity inserted by a commit, with the id the store assigned.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AddedEntity {
    pub entity_type: &'static str,
    pub id: EntityId,
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Inserted entities in insertion order (roots before their children).
    pub added: Vec<AddedEntity>,
    /// Number of entities written (inserted or updated).
    pub written: usize,
    /// Number of notifications dispatched before the write.
    pub dispatched: usize,
}

impl CommitReceipt {
    /// Id of the first inserted entity of `entity_type`.
    pub fn first_added(&self, entity_type: &str) -> Option<EntityId> {
        self.added
            .iter()
            .find(|a| a.entity_type == entity_type)
            .map(|a| a.id)
    }
}

#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Stage a new author (and any books already in its collection).
    async fn add(&self, author: Author) -> Result<(), PersistenceError>;

    async fn get_by_id(&self, id: EntityId) -> Result<Option<Author>, PersistenceError>;

    /// Authors ordered by id.
    async fn get_paginated(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<PaginatedResult<Author>, PersistenceError>;

    /// Stage changes to a loaded author, including newly added books.
    async fn update(&self, author: Author) -> Result<(), PersistenceError>;

    async fn email_exists(&self, email: &Email) -> Result<bool, PersistenceError>;

    /// Display names for the given author ids. Unknown ids are left out.
    async fn names_for(&self, ids: &[EntityId]) -> Result<HashMap<EntityId, String>, PersistenceError>;
}

#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn get_by_id(&self, id: EntityId) -> Result<Option<Book>, PersistenceError>;

    /// Books ordered by publication date, newest first, then by id.
    async fn get_paginated(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<PaginatedResult<Book>, PersistenceError>;

    /// Stage changes to a loaded book.
    async fn update(&self, book: Book) -> Result<(), PersistenceError>;
}

#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Stamp, dispatch and write everything staged in this session.
    async fn commit(&self, cancel: &CancellationSignal) -> Result<CommitReceipt, PersistenceError>;
}

/// Request-scoped persistence handles.
#[derive(Clone)]
pub struct Session {
    pub authors: Arc<dyn AuthorRepository>,
    pub books: Arc<dyn BookRepository>,
    pub unit_of_work: Arc<dyn UnitOfWork>,
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

/// Opens a fresh [`Session`] per request.
pub trait SessionFactory: Send + Sync {
    fn open(&self) -> Session;
}

impl<T> SessionFactory for Arc<T>
where
    T: SessionFactory + ?Sized,
{
    fn open(&self) -> Session {
        (**self).open()
    }
}

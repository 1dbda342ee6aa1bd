//! Repository ports implemented over a [`LibraryContext`].

use std::collections::HashMap;

use async_trait::async_trait;

use library_application::{
    AuthorRepository, BookRepository, CommitReceipt, PersistenceError, UnitOfWork,
};
use library_catalog::{Author, Book, Email};
use library_core::{CancellationSignal, Entity, EntityId, PaginatedResult};

use crate::context::{ChangeEntry, EntryState, LibraryContext};

#[async_trait]
impl AuthorRepository for LibraryContext {
    async fn add(&self, author: Author) -> Result<(), PersistenceError> {
        if !author.is_transient() {
            return Err(PersistenceError::backend(
                "an author that was already persisted cannot be added again",
            ));
        }
        self.stage(ChangeEntry::Author {
            state: EntryState::Added,
            author,
        })
    }

    async fn get_by_id(&self, id: EntityId) -> Result<Option<Author>, PersistenceError> {
        self.store().author(id).await
    }

    async fn get_paginated(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<PaginatedResult<Author>, PersistenceError> {
        self.store().authors_page(page_number, page_size).await
    }

    async fn update(&self, author: Author) -> Result<(), PersistenceError> {
        self.stage(ChangeEntry::Author {
            state: EntryState::Modified,
            author,
        })
    }

    async fn email_exists(&self, email: &Email) -> Result<bool, PersistenceError> {
        self.store().email_exists(email.value()).await
    }

    async fn names_for(
        &self,
        ids: &[EntityId],
    ) -> Result<HashMap<EntityId, String>, PersistenceError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        self.store().author_names(ids).await
    }
}

#[async_trait]
impl BookRepository for LibraryContext {
    async fn get_by_id(&self, id: EntityId) -> Result<Option<Book>, PersistenceError> {
        self.store().book(id).await
    }

    async fn get_paginated(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<PaginatedResult<Book>, PersistenceError> {
        self.store().books_page(page_number, page_size).await
    }

    async fn update(&self, book: Book) -> Result<(), PersistenceError> {
        self.stage(ChangeEntry::Book(book))
    }
}

#[async_trait]
impl UnitOfWork for LibraryContext {
    async fn commit(&self, cancel: &CancellationSignal) -> Result<CommitReceipt, PersistenceError> {
        LibraryContext::commit(self, cancel).await
    }
}

//! Request handlers.
//!
//! Handlers receive requests that already passed the validation stage. They
//! load aggregates, rebuild value objects from raw input, stage changes and
//! commit. Referential checks (author exists, email free) live here rather
//! than in the entities.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use library_catalog::{Author, Book, BookIdentifier, Email, PublishedDate};
use library_core::{CancellationSignal, Clock, DomainError, Entity, EntityId, PaginatedResult};

use crate::error::AppError;
use crate::ports::{
    AUTHOR_EMAIL_UNIQUE, BOOK_ISBN_UNIQUE, CommitReceipt, PersistenceError, Session,
};
use crate::requests::{
    CreateAuthor, CreateBook, GetAuthor, GetAuthors, GetBook, GetBooks, Request, UpdateBook,
};
use crate::responses::{AuthorResponse, BookResponse};

/// Handles one request type inside an open session.
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync {
    async fn handle(
        &self,
        request: R,
        session: &Session,
        cancel: &CancellationSignal,
    ) -> Result<R::Response, AppError>;
}

/// Handlers for every catalog request.
#[derive(Debug, Clone)]
pub struct CatalogHandlers {
    clock: Arc<dyn Clock>,
}

impl CatalogHandlers {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    fn published_date(&self, value: Option<NaiveDate>) -> Result<PublishedDate, AppError> {
        let value = value.ok_or_else(|| DomainError::null_or_empty("Published date"))?;
        Ok(PublishedDate::create_date(value, self.clock.as_ref())?)
    }

    async fn load_author(&self, session: &Session, id: i64) -> Result<Author, AppError> {
        let not_found = || AppError::not_found("Author", id);
        let key = EntityId::new(id).map_err(|_| not_found())?;
        session.authors.get_by_id(key).await?.ok_or_else(not_found)
    }

    async fn load_book(&self, session: &Session, id: i64) -> Result<Book, AppError> {
        let not_found = || AppError::not_found("Book", id);
        let key = EntityId::new(id).map_err(|_| not_found())?;
        session.books.get_by_id(key).await?.ok_or_else(not_found)
    }
}

/// Commit, turning a violation of `constraint` into a conflict with `message`.
async fn commit_or_conflict(
    session: &Session,
    cancel: &CancellationSignal,
    constraint: &str,
    message: impl FnOnce() -> String,
) -> Result<CommitReceipt, AppError> {
    match session.unit_of_work.commit(cancel).await {
        Ok(receipt) => Ok(receipt),
        Err(e) if e.is_unique_violation(constraint) => Err(AppError::conflict(message())),
        Err(e) => Err(e.into()),
    }
}

fn assigned_id(receipt: &CommitReceipt, entity_type: &str) -> Result<EntityId, AppError> {
    receipt.first_added(entity_type).ok_or_else(|| {
        AppError::Persistence(PersistenceError::backend(format!(
            "commit did not report an id for the new {entity_type}"
        )))
    })
}

fn author_email_taken(email: &Email) -> String {
    format!("Author with email, {email} already exist.")
}

fn isbn_taken(isbn: &BookIdentifier, author_id: i64) -> String {
    format!("Book with ISBN {isbn} already exists for author {author_id}.")
}

#[async_trait]
impl RequestHandler<CreateAuthor> for CatalogHandlers {
    #[instrument(skip(self, request, session, cancel), fields(email = %request.email), err)]
    async fn handle(
        &self,
        request: CreateAuthor,
        session: &Session,
        cancel: &CancellationSignal,
    ) -> Result<EntityId, AppError> {
        let email = Email::create(&request.email)?;

        // Fast path only; the store's unique constraint decides races.
        if session.authors.email_exists(&email).await? {
            return Err(AppError::conflict(author_email_taken(&email)));
        }

        let author = Author::new(&request.name, email.clone(), self.clock.now())?;
        session.authors.add(author).await?;

        let receipt = commit_or_conflict(session, cancel, AUTHOR_EMAIL_UNIQUE, || {
            author_email_taken(&email)
        })
        .await?;
        let id = assigned_id(&receipt, Author::ENTITY_TYPE)?;
        info!(author_id = %id, "author created");
        Ok(id)
    }
}

#[async_trait]
impl RequestHandler<CreateBook> for CatalogHandlers {
    #[instrument(skip(self, request, session, cancel), fields(author_id = request.author_id), err)]
    async fn handle(
        &self,
        request: CreateBook,
        session: &Session,
        cancel: &CancellationSignal,
    ) -> Result<EntityId, AppError> {
        let mut author = self.load_author(session, request.author_id).await?;

        let isbn = BookIdentifier::create(&request.isbn)?;
        let published_date = self.published_date(request.published_date)?;
        let book = Book::new(request.author_id, &request.title, published_date, isbn.clone())?;

        if !author.add_book(book, self.clock.now()) {
            return Err(AppError::conflict(isbn_taken(&isbn, request.author_id)));
        }
        session.authors.update(author).await?;

        let receipt = commit_or_conflict(session, cancel, BOOK_ISBN_UNIQUE, || {
            isbn_taken(&isbn, request.author_id)
        })
        .await?;
        let id = assigned_id(&receipt, Book::ENTITY_TYPE)?;
        info!(book_id = %id, "book created");
        Ok(id)
    }
}

#[async_trait]
impl RequestHandler<UpdateBook> for CatalogHandlers {
    #[instrument(skip(self, request, session, cancel), fields(book_id = request.id), err)]
    async fn handle(
        &self,
        request: UpdateBook,
        session: &Session,
        cancel: &CancellationSignal,
    ) -> Result<(), AppError> {
        let mut book = self.load_book(session, request.id).await?;
        let now = self.clock.now();

        let owner = if book.author_changed(request.author_id) {
            let target = self.load_author(session, request.author_id).await?;
            debug!(from = book.author_id(), to = request.author_id, "moving book to another author");
            book.update_author(request.author_id, now)?;
            Some(target)
        } else {
            match EntityId::new(book.author_id()) {
                Ok(id) => session.authors.get_by_id(id).await?,
                Err(_) => None,
            }
        };

        let isbn = BookIdentifier::create(&request.isbn)?;
        let published_date = self.published_date(request.published_date)?;

        if let Some(owner) = &owner {
            let clash = owner
                .books()
                .iter()
                .any(|other| other.isbn() == &isbn && other.id() != book.id());
            if clash {
                return Err(AppError::conflict(isbn_taken(&isbn, book.author_id())));
            }
        }

        book.update(&request.title, isbn.clone(), published_date, now)?;
        let author_id = book.author_id();
        session.books.update(book).await?;

        commit_or_conflict(session, cancel, BOOK_ISBN_UNIQUE, || isbn_taken(&isbn, author_id))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RequestHandler<GetAuthor> for CatalogHandlers {
    async fn handle(
        &self,
        request: GetAuthor,
        session: &Session,
        _cancel: &CancellationSignal,
    ) -> Result<AuthorResponse, AppError> {
        let author = self.load_author(session, request.id).await?;
        Ok(AuthorResponse::from(&author))
    }
}

#[async_trait]
impl RequestHandler<GetAuthors> for CatalogHandlers {
    async fn handle(
        &self,
        request: GetAuthors,
        session: &Session,
        _cancel: &CancellationSignal,
    ) -> Result<PaginatedResult<AuthorResponse>, AppError> {
        let page = session
            .authors
            .get_paginated(request.page_number, request.page_size)
            .await?;
        Ok(page.map(|author| AuthorResponse::from(&author)))
    }
}

#[async_trait]
impl RequestHandler<GetBook> for CatalogHandlers {
    async fn handle(
        &self,
        request: GetBook,
        session: &Session,
        _cancel: &CancellationSignal,
    ) -> Result<BookResponse, AppError> {
        let book = self.load_book(session, request.id).await?;
        let author = match EntityId::new(book.author_id()) {
            Ok(id) => session.authors.names_for(&[id]).await?.remove(&id),
            Err(_) => None,
        };
        Ok(BookResponse::from_book(&book, author))
    }
}

#[async_trait]
impl RequestHandler<GetBooks> for CatalogHandlers {
    async fn handle(
        &self,
        request: GetBooks,
        session: &Session,
        _cancel: &CancellationSignal,
    ) -> Result<PaginatedResult<BookResponse>, AppError> {
        let page = session
            .books
            .get_paginated(request.page_number, request.page_size)
            .await?;

        let author_ids: Vec<EntityId> = page
            .items()
            .iter()
            .filter_map(|b| EntityId::new(b.author_id()).ok())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let names = session.authors.names_for(&author_ids).await?;

        Ok(page.map(|book| {
            let author = EntityId::new(book.author_id())
                .ok()
                .and_then(|id| names.get(&id).cloned());
            BookResponse::from_book(&book, author)
        }))
    }
}

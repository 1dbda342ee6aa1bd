use chrono::{DateTime, Utc};

use library_core::{
    AggregateRoot, AuditStamps, DomainError, DomainResult, Entity, EntityBase, EntityId,
    same_identity,
};

use crate::events::{AuthorCreated, BookAdded, CatalogEvent};
use crate::{Book, BookIdentifier, Email, MAX_TEXT_LEN};

/// Aggregate root: Author.
///
/// Owns the books created through it. Invariant: no two books in the
/// collection share an ISBN.
#[derive(Debug, Clone)]
pub struct Author {
    base: EntityBase<CatalogEvent>,
    name: String,
    email: Email,
    books: Vec<Book>,
}

impl Author {
    /// A new author. Queues `AuthorCreated`.
    pub fn new(name: &str, email: Email, occurred_at: DateTime<Utc>) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::null_or_empty("Name"));
        }
        let length = name.chars().count();
        if length > MAX_TEXT_LEN {
            return Err(DomainError::out_of_range(
                "Name",
                format!("Name must be {MAX_TEXT_LEN} characters or fewer, got {length}."),
            ));
        }

        let mut author = Self {
            base: EntityBase::new(),
            name: name.to_string(),
            email,
            books: Vec::new(),
        };
        author
            .base
            .raise(CatalogEvent::AuthorCreated(AuthorCreated {
                name: author.name.clone(),
                email: author.email.value().to_string(),
                occurred_at,
            }));
        Ok(author)
    }

    /// Rebuild a stored author with its books. No notifications are queued.
    pub fn rehydrate(
        id: EntityId,
        audit: AuditStamps,
        name: String,
        email: Email,
        books: Vec<Book>,
    ) -> Self {
        Self {
            base: EntityBase::rehydrated(id, audit),
            name,
            email,
            books,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    pub fn find_book(&self, isbn: &BookIdentifier) -> Option<&Book> {
        self.books.iter().find(|b| b.isbn() == isbn)
    }

    /// Add a book to the collection.
    ///
    /// A book whose ISBN is already present is ignored and `false` is
    /// returned; nothing is queued in that case. Otherwise the book is
    /// appended and `BookAdded` is queued on the author.
    pub fn add_book(&mut self, book: Book, occurred_at: DateTime<Utc>) -> bool {
        if self.find_book(book.isbn()).is_some() {
            return false;
        }

        let event = BookAdded {
            author_id: self.base.id(),
            title: book.title().to_string(),
            isbn: book.isbn().value().to_string(),
            occurred_at,
        };
        self.books.push(book);
        self.base.raise(CatalogEvent::BookAdded(event));
        true
    }
}

impl Entity for Author {
    type Event = CatalogEvent;
    const ENTITY_TYPE: &'static str = "catalog.author";

    fn base(&self) -> &EntityBase<CatalogEvent> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase<CatalogEvent> {
        &mut self.base
    }
}

impl AggregateRoot for Author {
    fn children(&self) -> Vec<&EntityBase<CatalogEvent>> {
        self.books.iter().map(|b| b.base()).collect()
    }

    fn children_mut(&mut self) -> Vec<&mut EntityBase<CatalogEvent>> {
        self.books.iter_mut().map(|b| b.base_mut()).collect()
    }
}

impl PartialEq for Author {
    fn eq(&self, other: &Self) -> bool {
        same_identity(self, other)
    }
}

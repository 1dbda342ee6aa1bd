use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use library_core::EntityId;
use library_events::DomainEvent;

/// Notification: AuthorCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorCreated {
    pub name: String,
    pub email: String,
    pub occurred_at: DateTime<Utc>,
}

/// Notification: BookAdded (raised by the owning author).
///
/// `author_id` is `None` when the author itself is new in the same commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookAdded {
    pub author_id: Option<EntityId>,
    pub title: String,
    pub isbn: String,
    pub occurred_at: DateTime<Utc>,
}

/// Notification: BookUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookUpdated {
    pub book_id: Option<EntityId>,
    pub title: String,
    pub isbn: String,
    pub published_date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

/// Notification: BookAuthorChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookAuthorChanged {
    pub book_id: Option<EntityId>,
    pub previous_author_id: i64,
    pub author_id: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Notifications queued by catalog aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CatalogEvent {
    AuthorCreated(AuthorCreated),
    BookAdded(BookAdded),
    BookUpdated(BookUpdated),
    BookAuthorChanged(BookAuthorChanged),
}

impl CatalogEvent {
    pub const AUTHOR_CREATED: &'static str = "catalog.author.created";
    pub const BOOK_ADDED: &'static str = "catalog.book.added";
    pub const BOOK_UPDATED: &'static str = "catalog.book.updated";
    pub const BOOK_AUTHOR_CHANGED: &'static str = "catalog.book.author_changed";

    /// Every tag, for registering catch-all handlers.
    pub const ALL: [&'static str; 4] = [
        Self::AUTHOR_CREATED,
        Self::BOOK_ADDED,
        Self::BOOK_UPDATED,
        Self::BOOK_AUTHOR_CHANGED,
    ];
}

impl DomainEvent for CatalogEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CatalogEvent::AuthorCreated(_) => Self::AUTHOR_CREATED,
            CatalogEvent::BookAdded(_) => Self::BOOK_ADDED,
            CatalogEvent::BookUpdated(_) => Self::BOOK_UPDATED,
            CatalogEvent::BookAuthorChanged(_) => Self::BOOK_AUTHOR_CHANGED,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CatalogEvent::AuthorCreated(e) => e.occurred_at,
            CatalogEvent::BookAdded(e) => e.occurred_at,
            CatalogEvent::BookUpdated(e) => e.occurred_at,
            CatalogEvent::BookAuthorChanged(e) => e.occurred_at,
        }
    }
}

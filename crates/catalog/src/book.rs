use chrono::{DateTime, Utc};

use library_core::{
    AggregateRoot, AuditStamps, DomainError, DomainResult, Entity, EntityBase, EntityId,
    same_identity,
};

use crate::events::{BookAuthorChanged, BookUpdated, CatalogEvent};
use crate::{BookIdentifier, PublishedDate};

/// Aggregate root: Book.
///
/// Books are owned by an author's collection when they are created, but they
/// are addressed, loaded and updated on their own. The author is referenced
/// by id only.
#[derive(Debug, Clone)]
pub struct Book {
    base: EntityBase<CatalogEvent>,
    author_id: i64,
    title: String,
    isbn: BookIdentifier,
    published_date: PublishedDate,
}

impl Book {
    pub fn new(
        author_id: i64,
        title: &str,
        published_date: PublishedDate,
        isbn: BookIdentifier,
    ) -> DomainResult<Self> {
        if author_id < 0 {
            return Err(DomainError::negative_reference("author id", author_id));
        }
        Ok(Self {
            base: EntityBase::new(),
            author_id,
            title: validated_title(title)?,
            isbn,
            published_date,
        })
    }

    /// Rebuild a stored book. No notifications are queued.
    pub fn rehydrate(
        id: EntityId,
        audit: AuditStamps,
        author_id: i64,
        title: String,
        isbn: BookIdentifier,
        published_date: PublishedDate,
    ) -> Self {
        Self {
            base: EntityBase::rehydrated(id, audit),
            author_id,
            title,
            isbn,
            published_date,
        }
    }

    pub fn author_id(&self) -> i64 {
        self.author_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn isbn(&self) -> &BookIdentifier {
        &self.isbn
    }

    pub fn published_date(&self) -> PublishedDate {
        self.published_date
    }

    /// Replace title, ISBN and publication date together.
    ///
    /// Queues `BookUpdated` when anything actually changed.
    pub fn update(
        &mut self,
        title: &str,
        isbn: BookIdentifier,
        published_date: PublishedDate,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<()> {
        let title = validated_title(title)?;
        let changed =
            title != self.title || isbn != self.isbn || published_date != self.published_date;

        self.title = title;
        self.isbn = isbn;
        self.published_date = published_date;

        if changed {
            let event = BookUpdated {
                book_id: self.base.id(),
                title: self.title.clone(),
                isbn: self.isbn.value().to_string(),
                published_date: self.published_date.value(),
                occurred_at,
            };
            self.base.raise(CatalogEvent::BookUpdated(event));
        }
        Ok(())
    }

    /// Point the book at another author.
    ///
    /// Only the sign is checked here; whether the author exists is for the
    /// caller to establish.
    pub fn update_author(&mut self, author_id: i64, occurred_at: DateTime<Utc>) -> DomainResult<()> {
        if author_id < 0 {
            return Err(DomainError::negative_reference("author id", author_id));
        }
        if !self.author_changed(author_id) {
            return Ok(());
        }

        let previous_author_id = self.author_id;
        self.author_id = author_id;
        self.base
            .raise(CatalogEvent::BookAuthorChanged(BookAuthorChanged {
                book_id: self.base.id(),
                previous_author_id,
                author_id,
                occurred_at,
            }));
        Ok(())
    }

    pub fn author_changed(&self, author_id: i64) -> bool {
        self.author_id != author_id
    }
}

fn validated_title(title: &str) -> DomainResult<String> {
    if title.trim().is_empty() {
        return Err(DomainError::null_or_empty("Title"));
    }
    Ok(title.to_string())
}

impl Entity for Book {
    type Event = CatalogEvent;
    const ENTITY_TYPE: &'static str = "catalog.book";

    fn base(&self) -> &EntityBase<CatalogEvent> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase<CatalogEvent> {
        &mut self.base
    }
}

impl AggregateRoot for Book {}

impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        same_identity(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use library_core::DomainErrorKind;

    fn date(y: i32, m: u32, d: u32) -> PublishedDate {
        PublishedDate::from_stored(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn isbn(raw: &str) -> BookIdentifier {
        BookIdentifier::create(raw).unwrap()
    }

    fn stored_book() -> Book {
        Book::rehydrate(
            EntityId::new(5).unwrap(),
            AuditStamps::default(),
            1,
            "Dune".to_string(),
            isbn("978-0-306-40615-7"),
            date(1965, 8, 1),
        )
    }

    #[test]
    fn blank_title_is_rejected() {
        let err = Book::new(1, "  ", date(2000, 1, 1), isbn("0-30640-615-2")).unwrap_err();
        assert_eq!(err, DomainError::null_or_empty("Title"));
    }

    #[test]
    fn title_length_is_left_to_request_validation() {
        let long = "t".repeat(300);
        let book = Book::new(1, &long, date(2000, 1, 1), isbn("0-30640-615-2")).unwrap();
        assert_eq!(book.title(), long);

        let mut stored = stored_book();
        stored
            .update(&long, isbn("978-0-306-40615-7"), date(1965, 8, 1), Utc::now())
            .unwrap();
        assert_eq!(stored.title().chars().count(), 300);
    }

    #[test]
    fn update_replaces_all_fields_and_queues_a_notification() {
        let mut book = stored_book();
        let at = Utc::now();
        book.update("Dune Messiah", isbn("978-0-306-40613-3"), date(1969, 10, 15), at)
            .unwrap();

        assert_eq!(book.title(), "Dune Messiah");
        assert_eq!(book.isbn(), &isbn("9780306406133"));
        assert_eq!(book.published_date().to_string(), "1969-10-15");
        match book.base().pending_events() {
            [CatalogEvent::BookUpdated(e)] => {
                assert_eq!(e.book_id, EntityId::new(5).ok());
                assert_eq!(e.title, "Dune Messiah");
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn update_with_blank_title_changes_nothing() {
        let mut book = stored_book();
        let err = book
            .update("", isbn("978-0-306-40613-3"), date(1969, 10, 15), Utc::now())
            .unwrap_err();
        assert_eq!(err.kind(), DomainErrorKind::NullOrEmpty);
        assert_eq!(book.title(), "Dune");
        assert_eq!(book.isbn().value(), "978-0-306-40615-7");
    }

    #[test]
    fn identical_update_is_silent() {
        let mut book = stored_book();
        book.update("Dune", isbn("978-0-306-40615-7"), date(1965, 8, 1), Utc::now())
            .unwrap();
        assert!(!book.base().has_pending_events());
    }

    #[test]
    fn update_author_guards_negative_ids() {
        let mut book = stored_book();
        let err = book.update_author(-1, Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::negative_reference("author id", -1));
        assert_eq!(book.author_id(), 1);

        book.update_author(0, Utc::now()).unwrap();
        assert_eq!(book.author_id(), 0);
    }

    #[test]
    fn author_changed_compares_against_current_author() {
        let mut book = stored_book();
        assert!(!book.author_changed(1));
        assert!(book.author_changed(2));

        book.update_author(2, Utc::now()).unwrap();
        assert!(!book.author_changed(2));
        assert!(matches!(
            book.base().pending_events(),
            [CatalogEvent::BookAuthorChanged(BookAuthorChanged {
                previous_author_id: 1,
                author_id: 2,
                ..
            })]
        ));
    }

    #[test]
    fn books_compare_by_identity() {
        let a = stored_book();
        let mut b = stored_book();
        b.update("Other", isbn("0-30640-613-6"), date(2001, 1, 1), Utc::now())
            .unwrap();
        assert_eq!(a, b);

        let fresh = Book::new(1, "Dune", date(1965, 8, 1), isbn("978-0-306-40615-7")).unwrap();
        assert_ne!(fresh, fresh.clone());
    }
}

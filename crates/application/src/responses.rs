//! Read-side shapes returned by queries.

use serde::Serialize;

use library_catalog::{Author, Book};
use library_core::{Entity, EntityId};

/// Author summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub book_count: usize,
}

impl From<&Author> for AuthorResponse {
    fn from(author: &Author) -> Self {
        Self {
            id: raw_id(author.id()),
            name: author.name().to_string(),
            email: author.email().value().to_string(),
            book_count: author.book_count(),
        }
    }
}

/// Book summary with the author's display name resolved.
///
/// `author` is `None` when the referenced author no longer resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: i64,
    pub title: String,
    pub isbn: String,
    pub author_id: i64,
    pub author: Option<String>,
    /// `YYYY-MM-DD`.
    pub published_date: String,
}

impl BookResponse {
    pub fn from_book(book: &Book, author: Option<String>) -> Self {
        Self {
            id: raw_id(book.id()),
            title: book.title().to_string(),
            isbn: book.isbn().value().to_string(),
            author_id: book.author_id(),
            author,
            published_date: book.published_date().to_string(),
        }
    }
}

/// Stored entities always carry an id; `0` only shows up for transient ones.
fn raw_id(id: Option<EntityId>) -> i64 {
    id.map(EntityId::get).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use library_catalog::{BookIdentifier, Email, PublishedDate};
    use library_core::AuditStamps;

    fn book() -> Book {
        Book::rehydrate(
            EntityId::new(3).unwrap(),
            AuditStamps::default(),
            2,
            "Dune".to_string(),
            BookIdentifier::create("978-0-306-40615-7").unwrap(),
            PublishedDate::from_stored(NaiveDate::from_ymd_opt(1965, 8, 1).unwrap()),
        )
    }

    #[test]
    fn author_summary_counts_books() {
        let author = Author::rehydrate(
            EntityId::new(2).unwrap(),
            AuditStamps::default(),
            "Frank Herbert".to_string(),
            Email::create("frank@test.com").unwrap(),
            vec![book()],
        );
        let response = AuthorResponse::from(&author);
        assert_eq!(response.id, 2);
        assert_eq!(response.book_count, 1);
        assert_eq!(response.email, "frank@test.com");
    }

    #[test]
    fn book_summary_formats_the_date() {
        let response = BookResponse::from_book(&book(), Some("Frank Herbert".to_string()));
        assert_eq!(response.id, 3);
        assert_eq!(response.published_date, "1965-08-01");
        assert_eq!(response.isbn, "978-0-306-40615-7");
        assert_eq!(response.author.as_deref(), Some("Frank Herbert"));
    }
}

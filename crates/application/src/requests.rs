//! Commands and queries accepted by [`crate::LibraryService`].
//!
//! Requests carry raw caller input. Nothing here is validated; that is the
//! job of the validation stage and, after it, the value object factories.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use library_core::{EntityId, PaginatedResult};

use crate::responses::{AuthorResponse, BookResponse};

/// A request with a typed response.
pub trait Request: Send + Sync + 'static {
    type Response: Send;

    /// Name used in logs.
    const NAME: &'static str;
}

/// Fields shared by commands that describe an author.
pub trait AuthorCommand {
    fn name(&self) -> &str;
    fn email(&self) -> &str;
}

/// Fields shared by commands that describe a book.
pub trait BookCommand {
    fn author_id(&self) -> i64;
    fn title(&self) -> &str;
    fn isbn(&self) -> &str;
    fn published_date(&self) -> Option<NaiveDate>;
}

/// Listing queries.
pub trait PagedQuery {
    fn page_number(&self) -> u32;
    fn page_size(&self) -> u32;
}

/// Single-entity lookups.
pub trait ByIdQuery {
    fn id(&self) -> i64;
}

/// Command: CreateAuthor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuthor {
    pub name: String,
    pub email: String,
}

impl Request for CreateAuthor {
    type Response = EntityId;
    const NAME: &'static str = "create_author";
}

impl AuthorCommand for CreateAuthor {
    fn name(&self) -> &str {
        &self.name
    }

    fn email(&self) -> &str {
        &self.email
    }
}

/// Command: CreateBook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    pub author_id: i64,
    pub title: String,
    pub isbn: String,
    pub published_date: Option<NaiveDate>,
}

impl Request for CreateBook {
    type Response = EntityId;
    const NAME: &'static str = "create_book";
}

/// Command: UpdateBook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBook {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub isbn: String,
    pub published_date: Option<NaiveDate>,
}

impl Request for UpdateBook {
    type Response = ();
    const NAME: &'static str = "update_book";
}

macro_rules! book_command {
    ($ty:ty) => {
        impl BookCommand for $ty {
            fn author_id(&self) -> i64 {
                self.author_id
            }

            fn title(&self) -> &str {
                &self.title
            }

            fn isbn(&self) -> &str {
                &self.isbn
            }

            fn published_date(&self) -> Option<NaiveDate> {
                self.published_date
            }
        }
    };
}

book_command!(CreateBook);
book_command!(UpdateBook);

/// Query: GetAuthor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAuthor {
    pub id: i64,
}

impl Request for GetAuthor {
    type Response = AuthorResponse;
    const NAME: &'static str = "get_author";
}

/// Query: GetBook.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetBook {
    pub id: i64,
}

impl Request for GetBook {
    type Response = BookResponse;
    const NAME: &'static str = "get_book";
}

impl ByIdQuery for GetAuthor {
    fn id(&self) -> i64 {
        self.id
    }
}

impl ByIdQuery for GetBook {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Query: GetAuthors (ordered by id).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAuthors {
    pub page_number: u32,
    pub page_size: u32,
}

impl Request for GetAuthors {
    type Response = PaginatedResult<AuthorResponse>;
    const NAME: &'static str = "get_authors";
}

/// Query: GetBooks (newest publication first).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBooks {
    pub page_number: u32,
    pub page_size: u32,
}

impl Request for GetBooks {
    type Response = PaginatedResult<BookResponse>;
    const NAME: &'static str = "get_books";
}

macro_rules! paged_query {
    ($ty:ident) => {
        impl $ty {
            pub fn page(page_number: u32, page_size: u32) -> Self {
                Self {
                    page_number,
                    page_size,
                }
            }
        }

        impl PagedQuery for $ty {
            fn page_number(&self) -> u32 {
                self.page_number
            }

            fn page_size(&self) -> u32 {
                self.page_size
            }
        }
    };
}

paged_query!(GetAuthors);
paged_query!(GetBooks);

//! `library-catalog`: the catalog domain (authors, books and the value
//! objects they are built from).
//!
//! Everything here is synchronous and free of I/O. The only ambient input is
//! the [`library_core::Clock`] used to decide whether a publication date lies
//! in the future.

pub mod author;
pub mod book;
pub mod email;
pub mod events;
pub mod isbn;
pub mod published_date;

pub use author::Author;
pub use book::Book;
pub use email::Email;
pub use events::CatalogEvent;
pub use isbn::BookIdentifier;
pub use published_date::PublishedDate;

/// Longest name, title or email the catalog stores.
pub const MAX_TEXT_LEN: usize = 255;

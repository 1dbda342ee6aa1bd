//! `library-application`: request handling for the catalog.
//!
//! A request travels through [`LibraryService::send`]:
//!
//! ```text
//! request
//!   ↓
//! 1. Validation stage (every validator registered for the request type)
//!   ↓
//! 2. Open a request-scoped session (repositories + unit of work)
//!   ↓
//! 3. Handler (loads aggregates, builds value objects, stages changes)
//!   ↓
//! 4. Unit of work commit (audit stamps, notification dispatch, store write)
//! ```
//!
//! Persistence is reached only through the ports in [`ports`]; concrete
//! stores live in `library-infra`.

pub mod error;
pub mod handlers;
pub mod notifications;
pub mod ports;
pub mod requests;
pub mod responses;
pub mod service;
pub mod validation;

pub use error::AppError;
pub use handlers::{CatalogHandlers, RequestHandler};
pub use notifications::{LoggingNotificationHandler, default_dispatcher};
pub use ports::{
    AddedEntity, AuthorRepository, BookRepository, CommitReceipt, PersistenceError, Session,
    SessionFactory, UnitOfWork,
};
pub use requests::{
    CreateAuthor, CreateBook, GetAuthor, GetAuthors, GetBook, GetBooks, Request, UpdateBook,
};
pub use responses::{AuthorResponse, BookResponse};
pub use service::LibraryService;
pub use validation::{FieldFailure, ValidationFailure, ValidationStage, Validator};

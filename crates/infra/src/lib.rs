//! Infrastructure layer: catalog stores, the request-scoped unit of work,
//! the commit interceptor, configuration and process wiring.

pub mod bootstrap;
pub mod config;
pub mod context;
pub mod interceptor;
pub mod repositories;
pub mod store;

pub use bootstrap::{Library, SAMPLE_AUTHOR_EMAIL, SAMPLE_AUTHOR_NAME, build_library, connect_store, seed};
pub use config::{ConfigError, LibraryConfig};
pub use context::{CatalogSessions, ChangeEntry, EntryState, LibraryContext};
pub use interceptor::{CommitInterceptor, CommitPhase};
pub use store::{BookRow, CatalogStore, ChangeSet, InMemoryCatalogStore, Write};
#[cfg(feature = "postgres")]
pub use store::PostgresCatalogStore;

//! Process wiring: pick a store, assemble the request pipeline, seed.

use std::sync::Arc;

use tracing::{debug, info};

use library_application::{
    AppError, CatalogHandlers, CreateAuthor, GetAuthors, LibraryService, ValidationStage,
};
use library_catalog::CatalogEvent;
use library_core::{CancellationSignal, Clock, EntityId};
use library_events::NotificationDispatcher;

use crate::config::LibraryConfig;
use crate::context::CatalogSessions;
use crate::interceptor::CommitInterceptor;
use crate::store::{CatalogStore, InMemoryCatalogStore};

/// The catalog service as assembled for a running process.
pub type Library = LibraryService<CatalogHandlers>;

pub const SAMPLE_AUTHOR_NAME: &str = "Test Author";
pub const SAMPLE_AUTHOR_EMAIL: &str = "testauthor@mailinator.com";

/// Assemble validation, handlers and a session factory over `store`.
pub fn build_library(
    config: &LibraryConfig,
    store: Arc<dyn CatalogStore>,
    clock: Arc<dyn Clock>,
    dispatcher: NotificationDispatcher<CatalogEvent>,
) -> Library {
    let interceptor = Arc::new(CommitInterceptor::new(
        clock.clone(),
        config.audit_actor.clone(),
        Arc::new(dispatcher),
    ));
    let sessions = Arc::new(CatalogSessions::new(store, interceptor));
    LibraryService::new(
        ValidationStage::catalog(clock.clone(), config.max_page_size),
        CatalogHandlers::new(clock),
        sessions,
    )
}

/// Open the store named by the configuration.
///
/// Postgres is used when `DATABASE_URL` is set and the `postgres` feature is
/// compiled in; otherwise the catalog lives in memory.
pub async fn connect_store(config: &LibraryConfig) -> anyhow::Result<Arc<dyn CatalogStore>> {
    match config.database_url.as_deref() {
        #[cfg(feature = "postgres")]
        Some(url) => {
            let store = crate::store::PostgresCatalogStore::connect(url).await?;
            store.ensure_schema().await?;
            info!("using postgres catalog store");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres"))]
        Some(_) => {
            tracing::warn!("DATABASE_URL is set but postgres support is not compiled in; using in-memory store");
            Ok(Arc::new(InMemoryCatalogStore::new()))
        }
        None => {
            info!("using in-memory catalog store");
            Ok(Arc::new(InMemoryCatalogStore::new()))
        }
    }
}

/// Insert the sample author when the catalog has no authors yet.
///
/// Returns the new author's id, or `None` when nothing was inserted.
pub async fn seed(
    library: &Library,
    cancel: &CancellationSignal,
) -> Result<Option<EntityId>, AppError> {
    let existing = library.send(GetAuthors::page(1, 1), cancel).await?;
    if existing.total_count() > 0 {
        debug!(authors = existing.total_count(), "catalog not empty; skipping seed");
        return Ok(None);
    }

    let id = library
        .send(
            CreateAuthor {
                name: SAMPLE_AUTHOR_NAME.to_string(),
                email: SAMPLE_AUTHOR_EMAIL.to_string(),
            },
            cancel,
        )
        .await?;
    info!(author_id = %id, "seeded sample author");
    Ok(Some(id))
}

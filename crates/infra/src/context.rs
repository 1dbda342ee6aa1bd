//! Request-scoped change tracking.
//!
//! A [`LibraryContext`] is the unit of work behind one [`Session`]. Reads go
//! straight to the store; writes are staged as [`ChangeEntry`] values and
//! only reach the store when the context commits.

use std::sync::{Arc, Mutex};

use tracing::{info, instrument, warn};

use library_application::{CommitReceipt, PersistenceError, Session, SessionFactory};
use library_catalog::{Author, Book, CatalogEvent};
use library_core::{AggregateRoot, CancellationSignal, Entity, EntityBase, EntityId};

use crate::interceptor::{CommitInterceptor, CommitPhase};
use crate::store::{BookRow, CatalogStore, ChangeSet, Write};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntryState {
    Added,
    Modified,
}

/// One staged aggregate.
#[derive(Debug)]
pub enum ChangeEntry {
    Author { state: EntryState, author: Author },
    Book(Book),
}

impl ChangeEntry {
    pub fn state(&self) -> EntryState {
        match self {
            ChangeEntry::Author { state, .. } => *state,
            ChangeEntry::Book(_) => EntryState::Modified,
        }
    }

    pub fn entity_type(&self) -> &'static str {
        match self {
            ChangeEntry::Author { .. } => Author::ENTITY_TYPE,
            ChangeEntry::Book(_) => Book::ENTITY_TYPE,
        }
    }

    pub fn root_mut(&mut self) -> &mut EntityBase<CatalogEvent> {
        match self {
            ChangeEntry::Author { author, .. } => author.base_mut(),
            ChangeEntry::Book(book) => book.base_mut(),
        }
    }

    pub fn children_mut(&mut self) -> Vec<&mut EntityBase<CatalogEvent>> {
        match self {
            ChangeEntry::Author { author, .. } => author.children_mut(),
            ChangeEntry::Book(book) => book.children_mut(),
        }
    }

    fn key(&self) -> Option<(&'static str, EntityId)> {
        let id = match self {
            ChangeEntry::Author { author, .. } => author.id(),
            ChangeEntry::Book(book) => book.id(),
        };
        id.map(|id| (self.entity_type(), id))
    }

    fn into_write(self) -> Result<Write, PersistenceError> {
        match self {
            ChangeEntry::Author {
                state: EntryState::Added,
                author,
            } => Ok(Write::InsertAuthor {
                name: author.name().to_string(),
                email: author.email().value().to_string(),
                audit: author.audit().clone(),
                books: author.books().iter().map(BookRow::from_book).collect(),
            }),
            ChangeEntry::Author {
                state: EntryState::Modified,
                author,
            } => Ok(Write::UpdateAuthor {
                id: persisted_id(&author)?,
                name: author.name().to_string(),
                email: author.email().value().to_string(),
                audit: author.audit().clone(),
                new_books: author
                    .books()
                    .iter()
                    .filter(|b| b.is_transient())
                    .map(BookRow::from_book)
                    .collect(),
            }),
            ChangeEntry::Book(book) => Ok(Write::UpdateBook {
                id: persisted_id(&book)?,
                author_id: book.author_id(),
                row: BookRow::from_book(&book),
            }),
        }
    }
}

fn persisted_id<T: Entity>(entity: &T) -> Result<EntityId, PersistenceError> {
    entity.id().ok_or_else(|| {
        PersistenceError::backend(format!(
            "{} staged as modified but was never persisted",
            T::ENTITY_TYPE
        ))
    })
}

/// Unit of work for one request.
#[derive(Debug)]
pub struct LibraryContext {
    store: Arc<dyn CatalogStore>,
    interceptor: Arc<CommitInterceptor>,
    entries: Mutex<Vec<ChangeEntry>>,
}

impl LibraryContext {
    pub fn new(store: Arc<dyn CatalogStore>, interceptor: Arc<CommitInterceptor>) -> Self {
        Self {
            store,
            interceptor,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn store(&self) -> &dyn CatalogStore {
        self.store.as_ref()
    }

    /// Stage an entry. Staging the same persisted aggregate again replaces
    /// the earlier entry.
    pub(crate) fn stage(&self, entry: ChangeEntry) -> Result<(), PersistenceError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| PersistenceError::backend("lock poisoned"))?;
        match entry.key() {
            Some(key) => match entries.iter_mut().find(|e| e.key() == Some(key)) {
                Some(existing) => *existing = entry,
                None => entries.push(entry),
            },
            None => entries.push(entry),
        }
        Ok(())
    }

    pub fn pending(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Audit, dispatch, then write everything staged so far.
    ///
    /// The staged entries are consumed whatever the outcome.
    #[instrument(skip_all, err)]
    pub async fn commit(&self, cancel: &CancellationSignal) -> Result<CommitReceipt, PersistenceError> {
        let mut entries = {
            let mut staged = self
                .entries
                .lock()
                .map_err(|_| PersistenceError::backend("lock poisoned"))?;
            std::mem::take(&mut *staged)
        };
        if entries.is_empty() {
            return Ok(CommitReceipt::default());
        }

        let dispatched = self.interceptor.before_commit(&mut entries, cancel).await?;

        let changes = ChangeSet {
            writes: entries
                .into_iter()
                .map(ChangeEntry::into_write)
                .collect::<Result<_, _>>()?,
        };
        let written = changes.len();

        match self.store.commit(changes).await {
            Ok(added) => {
                info!(
                    phase = %CommitPhase::Committed,
                    written,
                    dispatched,
                    added = added.len(),
                    "commit applied"
                );
                Ok(CommitReceipt {
                    added,
                    written,
                    dispatched,
                })
            }
            Err(e) => {
                warn!(
                    phase = %CommitPhase::Failed,
                    dispatched,
                    error = %e,
                    "store rejected commit; dispatched notifications stand"
                );
                Err(e)
            }
        }
    }
}

/// Opens a fresh [`LibraryContext`] per session over a shared store.
#[derive(Debug, Clone)]
pub struct CatalogSessions {
    store: Arc<dyn CatalogStore>,
    interceptor: Arc<CommitInterceptor>,
}

impl CatalogSessions {
    pub fn new(store: Arc<dyn CatalogStore>, interceptor: Arc<CommitInterceptor>) -> Self {
        Self { store, interceptor }
    }

    pub fn context(&self) -> Arc<LibraryContext> {
        Arc::new(LibraryContext::new(self.store.clone(), self.interceptor.clone()))
    }
}

impl SessionFactory for CatalogSessions {
    fn open(&self) -> Session {
        let context = self.context();
        Session {
            authors: context.clone(),
            books: context.clone(),
            unit_of_work: context,
        }
    }
}

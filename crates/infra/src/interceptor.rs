//! Commit interceptor: audit stamping and notification dispatch.
//!
//! Runs inside every unit-of-work commit, before the store is written:
//!
//! ```text
//! Pending
//!   ↓  (cancellation checked)
//! Auditing        creation / modification stamps on every tracked entity
//!   ↓  (cancellation checked; last point at which it is honoured)
//! EventDispatch   queued notifications drained and dispatched, awaited one by one
//!   ↓
//! Committed | Failed   (decided by the store write that follows)
//! ```
//!
//! Notifications are dispatched before the write. A handler failure aborts
//! the commit; a failing write does not retract notifications that were
//! already dispatched.

use std::sync::Arc;

use tracing::{debug, instrument};

use library_application::PersistenceError;
use library_catalog::{Book, CatalogEvent};
use library_core::{AuditStamps, CancellationSignal, Clock, Entity, EntityId};
use library_events::{EventEnvelope, NotificationDispatcher};

use crate::context::{ChangeEntry, EntryState};

/// Where a commit attempt currently is.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CommitPhase {
    Pending,
    Auditing,
    EventDispatch,
    Committed,
    Failed,
}

impl core::fmt::Display for CommitPhase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            CommitPhase::Pending => "pending",
            CommitPhase::Auditing => "auditing",
            CommitPhase::EventDispatch => "event_dispatch",
            CommitPhase::Committed => "committed",
            CommitPhase::Failed => "failed",
        })
    }
}

#[derive(Debug)]
pub struct CommitInterceptor {
    clock: Arc<dyn Clock>,
    actor: String,
    dispatcher: Arc<NotificationDispatcher<CatalogEvent>>,
}

impl CommitInterceptor {
    pub fn new(
        clock: Arc<dyn Clock>,
        actor: impl Into<String>,
        dispatcher: Arc<NotificationDispatcher<CatalogEvent>>,
    ) -> Self {
        Self {
            clock,
            actor: actor.into(),
            dispatcher,
        }
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Audit then dispatch. Returns the number of notifications dispatched.
    #[instrument(skip_all, fields(entries = entries.len()), err)]
    pub async fn before_commit(
        &self,
        entries: &mut [ChangeEntry],
        cancel: &CancellationSignal,
    ) -> Result<usize, PersistenceError> {
        debug!(phase = %CommitPhase::Pending, "commit requested");
        if cancel.is_cancelled() {
            debug!(phase = %CommitPhase::Failed, "cancelled before auditing");
            return Err(PersistenceError::Cancelled);
        }

        debug!(phase = %CommitPhase::Auditing, "stamping audit fields");
        self.audit(entries);

        if cancel.is_cancelled() {
            debug!(phase = %CommitPhase::Failed, "cancelled before dispatch");
            return Err(PersistenceError::Cancelled);
        }

        debug!(phase = %CommitPhase::EventDispatch, "dispatching notifications");
        let dispatched = self.dispatch(entries).await.inspect_err(|_| {
            debug!(phase = %CommitPhase::Failed, "notification handler failed");
        })?;
        debug!(dispatched, "notifications dispatched");
        Ok(dispatched)
    }

    /// Stamp every tracked entity with the same instant and actor.
    ///
    /// Added entities (roots or owned children) get creation stamps. A root
    /// gets modification stamps when it is added, modified or owns an added
    /// child; added children get them too.
    pub fn audit(&self, entries: &mut [ChangeEntry]) {
        let now = self.clock.now();
        for entry in entries.iter_mut() {
            let state = entry.state();

            let mut child_added = false;
            for child in entry.children_mut() {
                if child.is_transient() {
                    child.stamp_created(now, self.actor.as_str());
                    child.stamp_modified(now, self.actor.as_str());
                    child_added = true;
                }
            }

            let root = entry.root_mut();
            if state == EntryState::Added {
                root.stamp_created(now, self.actor.as_str());
            }
            if matches!(state, EntryState::Added | EntryState::Modified) || child_added {
                root.stamp_modified(now, self.actor.as_str());
            }
        }
    }

    /// Drain and dispatch queued notifications: entries in staging order,
    /// each root before its children, each queue oldest first.
    async fn dispatch(&self, entries: &mut [ChangeEntry]) -> Result<usize, PersistenceError> {
        let mut position = 0u64;
        for entry in entries.iter_mut() {
            let mut queues: Vec<(&'static str, Option<EntityId>, AuditStamps, Vec<CatalogEvent>)> =
                Vec::new();

            let entity_type = entry.entity_type();
            let root = entry.root_mut();
            queues.push((entity_type, root.id(), root.audit().clone(), root.take_events()));
            // Authors are the only owners; their children are books.
            for child in entry.children_mut() {
                queues.push((
                    Book::ENTITY_TYPE,
                    child.id(),
                    child.audit().clone(),
                    child.take_events(),
                ));
            }

            for (entity_type, entity_id, audit, events) in queues {
                for event in events {
                    position += 1;
                    let envelope =
                        EventEnvelope::new(entity_type, entity_id, audit.clone(), position, event);
                    self.dispatcher
                        .dispatch(&envelope)
                        .await
                        .map_err(|e| PersistenceError::Dispatch {
                            event_type: e.event_type(),
                            source: e.into(),
                        })?;
                }
            }
        }
        Ok(position as usize)
    }
}

//! Entity trait: identity + continuity across state changes.
//!
//! Every persisted domain object embeds an [`EntityBase`], which owns the
//! three pieces of state that are not business data:
//!
//! - the surrogate identity, assigned once by persistence;
//! - audit stamps (who/when created, who/when last modified);
//! - the ordered queue of domain notifications raised but not yet dispatched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::EntityId;

/// Creation / modification stamps maintained by the commit pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamps {
    created_on: Option<DateTime<Utc>>,
    created_by: Option<String>,
    modified_on: Option<DateTime<Utc>>,
    modified_by: Option<String>,
}

impl AuditStamps {
    /// Rebuild stamps read back from storage.
    pub fn restore(
        created_on: Option<DateTime<Utc>>,
        created_by: Option<String>,
        modified_on: Option<DateTime<Utc>>,
        modified_by: Option<String>,
    ) -> Self {
        Self {
            created_on,
            created_by,
            modified_on,
            modified_by,
        }
    }

    pub fn created_on(&self) -> Option<DateTime<Utc>> {
        self.created_on
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    pub fn modified_on(&self) -> Option<DateTime<Utc>> {
        self.modified_on
    }

    pub fn modified_by(&self) -> Option<&str> {
        self.modified_by.as_deref()
    }
}

/// Identity, audit and pending-notification state shared by all entities.
#[derive(Debug, Clone)]
pub struct EntityBase<E> {
    id: Option<EntityId>,
    audit: AuditStamps,
    events: Vec<E>,
}

impl<E> Default for EntityBase<E> {
    fn default() -> Self {
        Self {
            id: None,
            audit: AuditStamps::default(),
            events: Vec::new(),
        }
    }
}

impl<E> EntityBase<E> {
    /// State for a brand-new, not yet persisted entity.
    pub fn new() -> Self {
        Self::default()
    }

    /// State for an entity loaded from storage. The notification queue starts empty.
    pub fn rehydrated(id: EntityId, audit: AuditStamps) -> Self {
        Self {
            id: Some(id),
            audit,
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> Option<EntityId> {
        self.id
    }

    pub fn is_transient(&self) -> bool {
        self.id.is_none()
    }

    /// Assign the persistence identity.
    ///
    /// Idempotent for the same id; any attempt to change an assigned id fails.
    pub fn assign_id(&mut self, id: EntityId) -> DomainResult<()> {
        match self.id {
            None => {
                self.id = Some(id);
                Ok(())
            }
            Some(current) if current == id => Ok(()),
            Some(current) => Err(DomainError::IdentityReassigned {
                current: current.get(),
                attempted: id.get(),
            }),
        }
    }

    pub fn audit(&self) -> &AuditStamps {
        &self.audit
    }

    pub fn stamp_created(&mut self, at: DateTime<Utc>, by: impl Into<String>) {
        self.audit.created_on = Some(at);
        self.audit.created_by = Some(by.into());
    }

    pub fn stamp_modified(&mut self, at: DateTime<Utc>, by: impl Into<String>) {
        self.audit.modified_on = Some(at);
        self.audit.modified_by = Some(by.into());
    }

    /// Queue a notification for dispatch at the next commit.
    pub fn raise(&mut self, event: E) {
        self.events.push(event);
    }

    /// Notifications queued so far, oldest first.
    pub fn pending_events(&self) -> &[E] {
        &self.events
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn remove_event(&mut self, index: usize) -> Option<E> {
        if index < self.events.len() {
            Some(self.events.remove(index))
        } else {
            None
        }
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Drain the queue in FIFO order.
    pub fn take_events(&mut self) -> Vec<E> {
        std::mem::take(&mut self.events)
    }
}

/// Entity marker + minimal interface.
pub trait Entity {
    /// Notification type this entity can queue.
    type Event;

    /// Stable entity type name (e.g. "catalog.author").
    const ENTITY_TYPE: &'static str;

    fn base(&self) -> &EntityBase<Self::Event>;

    fn base_mut(&mut self) -> &mut EntityBase<Self::Event>;

    fn id(&self) -> Option<EntityId> {
        self.base().id()
    }

    fn is_transient(&self) -> bool {
        self.base().is_transient()
    }

    fn audit(&self) -> &AuditStamps {
        self.base().audit()
    }
}

/// Identity equality for entities of the same concrete type.
///
/// Equal iff both carry the same assigned id. Transient entities only equal
/// themselves (same reference).
pub fn same_identity<T: Entity>(a: &T, b: &T) -> bool {
    if core::ptr::eq(a, b) {
        return true;
    }
    matches!((a.id(), b.id()), (Some(x), Some(y)) if x == y)
}

use serde::Serialize;
use uuid::Uuid;

use library_core::{AuditStamps, EntityId};

/// Envelope for a notification being dispatched at commit time.
///
/// Notes:
/// - `entity_id` is `None` for entities created in the same commit; ids are
///   assigned when the store commits, which happens after dispatch.
/// - `audit` is a snapshot of the raising entity's stamps, taken after the
///   auditing phase.
/// - `position` is the 1-based dispatch order within the commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    entity_type: &'static str,
    entity_id: Option<EntityId>,
    audit: AuditStamps,
    position: u64,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        entity_type: &'static str,
        entity_id: Option<EntityId>,
        audit: AuditStamps,
        position: u64,
        payload: E,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            entity_type,
            entity_id,
            audit,
            position,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn entity_type(&self) -> &'static str {
        self.entity_type
    }

    pub fn entity_id(&self) -> Option<EntityId> {
        self.entity_id
    }

    pub fn audit(&self) -> &AuditStamps {
        &self.audit
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

use async_trait::async_trait;

use crate::{DomainEvent, EventEnvelope};

/// Reacts to a dispatched notification.
///
/// Handlers run inside the commit, before the store is written. Returning an
/// error aborts the commit, so handlers should only fail for conditions that
/// must prevent persistence.
///
/// A handler receives each envelope once per commit that queued it. When the
/// store commit fails after dispatch the notification is not retracted, so
/// side effects that must not outlive a failed commit do not belong here.
#[async_trait]
pub trait NotificationHandler<E>: Send + Sync
where
    E: DomainEvent,
{
    /// Name used in logs and dispatch errors.
    fn name(&self) -> &'static str;

    async fn handle(&self, envelope: &EventEnvelope<E>) -> anyhow::Result<()>;
}

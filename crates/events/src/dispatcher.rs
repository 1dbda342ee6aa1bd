//! Static handler registry and sequential dispatch.
//!
//! Handlers are registered against event type tags once, at startup, through
//! [`NotificationDispatcherBuilder`]. Dispatch is strictly sequential: each
//! handler is awaited before the next one starts, and the first failure stops
//! the run.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::{DomainEvent, EventEnvelope, NotificationHandler};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// A registered handler returned an error.
    #[error("handler '{handler}' failed on {event_type}: {source}")]
    HandlerFailed {
        handler: &'static str,
        event_type: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    pub fn event_type(&self) -> &'static str {
        match self {
            DispatchError::HandlerFailed { event_type, .. } => event_type,
        }
    }
}

/// Registry of handlers keyed by event type tag.
pub struct NotificationDispatcher<E>
where
    E: DomainEvent,
{
    handlers: HashMap<&'static str, Vec<Arc<dyn NotificationHandler<E>>>>,
}

impl<E> core::fmt::Debug for NotificationDispatcher<E>
where
    E: DomainEvent,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut registered: Vec<(&str, Vec<&str>)> = self
            .handlers
            .iter()
            .map(|(ty, hs)| (*ty, hs.iter().map(|h| h.name()).collect()))
            .collect();
        registered.sort();
        f.debug_struct("NotificationDispatcher")
            .field("handlers", &registered)
            .finish()
    }
}

impl<E> Default for NotificationDispatcher<E>
where
    E: DomainEvent,
{
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<E> NotificationDispatcher<E>
where
    E: DomainEvent,
{
    pub fn builder() -> NotificationDispatcherBuilder<E> {
        NotificationDispatcherBuilder {
            handlers: HashMap::new(),
        }
    }

    /// Number of handlers registered for an event type.
    pub fn handler_count(&self, event_type: &str) -> usize {
        self.handlers.get(event_type).map(Vec::len).unwrap_or(0)
    }

    /// Hand one envelope to every handler registered for its type, in
    /// registration order. Returns the number of handlers invoked.
    ///
    /// Notifications without handlers are dropped (logged at debug level).
    pub async fn dispatch(&self, envelope: &EventEnvelope<E>) -> Result<usize, DispatchError> {
        let event_type = envelope.payload().event_type();
        let Some(handlers) = self.handlers.get(event_type) else {
            debug!(event_type, "no handlers registered; notification dropped");
            return Ok(0);
        };

        for handler in handlers {
            debug!(
                event_type,
                handler = handler.name(),
                position = envelope.position(),
                "dispatching notification"
            );
            if let Err(source) = handler.handle(envelope).await {
                warn!(
                    event_type,
                    handler = handler.name(),
                    error = %source,
                    "notification handler failed"
                );
                return Err(DispatchError::HandlerFailed {
                    handler: handler.name(),
                    event_type,
                    source,
                });
            }
        }

        Ok(handlers.len())
    }
}

/// Builds a [`NotificationDispatcher`].
pub struct NotificationDispatcherBuilder<E>
where
    E: DomainEvent,
{
    handlers: HashMap<&'static str, Vec<Arc<dyn NotificationHandler<E>>>>,
}

impl<E> NotificationDispatcherBuilder<E>
where
    E: DomainEvent,
{
    /// Register `handler` for `event_type`. Handlers for the same type run in
    /// registration order.
    pub fn on(mut self, event_type: &'static str, handler: Arc<dyn NotificationHandler<E>>) -> Self {
        self.handlers.entry(event_type).or_default().push(handler);
        self
    }

    pub fn build(self) -> NotificationDispatcher<E> {
        NotificationDispatcher {
            handlers: self.handlers,
        }
    }
}

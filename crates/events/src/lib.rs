//! Domain notifications: event contract, envelopes, handlers and dispatch.

pub mod dispatcher;
pub mod envelope;
pub mod event;
pub mod handler;

pub use dispatcher::{DispatchError, NotificationDispatcher, NotificationDispatcherBuilder};
pub use envelope::EventEnvelope;
pub use event::DomainEvent;
pub use handler::NotificationHandler;

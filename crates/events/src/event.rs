use chrono::{DateTime, Utc};

/// A domain notification.
///
/// Notifications are:
/// - **immutable** (treat them as facts)
/// - raised by an aggregate and dispatched when the surrounding commit runs
pub trait DomainEvent: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "catalog.author.created").
    ///
    /// Handlers are registered against this tag.
    fn event_type(&self) -> &'static str;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}

//! Built-in notification handlers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use library_catalog::CatalogEvent;
use library_events::{EventEnvelope, NotificationDispatcher, NotificationHandler};

/// Writes one log line per catalog notification.
#[derive(Debug, Default)]
pub struct LoggingNotificationHandler;

#[async_trait]
impl NotificationHandler<CatalogEvent> for LoggingNotificationHandler {
    fn name(&self) -> &'static str {
        "logging"
    }

    async fn handle(&self, envelope: &EventEnvelope<CatalogEvent>) -> anyhow::Result<()> {
        let position = envelope.position();
        match envelope.payload() {
            CatalogEvent::AuthorCreated(e) => info!(position, "Author: {}", e.name),
            CatalogEvent::BookAdded(e) => info!(position, "Added book: {}", e.title),
            CatalogEvent::BookUpdated(e) => {
                info!(position, book_id = ?e.book_id, "Updated book: {}", e.title)
            }
            CatalogEvent::BookAuthorChanged(e) => info!(
                position,
                book_id = ?e.book_id,
                from = e.previous_author_id,
                to = e.author_id,
                "Book moved to another author"
            ),
        }
        Ok(())
    }
}

/// Dispatcher with the logging handler registered for every catalog
/// notification.
pub fn default_dispatcher() -> NotificationDispatcher<CatalogEvent> {
    let logging: Arc<dyn NotificationHandler<CatalogEvent>> = Arc::new(LoggingNotificationHandler);
    CatalogEvent::ALL
        .into_iter()
        .fold(NotificationDispatcher::builder(), |builder, event_type| {
            builder.on(event_type, logging.clone())
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_catalog_notification_is_logged() {
        let dispatcher = default_dispatcher();
        for event_type in CatalogEvent::ALL {
            assert_eq!(dispatcher.handler_count(event_type), 1);
        }
    }
}

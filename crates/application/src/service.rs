//! Request entry point.

use std::sync::Arc;

use tracing::{debug, instrument};

use library_core::CancellationSignal;

use crate::error::AppError;
use crate::handlers::RequestHandler;
use crate::ports::SessionFactory;
use crate::requests::Request;
use crate::validation::ValidationStage;

/// Validates a request, opens a session and runs its handler once.
///
/// Generic over the handler set so tests can substitute their own.
pub struct LibraryService<H> {
    validation: ValidationStage,
    handlers: H,
    sessions: Arc<dyn SessionFactory>,
}

impl<H: core::fmt::Debug> core::fmt::Debug for LibraryService<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LibraryService")
            .field("validation", &self.validation)
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}

impl<H> LibraryService<H> {
    pub fn new(validation: ValidationStage, handlers: H, sessions: Arc<dyn SessionFactory>) -> Self {
        Self {
            validation,
            handlers,
            sessions,
        }
    }

    pub fn validation(&self) -> &ValidationStage {
        &self.validation
    }

    /// Handle `request`.
    ///
    /// A cancelled signal or a validation failure returns before a session is
    /// opened, so no handler side effects can happen.
    #[instrument(skip_all, fields(request = R::NAME))]
    pub async fn send<R>(&self, request: R, cancel: &CancellationSignal) -> Result<R::Response, AppError>
    where
        R: Request,
        H: RequestHandler<R>,
    {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        self.validation.validate(&request)?;

        let session = self.sessions.open();
        debug!("session opened");
        self.handlers.handle(request, &session, cancel).await
    }
}

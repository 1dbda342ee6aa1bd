//! `library-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! entity identity and audit stamps, the pending-notification queue, value
//! object marker, error taxonomy, clocks, cancellation and pagination.

pub mod aggregate;
pub mod cancel;
pub mod clock;
pub mod entity;
pub mod error;
pub mod id;
pub mod pagination;
pub mod value_object;

pub use aggregate::AggregateRoot;
pub use cancel::CancellationSignal;
pub use clock::{Clock, FixedClock, SystemClock};
pub use entity::{AuditStamps, Entity, EntityBase, same_identity};
pub use error::{DomainError, DomainErrorKind, DomainResult};
pub use id::EntityId;
pub use pagination::PaginatedResult;
pub use value_object::ValueObject;

//! Aggregate root trait.

use crate::entity::{Entity, EntityBase};

/// Aggregate root marker + access to owned child entities.
///
/// An aggregate root is the only entry point for mutating the cluster of
/// objects it owns. Persistence needs to reach the children's identity, audit
/// and notification state (never their business fields), which is what
/// [`AggregateRoot::children_mut`] exposes.
pub trait AggregateRoot: Entity {
    /// Entity state of owned children, in collection order.
    fn children(&self) -> Vec<&EntityBase<Self::Event>> {
        Vec::new()
    }

    fn children_mut(&mut self) -> Vec<&mut EntityBase<Self::Event>> {
        Vec::new()
    }
}

//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity** - they are defined entirely by their
//! attribute values. Two value objects with the same values are equal.

/// Marker trait for value objects.
///
/// ## Value Object vs Entity
///
/// - **Value Object**: No identity (`Email("a@b.io") == Email("a@b.io")`)
/// - **Entity**: Has identity (two books with the same id are the same book)
///
/// ## Construction
///
/// Implementors expose a single validating factory (`create`) and no setters.
/// A value that exists is therefore always valid, and "modifying" one means
/// building a new one.
///
/// `Eq + Hash` are required so value objects can be used as map keys and set
/// members.
pub trait ValueObject: Clone + Eq + core::hash::Hash + core::fmt::Debug {}

//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Which kind of record this is (used in error context).
    const KIND: crate::EntityKind;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

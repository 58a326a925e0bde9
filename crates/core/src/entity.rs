//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Record stores key entities by `id()`, and list them in id order.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + Ord + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

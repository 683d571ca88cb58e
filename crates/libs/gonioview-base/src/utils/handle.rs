//! Strongly typed handle referencing objects owned by an arena.

use crate::utils::Asset;
use std::{
    fmt::{Debug, Display, Formatter},
    hash::Hash,
};
use uuid::Uuid;

/// Handle referencing an object of type `T` stored elsewhere.
///
/// Handles are cheap to copy and never own the object; holders look the
/// object up in the owning arena when they need it.
pub struct Handle<T>
where
    T: Asset,
{
    /// Id of the handle.
    pub id: Uuid,
    _phantom: std::marker::PhantomData<fn() -> T>,
}

impl<T: Asset> Clone for Handle<T> {
    fn clone(&self) -> Self { *self }
}

impl<T: Asset> Copy for Handle<T> {}

impl<T: Asset> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool { self.id == other.id }
}

impl<T: Asset> Eq for Handle<T> {}

impl<T: Asset> Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) { self.id.hash(state) }
}

impl<T: Asset> Debug for Handle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let full = std::any::type_name::<T>();
        let name = full.rsplit("::").next().unwrap_or(full);
        write!(f, "{}<{}>", name, self.id)
    }
}

impl<T: Asset> Display for Handle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { write!(f, "{:?}", self) }
}

impl<T> Handle<T>
where
    T: Asset,
{
    /// Creates a new handle with a random id.
    pub fn new() -> Self { Self::with_id(Uuid::new_v4()) }

    /// Creates a new handle with the given id.
    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Returns an invalid handle.
    pub fn invalid() -> Self { Self::with_id(Uuid::nil()) }

    /// Returns the id of the handle.
    pub fn id(&self) -> Uuid { self.id }

    /// Returns true if the handle is valid.
    pub fn is_valid(&self) -> bool { !self.id.is_nil() }
}

/// Default handle is an invalid handle.
impl<T: Asset> Default for Handle<T> {
    fn default() -> Self { Self::invalid() }
}

impl<T: Asset> From<Uuid> for Handle<T> {
    fn from(id: Uuid) -> Self { Self::with_id(id) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Dummy;
    impl Asset for Dummy {}

    #[test]
    fn validity() {
        assert!(!Handle::<Dummy>::invalid().is_valid());
        assert!(!Handle::<Dummy>::default().is_valid());
        assert!(Handle::<Dummy>::new().is_valid());
    }

    #[test]
    fn identity() {
        let a = Handle::<Dummy>::new();
        let b = a;
        let c = Handle::<Dummy>::new();
        assert_eq!(a, b);
        assert_ne!(a, c);
        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(format!("{:?}", a).starts_with("Dummy<"));
    }
}

//! Type identity keys.
//!
//! [`DependencyKey`] names both sides of a binding: the capability being
//! asked for (usually a `dyn Trait`) and the concrete implementation that
//! satisfies it. Equality and hashing use only the [`TypeId`].

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

use wirebox_support::rendering::shorten_type_name;

/// Identifies a type inside the container.
///
/// # Examples
/// ```
/// use wirebox_container::key::DependencyKey;
///
/// trait Logger {}
///
/// let capability = DependencyKey::of::<dyn Logger>();
/// assert!(capability.type_name().ends_with("Logger"));
/// assert_eq!(capability.short_name(), "dyn Logger");
/// assert_ne!(capability, DependencyKey::of::<String>());
/// ```
#[derive(Clone, Copy)]
pub struct DependencyKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl DependencyKey {
    /// Creates the key for `T`. Unsized types such as `dyn Trait` are allowed.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified type name, as reported by [`std::any::type_name`].
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name with module paths stripped, for messages and logs.
    pub fn short_name(&self) -> String {
        shorten_type_name(self.type_name)
    }
}

impl PartialEq for DependencyKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for DependencyKey {}

impl Hash for DependencyKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DependencyKey({})", self.type_name)
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

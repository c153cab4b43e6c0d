//! How implementations declare and receive their dependencies.
//!
//! An implementation type states its initializer through [`Injectable`]. The
//! associated `Deps` type is the dependency list: `()`, a single `Arc<C>`, or
//! a tuple of `Arc<C>` handles. The container reads the keys off that type,
//! resolves each one left to right and hands the finished tuple to
//! [`Injectable::init`].
//!
//! ```rust
//! use std::sync::Arc;
//! use wirebox_container::prelude::*;
//!
//! trait Clock: Send + Sync {
//!     fn now(&self) -> u64;
//! }
//!
//! struct FixedClock;
//! impl Clock for FixedClock {
//!     fn now(&self) -> u64 { 42 }
//! }
//! wirebox_container::implements!(FixedClock => dyn Clock);
//!
//! impl Injectable for FixedClock {
//!     type Deps = ();
//!     fn init(_: ()) -> Result<Self> { Ok(FixedClock) }
//! }
//!
//! struct Stamp { clock: Arc<dyn Clock> }
//!
//! impl Injectable for Stamp {
//!     type Deps = Arc<dyn Clock>;
//!     fn init(clock: Arc<dyn Clock>) -> Result<Self> { Ok(Stamp { clock }) }
//! }
//!
//! let container = Container::new();
//! container.register::<dyn Clock, FixedClock>()?;
//! container.register::<Stamp, Stamp>()?;
//!
//! let stamp = container.resolve::<Stamp>()?;
//! assert_eq!(stamp.clock.now(), 42);
//! # Ok::<(), WireboxError>(())
//! ```

use std::sync::Arc;

use crate::container::resolve;
use crate::error::Result;
use crate::key::DependencyKey;
use crate::registry::Resolver;

/// A concrete type the container can build.
///
/// `init` is called at most once per container, after every entry of
/// `Deps` has been resolved.
pub trait Injectable: Sized + Send + Sync + 'static {
    /// The dependency list, see the [module docs](self).
    type Deps: Dependencies;

    fn init(deps: Self::Deps) -> Result<Self>;
}

/// Upcast from an implementation to the capability it is registered under.
///
/// Every type implements it for itself. For trait objects use
/// [`implements!`](crate::implements), which writes the one-line impl.
pub trait Implements<C: ?Sized>: Send + Sync + 'static {
    fn upcast(self: Arc<Self>) -> Arc<C>;
}

impl<T: Send + Sync + 'static> Implements<T> for T {
    #[inline]
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// Declares that an implementation satisfies one or more capabilities.
///
/// ```rust
/// trait Logger: Send + Sync {}
/// trait Sink: Send + Sync {}
///
/// struct Stdout;
/// impl Logger for Stdout {}
/// impl Sink for Stdout {}
///
/// wirebox_container::implements!(Stdout => dyn Logger, dyn Sink);
/// ```
#[macro_export]
macro_rules! implements {
    ($implementation:ty => $($capability:ty),+ $(,)?) => {
        $(
            impl $crate::inject::Implements<$capability> for $implementation {
                #[inline]
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$capability> {
                    self
                }
            }
        )+
    };
}

/// One entry of a dependency list.
pub trait Dependency: Sized + Send + Sync + 'static {
    /// Capability this entry asks for.
    fn key() -> DependencyKey;

    fn resolve(resolver: &dyn Resolver) -> Result<Self>;
}

impl<C: ?Sized + Send + Sync + 'static> Dependency for Arc<C> {
    #[inline]
    fn key() -> DependencyKey {
        DependencyKey::of::<C>()
    }

    #[inline]
    fn resolve(resolver: &dyn Resolver) -> Result<Self> {
        resolve::<C>(resolver)
    }
}

/// A full dependency list.
pub trait Dependencies: Sized + 'static {
    /// Declared capabilities, in resolution order.
    fn keys() -> Vec<DependencyKey>;

    /// Resolves every entry left to right, stopping at the first failure.
    fn resolve_all(resolver: &dyn Resolver) -> Result<Self>;
}

impl Dependencies for () {
    #[inline]
    fn keys() -> Vec<DependencyKey> {
        Vec::new()
    }

    #[inline]
    fn resolve_all(_: &dyn Resolver) -> Result<Self> {
        Ok(())
    }
}

impl<C: ?Sized + Send + Sync + 'static> Dependencies for Arc<C> {
    #[inline]
    fn keys() -> Vec<DependencyKey> {
        vec![DependencyKey::of::<C>()]
    }

    #[inline]
    fn resolve_all(resolver: &dyn Resolver) -> Result<Self> {
        resolve::<C>(resolver)
    }
}

macro_rules! define_dependency_tuple {
    ($($T: ident),+) => {
        impl<$($T: Dependency),+> Dependencies for ($($T,)+) {
            #[inline]
            fn keys() -> Vec<DependencyKey> {
                vec![$($T::key()),+]
            }

            #[inline]
            fn resolve_all(resolver: &dyn Resolver) -> Result<Self> {
                // Tuple fields evaluate in source order.
                Ok(($($T::resolve(resolver)?,)+))
            }
        }
    }
}

define_dependency_tuple! { T1 }
define_dependency_tuple! { T1, T2 }
define_dependency_tuple! { T1, T2, T3 }
define_dependency_tuple! { T1, T2, T3, T4 }
define_dependency_tuple! { T1, T2, T3, T4, T5 }
define_dependency_tuple! { T1, T2, T3, T4, T5, T6 }
define_dependency_tuple! { T1, T2, T3, T4, T5, T6, T7 }
define_dependency_tuple! { T1, T2, T3, T4, T5, T6, T7, T8 }
define_dependency_tuple! { T1, T2, T3, T4, T5, T6, T7, T8, T9 }
define_dependency_tuple! { T1, T2, T3, T4, T5, T6, T7, T8, T9, T10 }

#[cfg(test)]
mod tests {
    use super::*;

    trait Clock: Send + Sync {}
    trait Mailer: Send + Sync {}

    struct SystemClock;
    impl Clock for SystemClock {}
    crate::implements!(SystemClock => dyn Clock);

    #[test]
    fn unit_has_no_keys() {
        assert!(<() as Dependencies>::keys().is_empty());
    }

    #[test]
    fn single_arc_is_one_key() {
        assert_eq!(
            <Arc<dyn Clock> as Dependencies>::keys(),
            vec![DependencyKey::of::<dyn Clock>()]
        );
    }

    #[test]
    fn tuple_keys_keep_declaration_order() {
        type Deps = (Arc<dyn Mailer>, Arc<dyn Clock>, Arc<String>);
        assert_eq!(
            <Deps as Dependencies>::keys(),
            vec![
                DependencyKey::of::<dyn Mailer>(),
                DependencyKey::of::<dyn Clock>(),
                DependencyKey::of::<String>(),
            ]
        );
    }

    #[test]
    fn upcast_to_trait_object() {
        let concrete = Arc::new(SystemClock);
        let capability: Arc<dyn Clock> = <SystemClock as Implements<dyn Clock>>::upcast(concrete.clone());
        assert!(std::ptr::addr_eq(Arc::as_ptr(&concrete), Arc::as_ptr(&capability)));
    }

    #[test]
    fn every_type_implements_itself() {
        let value = Arc::new(String::from("dsn"));
        let same = <String as Implements<String>>::upcast(value.clone());
        assert!(Arc::ptr_eq(&value, &same));
    }
}

//! Registration table: which implementation serves which capability.
//!
//! Each [`Registration`] carries two type-erased functions. `construct`
//! resolves the declared dependencies and builds the implementation, and
//! `bind` turns a cached implementation into the capability handle the
//! caller asked for.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{DuplicateRegistrationError, Result, WireboxError};
use crate::inject::{Dependencies, Implements};
use crate::key::DependencyKey;

/// A constructed implementation, erased. Always holds the concrete `T`.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

/// Builds an implementation, pulling dependencies through the [`Resolver`].
pub(crate) type ConstructFn = Arc<dyn Fn(&dyn Resolver) -> Result<Instance> + Send + Sync>;

/// Converts a cached `Arc<T>` into a boxed `Arc<C>`. `None` on a type mismatch.
pub(crate) type BindFn = Arc<dyn Fn(Instance) -> Option<Box<dyn Any + Send + Sync>> + Send + Sync>;

/// Trait for resolving dependencies.
///
/// Initializers never see the container itself, only a resolver that knows
/// which implementations are already being built on the current call path.
pub trait Resolver: Send + Sync {
    /// Resolves `key` to a boxed `Arc<C>`, where `C` is the capability
    /// behind the key.
    fn resolve_key(&self, key: &DependencyKey) -> Result<Box<dyn Any + Send + Sync>>;
}

/// Registration entry for a single capability.
#[derive(Clone)]
pub(crate) struct Registration {
    pub capability: DependencyKey,
    pub implementation: DependencyKey,
    pub dependencies: Vec<DependencyKey>,
    pub construct: ConstructFn,
    pub bind: BindFn,
}

impl Registration {
    /// Binds `C` to whatever `factory` returns, once `D` has been resolved.
    pub fn from_factory<C, T, D>(
        factory: impl Fn(D) -> Result<T> + Send + Sync + 'static,
    ) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Implements<C>,
        D: Dependencies,
    {
        let construct: ConstructFn = Arc::new(move |resolver: &dyn Resolver| {
            let deps = D::resolve_all(resolver)?;
            let instance: Instance = Arc::new(factory(deps)?);
            Ok(instance)
        });

        Self {
            capability: DependencyKey::of::<C>(),
            implementation: DependencyKey::of::<T>(),
            dependencies: D::keys(),
            construct,
            bind: bind_fn::<C, T>(),
        }
    }

    /// Binds `C` to a value that already exists.
    pub fn from_instance<C, T>(value: T) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Implements<C>,
    {
        let shared: Instance = Arc::new(value);

        Self {
            capability: DependencyKey::of::<C>(),
            implementation: DependencyKey::of::<T>(),
            dependencies: Vec::new(),
            construct: Arc::new(move |_: &dyn Resolver| Ok(shared.clone())),
            bind: bind_fn::<C, T>(),
        }
    }
}

fn bind_fn<C, T>() -> BindFn
where
    C: ?Sized + Send + Sync + 'static,
    T: Implements<C>,
{
    Arc::new(|instance: Instance| {
        let concrete = instance.downcast::<T>().ok()?;
        let handle: Arc<C> = <T as Implements<C>>::upcast(concrete);
        Some(Box::new(handle) as Box<dyn Any + Send + Sync>)
    })
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("capability", &self.capability)
            .field("implementation", &self.implementation)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

/// Stores all registrations, keyed by capability.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    registrations: HashMap<DependencyKey, Registration>,
    frozen: bool,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a registration.
    ///
    /// # Errors
    /// - [`WireboxError::ContainerFrozen`] after [`Registry::freeze`].
    /// - [`WireboxError::DuplicateRegistration`] if the capability is taken
    ///   and `allow_override` is false. The existing entry is kept.
    pub fn register(&mut self, registration: Registration, allow_override: bool) -> Result<()> {
        if self.frozen {
            return Err(WireboxError::ContainerFrozen);
        }

        let capability = registration.capability;
        if let Some(existing) = self.registrations.get(&capability) {
            if !allow_override {
                warn!(
                    capability = %capability.short_name(),
                    existing = %existing.implementation.short_name(),
                    rejected = %registration.implementation.short_name(),
                    "Rejected duplicate registration"
                );
                return Err(WireboxError::DuplicateRegistration(DuplicateRegistrationError {
                    capability,
                    existing: existing.implementation,
                    rejected: registration.implementation,
                }));
            }
            debug!(capability = %capability.short_name(), "Overriding registration");
        }

        debug!(
            capability = %capability.short_name(),
            implementation = %registration.implementation.short_name(),
            dependencies = registration.dependencies.len(),
            "Registered dependency"
        );
        self.registrations.insert(capability, registration);
        Ok(())
    }

    pub fn get(&self, key: &DependencyKey) -> Option<&Registration> {
        self.registrations.get(key)
    }

    pub fn all_registrations(&self) -> &HashMap<DependencyKey, Registration> {
        &self.registrations
    }

    /// True if some capability is served by `implementation`.
    pub fn serves(&self, implementation: &DependencyKey) -> bool {
        self.registrations
            .values()
            .any(|reg| reg.implementation == *implementation)
    }

    /// Fully qualified names of every registered capability.
    pub fn capability_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.registrations.keys().map(|key| key.type_name())
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}

//! # The Container
//!
//! Maps capabilities to implementations and builds each implementation at
//! most once, wiring its dependencies on the way.
//!
//! # Architecture
//! ```text
//!  register::<dyn C, T>()          resolve::<dyn C>()
//!          │                              │
//!          ▼                              ▼
//!  ┌──────────────┐  lookup   ┌──────────────────────┐
//!  │   Registry   │ ◄──────── │ cycle check (path)   │
//!  │ C → T, deps  │           │ cache hit? ─► return │
//!  └──────────────┘           │ lock, re-check       │
//!                             │ resolve deps (L → R) │
//!                             │ T::init(deps)        │
//!                             │ cache T, upcast to C │
//!                             └──────────────────────┘
//! ```
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use wirebox_container::prelude::*;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, msg: &str);
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn log(&self, msg: &str) { println!("{msg}"); }
//! }
//! wirebox_container::implements!(ConsoleLogger => dyn Logger);
//!
//! struct UserService {
//!     logger: Arc<dyn Logger>,
//! }
//!
//! let container = Container::builder()
//!     .bind_with::<dyn Logger, ConsoleLogger, ()>(|()| Ok(ConsoleLogger))
//!     .bind_with::<UserService, UserService, Arc<dyn Logger>>(|logger| {
//!         Ok(UserService { logger })
//!     })
//!     .build()
//!     .expect("Failed to build container");
//!
//! let service = container.resolve::<UserService>().expect("Failed to resolve");
//! service.logger.log("ready");
//! ```

use std::any::{Any, type_name};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use tracing::{debug, info, instrument, trace, warn};
use wirebox_support::rendering::{render_chain, suggest_similar};

use crate::error::{CyclicDependencyError, Result, UnresolvedDependencyError, WireboxError};
use crate::graph::{DependencyInfo, GraphValidator};
use crate::inject::{Dependencies, Implements, Injectable};
use crate::key::DependencyKey;
use crate::provider::Provider;
use crate::registry::{Instance, Registration, Registry, Resolver};

// ═══════════════════════════════════════════
// ResolutionState
// ═══════════════════════════════════════════

/// Where an implementation is in its life inside one container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionState {
    /// No capability is bound to this implementation.
    Unregistered,
    /// Bound, not built yet.
    Registered,
    /// Its initializer, or one of its dependencies, is running.
    Resolving,
    /// Built and cached for the rest of the container's life.
    Resolved,
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionState::Unregistered => write!(f, "Unregistered"),
            ResolutionState::Registered => write!(f, "Registered"),
            ResolutionState::Resolving => write!(f, "Resolving"),
            ResolutionState::Resolved => write!(f, "Resolved"),
        }
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// Thread-safe dependency injection container.
///
/// Every implementation is a singleton: the first `resolve` builds it, later
/// calls share the cached instance.
pub struct Container {
    registry: RwLock<Registry>,
    instances: RwLock<HashMap<DependencyKey, Instance>>,
    /// Held for the whole cache-miss sequence. Reentrant so a thread can
    /// recurse into dependencies.
    construction: ReentrantMutex<()>,
    /// Implementations whose initializer is on the stack right now.
    resolving: Mutex<HashSet<DependencyKey>>,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(Registry::new()),
            instances: RwLock::new(HashMap::new()),
            construction: ReentrantMutex::new(()),
            resolving: Mutex::new(HashSet::new()),
        }
    }

    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    // ── Registration ──

    /// Binds capability `C` to implementation `T`, built by
    /// [`Injectable::init`].
    ///
    /// # Errors
    /// [`WireboxError::DuplicateRegistration`] if `C` is already bound, or
    /// [`WireboxError::ContainerFrozen`] after [`freeze`](Self::freeze).
    pub fn register<C, T>(&self) -> Result<()>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Injectable + Implements<C>,
    {
        self.insert(Registration::from_factory::<C, T, T::Deps>(T::init), false)
    }

    /// Binds capability `C` to the value `factory` builds from `D`.
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use wirebox_container::prelude::*;
    ///
    /// struct Dsn(String);
    /// struct Pool { dsn: Arc<Dsn> }
    ///
    /// let container = Container::new();
    /// container.register_instance::<Dsn, Dsn>(Dsn("postgres://localhost".into()))?;
    /// container.register_with::<Pool, Pool, Arc<Dsn>>(|dsn| Ok(Pool { dsn }))?;
    ///
    /// assert_eq!(container.resolve::<Pool>()?.dsn.0, "postgres://localhost");
    /// # Ok::<(), WireboxError>(())
    /// ```
    pub fn register_with<C, T, D>(
        &self,
        factory: impl Fn(D) -> Result<T> + Send + Sync + 'static,
    ) -> Result<()>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Implements<C>,
        D: Dependencies,
    {
        self.insert(Registration::from_factory::<C, T, D>(factory), false)
    }

    /// Binds capability `C` to an already built value.
    pub fn register_instance<C, T>(&self, value: T) -> Result<()>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Implements<C>,
    {
        self.insert(Registration::from_instance::<C, T>(value), false)
    }

    /// Lets a [`Provider`] register its group of bindings.
    pub fn add_provider(&self, provider: &dyn Provider) -> Result<()> {
        debug!(provider = provider.name(), "Adding provider");
        provider.register(self)
    }

    /// Refuses all further registrations.
    pub fn freeze(&self) {
        self.registry.write().freeze();
        debug!("Container frozen");
    }

    fn insert(&self, registration: Registration, allow_override: bool) -> Result<()> {
        self.registry.write().register(registration, allow_override)
    }

    // ── Resolution ──

    /// Resolves capability `C`, building it and its dependencies on first
    /// use.
    ///
    /// ```rust,ignore
    /// let store: Arc<dyn KeyValueStore> = container.resolve::<dyn KeyValueStore>()?;
    /// ```
    pub fn resolve<C: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<C>> {
        let key = DependencyKey::of::<C>();
        trace!(key = %key.short_name(), "Resolving");

        let handle = self.resolve_internal(&key, &[])?;
        downcast_handle::<C>(key, handle)
    }

    /// Checks the whole registration table for missing dependencies and
    /// cycles without building anything.
    pub fn validate(&self) -> Result<()> {
        let graph: HashMap<DependencyKey, DependencyInfo> = self
            .registry
            .read()
            .all_registrations()
            .iter()
            .map(|(capability, reg)| {
                (
                    *capability,
                    DependencyInfo {
                        implementation: reg.implementation,
                        dependencies: reg.dependencies.clone(),
                    },
                )
            })
            .collect();

        GraphValidator::new(graph).validate()
    }

    /// Type-erased resolve. `path` lists the implementations being built
    /// on this call tree, outermost first.
    fn resolve_internal(
        &self,
        key: &DependencyKey,
        path: &[DependencyKey],
    ) -> Result<Box<dyn Any + Send + Sync>> {
        let registration = self.registration(key, path)?;
        let instance = self.instance(&registration, path)?;

        (registration.bind)(instance).ok_or(WireboxError::TypeMismatch {
            key: registration.implementation,
            expected: registration.implementation.type_name(),
        })
    }

    /// Copies the registration out so no table lock is held while building.
    fn registration(&self, key: &DependencyKey, path: &[DependencyKey]) -> Result<Registration> {
        let registry = self.registry.read();

        registry.get(key).cloned().ok_or_else(|| {
            debug!(key = %key.short_name(), "No registration found");
            WireboxError::UnresolvedDependency(UnresolvedDependencyError {
                requested: *key,
                required_by: path.last().copied(),
                suggestions: suggest_similar(key.type_name(), registry.capability_names(), 3),
            })
        })
    }

    fn instance(&self, registration: &Registration, path: &[DependencyKey]) -> Result<Instance> {
        let implementation = registration.implementation;

        if let Some(start) = path.iter().position(|k| *k == implementation) {
            let mut chain = path[start..].to_vec();
            chain.push(implementation);
            return Err(cycle(chain));
        }

        if let Some(instance) = self.cached(&implementation) {
            trace!(implementation = %implementation.short_name(), "Cache hit");
            return Ok(instance);
        }

        let _construction = self.construction.lock();

        // Another thread may have finished it while we waited.
        if let Some(instance) = self.cached(&implementation) {
            trace!(implementation = %implementation.short_name(), "Built while waiting");
            return Ok(instance);
        }

        // An initializer that calls back into the container starts a fresh
        // path. Only this thread can be building while the lock is held.
        if self.resolving.lock().contains(&implementation) {
            let mut chain = Vec::with_capacity(path.len() + 2);
            chain.push(implementation);
            chain.extend_from_slice(path);
            chain.push(implementation);
            return Err(cycle(chain));
        }

        let _resolving = ResolvingGuard::enter(&self.resolving, implementation);

        let mut child_path = Vec::with_capacity(path.len() + 1);
        child_path.extend_from_slice(path);
        child_path.push(implementation);

        debug!(
            capability = %registration.capability.short_name(),
            implementation = %implementation.short_name(),
            dependencies = registration.dependencies.len(),
            "Constructing"
        );

        let resolver = ContainerResolver {
            container: self,
            path: child_path,
        };
        let instance = (registration.construct)(&resolver)?;

        self.instances.write().insert(implementation, instance.clone());
        debug!(implementation = %implementation.short_name(), "Constructed and cached");

        Ok(instance)
    }

    fn cached(&self, implementation: &DependencyKey) -> Option<Instance> {
        self.instances.read().get(implementation).cloned()
    }

    // === Introspection ===

    /// True if capability `C` has a registration.
    pub fn is_registered<C: ?Sized + 'static>(&self) -> bool {
        self.registry.read().get(&DependencyKey::of::<C>()).is_some()
    }

    /// Lifecycle state of implementation `T`.
    pub fn state<T: ?Sized + 'static>(&self) -> ResolutionState {
        let key = DependencyKey::of::<T>();

        if self.instances.read().contains_key(&key) {
            ResolutionState::Resolved
        } else if self.resolving.lock().contains(&key) {
            ResolutionState::Resolving
        } else if self.registry.read().serves(&key) {
            ResolutionState::Registered
        } else {
            ResolutionState::Unregistered
        }
    }

    /// Number of registered capabilities.
    pub fn registered_count(&self) -> usize {
        self.registry.read().len()
    }

    /// Number of implementations built so far.
    pub fn resolved_count(&self) -> usize {
        self.instances.read().len()
    }

    /// True once [`freeze`](Container::freeze) has run.
    pub fn is_frozen(&self) -> bool {
        self.registry.read().is_frozen()
    }
}

impl Resolver for Container {
    fn resolve_key(&self, key: &DependencyKey) -> Result<Box<dyn Any + Send + Sync>> {
        self.resolve_internal(key, &[])
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registered", &self.registered_count())
            .field("resolved", &self.resolved_count())
            .field("frozen", &self.is_frozen())
            .finish()
    }
}

fn cycle(chain: Vec<DependencyKey>) -> WireboxError {
    let names: Vec<&str> = chain.iter().map(|k| k.type_name()).collect();
    warn!(cycle = %render_chain(&names), "Cyclic dependency detected");

    WireboxError::CyclicDependency(CyclicDependencyError { chain })
}

/// Marks an implementation as [`ResolutionState::Resolving`] until dropped,
/// including when its initializer panics.
struct ResolvingGuard<'a> {
    set: &'a Mutex<HashSet<DependencyKey>>,
    key: DependencyKey,
}

impl<'a> ResolvingGuard<'a> {
    fn enter(set: &'a Mutex<HashSet<DependencyKey>>, key: DependencyKey) -> Self {
        set.lock().insert(key);
        Self { set, key }
    }
}

impl Drop for ResolvingGuard<'_> {
    fn drop(&mut self) {
        self.set.lock().remove(&self.key);
    }
}

// ═══════════════════════════════════════════
// ContainerBuilder
// ═══════════════════════════════════════════

/// Builds a frozen [`Container`].
///
/// Registration errors do not interrupt the chain; the first one is kept and
/// returned from [`build()`](ContainerBuilder::build).
///
/// ```rust,ignore
/// let container = Container::builder()
///     .bind::<dyn Logger, ConsoleLogger>()
///     .bind::<dyn KeyValueStore, InMemoryKeyValueStore>()
///     .build()?;
/// ```
pub struct ContainerBuilder {
    container: Container,
    allow_override: bool,
    validate: bool,
    error: Option<WireboxError>,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            container: Container::new(),
            allow_override: false,
            validate: true,
            error: None,
        }
    }

    /// Let later bindings replace earlier ones for the same capability.
    pub fn allow_override(mut self, allow: bool) -> Self {
        self.allow_override = allow;
        self
    }

    /// Run graph validation in [`build()`](Self::build). On by default.
    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// See [`Container::register`].
    pub fn bind<C, T>(self) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Injectable + Implements<C>,
    {
        self.push(Registration::from_factory::<C, T, T::Deps>(T::init))
    }

    /// See [`Container::register_with`].
    pub fn bind_with<C, T, D>(
        self,
        factory: impl Fn(D) -> Result<T> + Send + Sync + 'static,
    ) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Implements<C>,
        D: Dependencies,
    {
        self.push(Registration::from_factory::<C, T, D>(factory))
    }

    /// See [`Container::register_instance`].
    pub fn instance<C, T>(self, value: T) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Implements<C>,
    {
        self.push(Registration::from_instance::<C, T>(value))
    }

    /// Add a [`Provider`] module. Providers register through the plain
    /// container API, so `allow_override` does not apply to them.
    pub fn add_provider(mut self, provider: &dyn Provider) -> Self {
        if self.error.is_none() {
            self.error = self.container.add_provider(provider).err();
        }
        self
    }

    /// Validates the graph (unless disabled), freezes and returns the
    /// container.
    #[instrument(skip(self), name = "container_build")]
    pub fn build(self) -> Result<Container> {
        if let Some(err) = self.error {
            return Err(err);
        }

        info!(registered = self.container.registered_count(), "Building container");

        if self.validate {
            self.container.validate()?;
        }
        self.container.freeze();

        info!("Container built");
        Ok(self.container)
    }

    fn push(mut self, registration: Registration) -> Self {
        if self.error.is_none() {
            self.error = self.container.insert(registration, self.allow_override).err();
        }
        self
    }
}

impl fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("registered", &self.container.registered_count())
            .field("allow_override", &self.allow_override)
            .field("validate", &self.validate)
            .finish()
    }
}

// ═══════════════════════════════════════════
// ContainerResolver (internal bridge)
// ═══════════════════════════════════════════

/// Resolver handed to initializers; remembers the path it was created on.
struct ContainerResolver<'a> {
    container: &'a Container,
    path: Vec<DependencyKey>,
}

impl Resolver for ContainerResolver<'_> {
    fn resolve_key(&self, key: &DependencyKey) -> Result<Box<dyn Any + Send + Sync>> {
        self.container.resolve_internal(key, &self.path)
    }
}

// ═══════════════════════════════════════════
// Typed access over any Resolver
// ═══════════════════════════════════════════

/// The one place a type-erased handle is turned back into `Arc<C>`.
fn downcast_handle<C: ?Sized + Send + Sync + 'static>(
    key: DependencyKey,
    handle: Box<dyn Any + Send + Sync>,
) -> Result<Arc<C>> {
    handle
        .downcast::<Arc<C>>()
        .map(|boxed| *boxed)
        .map_err(|_| WireboxError::TypeMismatch {
            key,
            expected: type_name::<Arc<C>>(),
        })
}

/// Resolve a typed dependency from a [`Resolver`].
///
/// ```rust,ignore
/// let logger: Arc<dyn Logger> = wirebox_container::container::resolve(&container)?;
/// ```
pub fn resolve<C: ?Sized + Send + Sync + 'static>(resolver: &dyn Resolver) -> Result<Arc<C>> {
    let key = DependencyKey::of::<C>();
    let handle = resolver.resolve_key(&key)?;
    downcast_handle::<C>(key, handle)
}

/// `resolver.resolve::<C>()` for anything that implements [`Resolver`].
pub trait ResolverApi {
    /// Resolves capability `C` and hands back the shared instance.
    fn resolve<C: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<C>>;
}

impl<R: Resolver + ?Sized> ResolverApi for R {
    fn resolve<C: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<C>> {
        let key = DependencyKey::of::<C>();
        let handle = self.resolve_key(&key)?;
        downcast_handle::<C>(key, handle)
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerBuilder, ResolutionState, ResolverApi, resolve};
    pub use crate::error::{Result, WireboxError};
    pub use crate::inject::{Dependencies, Implements, Injectable};
    pub use crate::key::DependencyKey;
    pub use crate::provider::Provider;
    pub use crate::registry::Resolver;
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

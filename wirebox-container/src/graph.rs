//! Dependency graph validation.
//!
//! Walks the declared dependency lists without constructing anything and
//! reports the first missing registration or cycle. Resolution performs the
//! same checks lazily; running the validator up front surfaces wiring
//! mistakes before the first `resolve()`.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument, warn};
use wirebox_support::rendering::{render_chain, suggest_similar};

use crate::error::{CyclicDependencyError, Result, UnresolvedDependencyError, WireboxError};
use crate::key::DependencyKey;

/// What the validator needs to know about one registration.
#[derive(Debug, Clone)]
pub(crate) struct DependencyInfo {
    pub implementation: DependencyKey,
    /// Capabilities the initializer asks for, in order.
    pub dependencies: Vec<DependencyKey>,
}

/// Depth-first search over capabilities.
///
/// Nodes are capabilities; the "on path" check uses implementations, since
/// that is what the resolver re-enters when a cycle exists.
pub(crate) struct GraphValidator {
    graph: HashMap<DependencyKey, DependencyInfo>,
    validated: HashSet<DependencyKey>,
    /// Implementations on the current DFS path.
    path: Vec<DependencyKey>,
}

impl GraphValidator {
    pub fn new(graph: HashMap<DependencyKey, DependencyInfo>) -> Self {
        Self {
            graph,
            validated: HashSet::new(),
            path: Vec::new(),
        }
    }

    /// Validates every registered capability.
    ///
    /// # Errors
    /// - [`WireboxError::UnresolvedDependency`]: a declared dependency has
    ///   no registration.
    /// - [`WireboxError::CyclicDependency`]: an implementation needs itself.
    #[instrument(skip(self), name = "graph_validation")]
    pub fn validate(&mut self) -> Result<()> {
        // Sorted so the reported error does not depend on hash order.
        let mut roots: Vec<DependencyKey> = self.graph.keys().copied().collect();
        roots.sort_by_key(|key| key.type_name());

        debug!(capabilities = roots.len(), "Validating dependency graph");

        for root in roots {
            self.visit(root)?;
        }

        debug!("Dependency graph is valid");
        Ok(())
    }

    fn visit(&mut self, capability: DependencyKey) -> Result<()> {
        if self.validated.contains(&capability) {
            return Ok(());
        }

        let info = self.graph.get(&capability).cloned().ok_or_else(|| {
            WireboxError::UnresolvedDependency(UnresolvedDependencyError {
                requested: capability,
                required_by: self.path.last().copied(),
                suggestions: suggest_similar(
                    capability.type_name(),
                    self.graph.keys().map(|key| key.type_name()),
                    3,
                ),
            })
        })?;

        if let Some(start) = self.path.iter().position(|k| *k == info.implementation) {
            let mut chain = self.path[start..].to_vec();
            chain.push(info.implementation);

            let names: Vec<&str> = chain.iter().map(|k| k.type_name()).collect();
            warn!(cycle = %render_chain(&names), "Cyclic dependency detected");

            return Err(WireboxError::CyclicDependency(CyclicDependencyError { chain }));
        }

        self.path.push(info.implementation);
        for dependency in &info.dependencies {
            self.visit(*dependency)?;
        }
        self.path.pop();

        self.validated.insert(capability);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Logger {}
    trait Store {}
    trait Cache {}
    trait Clock {}

    struct ConsoleLogger;
    struct MemoryStore;
    struct LruCache;
    struct SystemClock;

    fn node<C: ?Sized + 'static, T: 'static>(
        dependencies: Vec<DependencyKey>,
    ) -> (DependencyKey, DependencyInfo) {
        (
            DependencyKey::of::<C>(),
            DependencyInfo {
                implementation: DependencyKey::of::<T>(),
                dependencies,
            },
        )
    }

    fn validate(nodes: Vec<(DependencyKey, DependencyInfo)>) -> Result<()> {
        GraphValidator::new(nodes.into_iter().collect()).validate()
    }

    #[test]
    fn chain_is_valid() {
        let result = validate(vec![
            node::<dyn Logger, ConsoleLogger>(vec![]),
            node::<dyn Store, MemoryStore>(vec![DependencyKey::of::<dyn Logger>()]),
        ]);
        assert!(result.is_ok());
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        //      Store
        //     /     \
        //  Cache   Clock
        //     \     /
        //     Logger
        let result = validate(vec![
            node::<dyn Logger, ConsoleLogger>(vec![]),
            node::<dyn Cache, LruCache>(vec![DependencyKey::of::<dyn Logger>()]),
            node::<dyn Clock, SystemClock>(vec![DependencyKey::of::<dyn Logger>()]),
            node::<dyn Store, MemoryStore>(vec![
                DependencyKey::of::<dyn Cache>(),
                DependencyKey::of::<dyn Clock>(),
            ]),
        ]);
        assert!(result.is_ok());
    }

    #[test]
    fn missing_dependency_names_its_consumer() {
        let result = validate(vec![node::<dyn Store, MemoryStore>(vec![
            DependencyKey::of::<dyn Logger>(),
        ])]);

        match result {
            Err(WireboxError::UnresolvedDependency(err)) => {
                assert_eq!(err.requested, DependencyKey::of::<dyn Logger>());
                assert_eq!(err.required_by, Some(DependencyKey::of::<MemoryStore>()));
            }
            other => panic!("Expected UnresolvedDependency, got: {other:?}"),
        }
    }

    #[test]
    fn three_step_cycle() {
        let result = validate(vec![
            node::<dyn Store, MemoryStore>(vec![DependencyKey::of::<dyn Cache>()]),
            node::<dyn Cache, LruCache>(vec![DependencyKey::of::<dyn Clock>()]),
            node::<dyn Clock, SystemClock>(vec![DependencyKey::of::<dyn Store>()]),
        ]);

        match result {
            Err(WireboxError::CyclicDependency(err)) => {
                assert_eq!(err.chain.len(), 4);
                assert_eq!(err.chain.first(), err.chain.last());
            }
            other => panic!("Expected CyclicDependency, got: {other:?}"),
        }
    }

    #[test]
    fn self_dependency() {
        let result = validate(vec![node::<dyn Logger, ConsoleLogger>(vec![
            DependencyKey::of::<dyn Logger>(),
        ])]);
        assert!(matches!(result, Err(WireboxError::CyclicDependency(_))));
    }
}

//! Error types for container operations.
//!
//! Every error names the types involved by their readable names, and most
//! carry a hint about the usual fix.

use std::fmt;

use wirebox_support::rendering::render_chain;

use crate::key::DependencyKey;

/// Main error type for all wirebox operations.
#[derive(Debug, thiserror::Error)]
pub enum WireboxError {
    /// The capability already has an implementation bound to it.
    #[error("{}", .0)]
    DuplicateRegistration(DuplicateRegistrationError),

    /// Nothing is registered for the requested capability.
    #[error("{}", .0)]
    UnresolvedDependency(UnresolvedDependencyError),

    /// An implementation needs itself, directly or through other bindings.
    #[error("{}", .0)]
    CyclicDependency(CyclicDependencyError),

    /// An initializer returned an error.
    #[error("Failed to construct {key}: {source}")]
    ConstructionFailed {
        key: DependencyKey,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A cached instance was not of the type its binding promised.
    #[error("Type mismatch while resolving {key}: expected {expected}")]
    TypeMismatch {
        key: DependencyKey,
        expected: &'static str,
    },

    /// Registration was attempted after the container was frozen.
    #[error("Container is frozen. Register dependencies before calling .freeze()")]
    ContainerFrozen,
}

impl WireboxError {
    /// Wraps an initializer failure for implementation `T`.
    ///
    /// ```
    /// use wirebox_container::error::WireboxError;
    ///
    /// struct Settings;
    ///
    /// let err = WireboxError::construction::<Settings>("missing DATABASE_URL");
    /// assert!(err.to_string().contains("missing DATABASE_URL"));
    /// ```
    pub fn construction<T: ?Sized + 'static>(
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        WireboxError::ConstructionFailed {
            key: DependencyKey::of::<T>(),
            source: source.into(),
        }
    }
}

/// A capability was registered twice.
#[derive(Debug)]
pub struct DuplicateRegistrationError {
    pub capability: DependencyKey,
    /// Implementation that stays bound.
    pub existing: DependencyKey,
    /// Implementation that was turned away.
    pub rejected: DependencyKey,
}

impl fmt::Display for DuplicateRegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dependency already registered: {}", self.capability)?;
        write!(
            f,
            "\n  Bound to: {}\n  Rejected: {}",
            self.existing.short_name(),
            self.rejected.short_name(),
        )?;
        write!(
            f,
            "\n  Hint: Only one implementation per capability. Use .allow_override(true) on the builder to replace it"
        )
    }
}

/// A capability had no registration when it was needed.
#[derive(Debug)]
pub struct UnresolvedDependencyError {
    pub requested: DependencyKey,
    /// Implementation whose initializer asked for it, if any.
    pub required_by: Option<DependencyKey>,
    /// Registered capabilities with similar names.
    pub suggestions: Vec<&'static str>,
}

impl fmt::Display for UnresolvedDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No implementation registered for {}", self.requested)?;

        if let Some(parent) = self.required_by {
            write!(f, "\n  Required by: {parent}")?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: Did you forget to call .register::<{}, _>()?",
            self.requested.short_name()
        )
    }
}

/// Resolution re-entered an implementation that was still being built.
#[derive(Debug)]
pub struct CyclicDependencyError {
    /// Implementations from the first occurrence of the repeated one to its
    /// re-entry, e.g. `[A, B, A]`.
    pub chain: Vec<DependencyKey>,
}

impl fmt::Display for CyclicDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.chain.iter().map(|k| k.type_name()).collect();
        write!(f, "Cyclic dependency detected:\n  {}", render_chain(&names))?;
        write!(
            f,
            "\n  Hint: Break the cycle by moving the shared state into its own capability"
        )
    }
}

/// Convenient Result type for wirebox operations.
pub type Result<T> = std::result::Result<T, WireboxError>;

//! Provider trait: a module of related registrations.
//!
//! Providers group the bindings of one area of an application so the
//! composition root reads as a list of modules rather than one long block.
//!
//! # Examples
//! ```rust,ignore
//! struct StorageProvider;
//!
//! impl Provider for StorageProvider {
//!     fn register(&self, container: &Container) -> Result<()> {
//!         container.register::<dyn Logger, ConsoleLogger>()?;
//!         container.register::<dyn KeyValueStore, InMemoryKeyValueStore>()
//!     }
//! }
//!
//! let container = Container::builder()
//!     .add_provider(&StorageProvider)
//!     .build()?;
//! ```

use crate::container::Container;
use crate::error::Result;

/// A module that registers related dependencies into a container.
pub trait Provider: Send + Sync {
    /// Register dependencies into the container.
    ///
    /// Stops at the first failed registration; bindings made before it stay.
    fn register(&self, container: &Container) -> Result<()>;

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

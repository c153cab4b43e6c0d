//! # Wirebox: dependency injection container for Rust
//!
//! Bind capabilities (usually `dyn Trait`) to implementations, then resolve
//! them. Each implementation is built once, on first use, with its declared
//! dependencies resolved and injected first.
//!
//! ```rust
//! use std::sync::Arc;
//! use wirebox::prelude::*;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, msg: &str);
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn log(&self, msg: &str) { println!("{msg}"); }
//! }
//! wirebox::implements!(ConsoleLogger => dyn Logger);
//!
//! impl Injectable for ConsoleLogger {
//!     type Deps = ();
//!     fn init(_: ()) -> Result<Self> { Ok(ConsoleLogger) }
//! }
//!
//! let container = Container::new();
//! container.register::<dyn Logger, ConsoleLogger>()?;
//!
//! let first = container.resolve::<dyn Logger>()?;
//! let second = container.resolve::<dyn Logger>()?;
//! assert!(Arc::ptr_eq(&first, &second));
//! # Ok::<(), WireboxError>(())
//! ```

pub use wirebox_container::*;
pub use wirebox_container::implements;
pub use wirebox_support::*;

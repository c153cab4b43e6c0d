//! Core container implementation for wirebox.

pub mod container;
pub mod error;
mod graph;
pub mod inject;
pub mod key;
pub mod provider;
pub mod registry;

pub use container::{Container, ContainerBuilder, ResolutionState, prelude};
pub use error::{Result, WireboxError};
pub use inject::{Dependencies, Implements, Injectable};
pub use key::DependencyKey;

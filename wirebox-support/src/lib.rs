//! # Wirebox Support
//!
//! Helpers shared between wirebox crates that have nothing to do with
//! resolution itself, currently the text rendering used by error messages.

pub mod rendering;

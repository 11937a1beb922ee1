//! Deployment intent types.
//!
//! These are the in-memory results of parsing a stack file and a config
//! directory:
//! - [`Stack`]: a named set of [`ApplicationInstance`]s
//! - [`HardwareCatalog`]: per-cloud named [`HardwareProfile`]s
//! - [`Deployment`]: both of the above after cross-reference validation

mod types;

pub use types::*;

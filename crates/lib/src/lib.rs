//! ephstack-lib: stack and hardware catalog model for ephstack
//!
//! This crate turns two layers of YAML into validated deployment intent:
//! - `stack`: a stack file naming application instances
//! - `catalog`: a directory of per-cloud hardware profiles
//! - `validate`: every application must resolve to one profile
//! - `load`: runs the three stages in order
//! - `provision`: hands the result to an external automation program

pub mod catalog;
pub mod consts;
pub mod document;
pub mod load;
pub mod plan;
pub mod platform;
pub mod provision;
pub mod schema;
pub mod settings;
pub mod stack;
pub mod util;
pub mod validate;

//! Platform-specific locations for application data.

pub mod paths;

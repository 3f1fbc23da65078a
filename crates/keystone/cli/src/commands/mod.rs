//! Command implementations

pub mod bundle;
pub mod factory;
pub mod selector;

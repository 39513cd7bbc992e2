//! CLI command implementations

pub mod evaluate;
pub mod threshold;
pub mod validate;
